//! Collaborators behind the product endpoints.
//!
//! Everything here is built once at startup and shared read-only between
//! requests; handlers receive it through an `Extension<Arc<AppServices>>`.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use shopfront_infra::fixtures::{self, FixtureError};
use shopfront_infra::{InMemoryProductStore, PostgresProductStore, ProductStore, StoreError};
use shopfront_products::{
    default_filters, FilterConfigError, FilterError, ProductFilterSet, ProductSerializer,
    SerializerConfigError,
};

use crate::config::ApiConfig;

/// Failure while serving a list request.
#[derive(Debug, Error)]
pub enum ListError {
    #[error(transparent)]
    InvalidFilter(#[from] FilterError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure while wiring services at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid filter declarations: {0}")]
    Filters(#[from] FilterConfigError),

    #[error("invalid serializer fields: {0}")]
    Serializer(#[from] SerializerConfigError),

    #[error("failed to set up product store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to load product fixtures: {0}")]
    Fixtures(#[from] FixtureError),
}

pub struct AppServices {
    store: Arc<dyn ProductStore>,
    filters: ProductFilterSet,
    serializer: ProductSerializer,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn ProductStore>,
        filters: ProductFilterSet,
        serializer: ProductSerializer,
    ) -> Self {
        Self {
            store,
            filters,
            serializer,
        }
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn filters(&self) -> &ProductFilterSet {
        &self.filters
    }

    pub fn serializer(&self) -> &ProductSerializer {
        &self.serializer
    }

    /// Filter the catalog by query-string pairs and serialize the result.
    ///
    /// Parameters are validated before the store is touched, so a bad value is
    /// reported as such even when the store is down.
    pub async fn list_products(&self, params: &[(String, String)]) -> Result<Vec<Value>, ListError> {
        let query = self.filters.parse(params)?;
        let products = self.store.fetch_matching(&query).await?;
        Ok(self.serializer.many(&products))
    }
}

/// Wire the store, filters and serializer described by `config`.
///
/// Postgres is used when `DATABASE_URL` is set; otherwise an in-memory store,
/// optionally seeded from `PRODUCT_FIXTURES`.
pub fn build_services(config: &ApiConfig) -> Result<AppServices, StartupError> {
    let filters = ProductFilterSet::new(default_filters())?;
    let serializer = config.serializer()?;

    let store: Arc<dyn ProductStore> = match &config.database_url {
        Some(url) => {
            if config.fixtures_path.is_some() {
                tracing::warn!("PRODUCT_FIXTURES is ignored when DATABASE_URL is set");
            }
            Arc::new(PostgresProductStore::connect_lazy(url, config.database_max_connections)?)
        }
        None => {
            let store = InMemoryProductStore::new();
            if let Some(path) = &config.fixtures_path {
                for product in fixtures::load_products(path, &ProductSerializer::full())? {
                    store.insert(product);
                }
            }
            Arc::new(store)
        }
    };

    Ok(AppServices::new(store, filters, serializer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_core::ProductId;
    use shopfront_products::Product;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn services_with(products: Vec<Product>) -> AppServices {
        AppServices::new(
            Arc::new(InMemoryProductStore::from_products(products)),
            ProductFilterSet::new(default_filters()).unwrap(),
            ProductSerializer::from_field_names(&["id", "name", "price"]).unwrap(),
        )
    }

    #[tokio::test]
    async fn lists_matching_products_serialized() {
        let services = services_with(vec![
            Product::new(ProductId::new(1), "A").unwrap().with_price(10),
            Product::new(ProductId::new(2), "B").unwrap().with_price(20),
        ]);

        let items = services.list_products(&params(&[("price", "10")])).await.unwrap();
        assert_eq!(items, vec![serde_json::json!({"id": 1, "name": "A", "price": 10})]);
    }

    #[tokio::test]
    async fn invalid_filter_is_reported() {
        let services = services_with(vec![]);
        let err = services
            .list_products(&params(&[("price", "ten")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ListError::InvalidFilter(_)));
    }

    #[test]
    fn default_config_wires_an_empty_in_memory_store() {
        let services = build_services(&ApiConfig::default()).unwrap();
        assert_eq!(services.store_backend(), "memory");
        assert_eq!(services.serializer().fields().len(), 6);
        assert!(!services.filters().declarations().is_empty());
    }

    #[test]
    fn bad_serializer_config_fails_startup() {
        let config = ApiConfig {
            product_fields: Some(vec!["id".into(), "id".into()]),
            ..ApiConfig::default()
        };
        assert!(matches!(build_services(&config), Err(StartupError::Serializer(_))));
    }

    #[test]
    fn missing_fixture_file_fails_startup() {
        let config = ApiConfig {
            fixtures_path: Some("/nonexistent/products.json".into()),
            ..ApiConfig::default()
        };
        assert!(matches!(build_services(&config), Err(StartupError::Fixtures(_))));
    }
}
