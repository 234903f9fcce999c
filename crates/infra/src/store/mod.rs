//! Product persistence abstractions.
//!
//! The list endpoint only needs "fetch every product"; adapters may additionally
//! push a [`ProductQuery`] down to the backend as long as the result is identical
//! to filtering `fetch_all` in memory.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use thiserror::Error;

use shopfront_products::{Product, ProductQuery};

pub use in_memory::InMemoryProductStore;
pub use postgres::PostgresProductStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached (pool timeout, IO, closed pool).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("failed to decode product row: {0}")]
    Decode(String),
}

/// Read access to the persisted product collection.
#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    /// Short backend label for logs.
    fn backend(&self) -> &'static str;

    /// Every persisted product, ordered by id ascending.
    async fn fetch_all(&self) -> Result<Vec<Product>, StoreError>;

    /// Products matching `query`, ordered by id ascending.
    async fn fetch_matching(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError> {
        let products = self.fetch_all().await?;
        Ok(query.apply(products))
    }
}

#[async_trait::async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    fn backend(&self) -> &'static str {
        (**self).backend()
    }

    async fn fetch_all(&self) -> Result<Vec<Product>, StoreError> {
        (**self).fetch_all().await
    }

    async fn fetch_matching(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError> {
        (**self).fetch_matching(query).await
    }
}
