use std::collections::BTreeMap;
use std::sync::RwLock;

use shopfront_core::{Entity, ProductId};
use shopfront_products::Product;

use super::{ProductStore, StoreError};

/// In-memory product store for tests/dev (and fixture-seeded runs).
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<BTreeMap<ProductId, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        let store = Self::new();
        for p in products {
            store.insert(p);
        }
        store
    }

    /// Insert or replace a product; returns the replaced record, if any.
    pub fn insert(&self, product: Product) -> Option<Product> {
        match self.inner.write() {
            Ok(mut map) => map.insert(*product.id(), product),
            Err(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ProductStore for InMemoryProductStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn fetch_all(&self) -> Result<Vec<Product>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Unavailable("product store lock poisoned".to_string()))?;
        Ok(map.values().cloned().collect())
    }
}
