//! Infrastructure layer: product persistence adapters and data loading.

pub mod fixtures;
pub mod store;

pub use store::{InMemoryProductStore, PostgresProductStore, ProductStore, StoreError};
