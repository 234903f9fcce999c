//! Catalog fixtures: JSON files that seed the in-memory store.
//!
//! A fixture file is a JSON array of product representations, read back through a
//! [`ProductSerializer`] (normally [`ProductSerializer::full`]).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use shopfront_core::{Entity, ProductId};
use shopfront_products::{Product, ProductSerializer, SerializerError};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("fixture file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("fixture must be a JSON array of products")]
    NotAnArray,

    #[error("fixture record #{index}: {source}")]
    Record {
        index: usize,
        source: SerializerError,
    },

    #[error("duplicate product id {0} in fixture")]
    DuplicateId(ProductId),
}

/// Load products from a fixture file on disk.
pub fn load_products(path: &Path, serializer: &ProductSerializer) -> Result<Vec<Product>, FixtureError> {
    let raw = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let products = parse_products(&raw, serializer)?;
    tracing::info!(path = %path.display(), count = products.len(), "loaded product fixtures");
    Ok(products)
}

/// Parse a fixture document.
pub fn parse_products(raw: &str, serializer: &ProductSerializer) -> Result<Vec<Product>, FixtureError> {
    let doc: Value = serde_json::from_str(raw)?;
    let records = doc.as_array().ok_or(FixtureError::NotAnArray)?;

    let mut seen = HashSet::new();
    let mut products = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let product = serializer
            .from_representation(record)
            .map_err(|source| FixtureError::Record { index, source })?;
        if !seen.insert(*product.id()) {
            return Err(FixtureError::DuplicateId(*product.id()));
        }
        products.push(product);
    }
    Ok(products)
}
