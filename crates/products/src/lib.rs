//! Products catalog module (read side).
//!
//! This crate holds the Product record plus the two declarative pieces the list
//! endpoint is built from: the filter set and the serializer. It is
//! pure logic (no IO, no HTTP, no storage).

pub mod filter;
pub mod product;
pub mod serializer;

pub use filter::{
    default_filters, FilterConfigError, FilterDecl, FilterError, Lookup, Operand, Predicate,
    ProductFilterSet, ProductQuery,
};
pub use product::{FieldKind, FieldValue, InvalidValue, Product, ProductField};
pub use serializer::{FieldSpec, ProductSerializer, SerializerConfigError, SerializerError};
