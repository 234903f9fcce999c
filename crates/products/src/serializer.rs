//! External (JSON) shape of a product.
//!
//! A [`ProductSerializer`] is an ordered list of exposed fields and the names they
//! are exposed under. Output objects keep that order.

use std::collections::{BTreeMap, HashSet};

use chrono::SecondsFormat;
use serde_json::{Map, Value};
use thiserror::Error;

use shopfront_core::{DomainError, ProductId};

use crate::product::{FieldKind, FieldValue, Product, ProductField};

/// One exposed field: which attribute, under which key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: ProductField,
    pub name: String,
}

impl FieldSpec {
    pub fn new(field: ProductField, name: impl Into<String>) -> Self {
        Self {
            field,
            name: name.into(),
        }
    }

    /// Expose a field under its own name.
    pub fn plain(field: ProductField) -> Self {
        Self::new(field, field.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializerConfigError {
    #[error("serializer must expose at least one field")]
    NoFields,

    #[error("unknown product field `{0}`")]
    UnknownField(String),

    #[error("field `{0}` is exposed more than once")]
    DuplicateField(ProductField),

    #[error("external name `{0}` is used more than once")]
    DuplicateName(String),

    #[error("external name for field `{0}` cannot be empty")]
    EmptyName(ProductField),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializerError {
    #[error("representation must be a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("field `{name}`: expected {expected}")]
    InvalidField { name: String, expected: &'static str },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSerializer {
    fields: Vec<FieldSpec>,
}

impl ProductSerializer {
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SerializerConfigError> {
        if fields.is_empty() {
            return Err(SerializerConfigError::NoFields);
        }
        let mut seen_fields = HashSet::new();
        let mut seen_names = HashSet::new();
        for spec in &fields {
            if spec.name.trim().is_empty() {
                return Err(SerializerConfigError::EmptyName(spec.field));
            }
            if !seen_fields.insert(spec.field) {
                return Err(SerializerConfigError::DuplicateField(spec.field));
            }
            if !seen_names.insert(spec.name.as_str()) {
                return Err(SerializerConfigError::DuplicateName(spec.name.clone()));
            }
        }
        Ok(Self { fields })
    }

    /// Every field under its own name, in canonical order.
    pub fn full() -> Self {
        Self {
            fields: ProductField::ALL.into_iter().map(FieldSpec::plain).collect(),
        }
    }

    /// Build from entries of the form `field` or `field=external_name`.
    pub fn from_field_names<S: AsRef<str>>(entries: &[S]) -> Result<Self, SerializerConfigError> {
        let mut fields = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.as_ref().trim();
            let (field, name) = match entry.split_once('=') {
                Some((f, n)) => (f.trim(), n.trim()),
                None => (entry, entry),
            };
            let field = ProductField::from_name(field)
                .ok_or_else(|| SerializerConfigError::UnknownField(field.to_string()))?;
            fields.push(FieldSpec::new(field, name));
        }
        Self::new(fields)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn to_representation(&self, product: &Product) -> Map<String, Value> {
        let mut out = Map::with_capacity(self.fields.len());
        for spec in &self.fields {
            out.insert(spec.name.clone(), to_json(product.value(spec.field)));
        }
        out
    }

    /// Serialize a list, preserving order.
    pub fn many(&self, products: &[Product]) -> Vec<Value> {
        products
            .iter()
            .map(|p| Value::Object(self.to_representation(p)))
            .collect()
    }

    /// Read a product back from its external shape.
    ///
    /// `id` and `name` are required. Fields this serializer does not expose keep
    /// their `Product::new` defaults.
    pub fn from_representation(&self, value: &Value) -> Result<Product, SerializerError> {
        let obj = value.as_object().ok_or(SerializerError::NotAnObject)?;

        let mut values = BTreeMap::new();
        for spec in &self.fields {
            let Some(raw) = obj.get(&spec.name) else {
                continue;
            };
            let kind = spec.field.kind();
            let value = from_json(kind, raw).ok_or_else(|| SerializerError::InvalidField {
                name: spec.name.clone(),
                expected: kind.expectation(),
            })?;
            values.insert(spec.field, value);
        }

        let id = match values.remove(&ProductField::Id) {
            Some(FieldValue::Integer(id)) => ProductId::new(id),
            _ => return Err(SerializerError::MissingField(self.external_name(ProductField::Id))),
        };
        let name = match values.remove(&ProductField::Name) {
            Some(FieldValue::Text(name)) => name,
            _ => return Err(SerializerError::MissingField(self.external_name(ProductField::Name))),
        };

        let mut product = Product::new(id, name)?;
        for (field, value) in values {
            product.set(field, value)?;
        }
        Ok(product)
    }

    fn external_name(&self, field: ProductField) -> String {
        self.fields
            .iter()
            .find(|s| s.field == field)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| field.name().to_string())
    }
}

fn to_json(value: FieldValue) -> Value {
    match value {
        FieldValue::Integer(v) => Value::from(v),
        FieldValue::Text(v) => Value::String(v),
        FieldValue::Boolean(v) => Value::Bool(v),
        FieldValue::Timestamp(v) => Value::String(v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    }
}

fn from_json(kind: FieldKind, raw: &Value) -> Option<FieldValue> {
    match kind {
        FieldKind::Integer => raw.as_i64().map(FieldValue::Integer),
        FieldKind::Text => raw.as_str().map(|s| FieldValue::Text(s.to_string())),
        FieldKind::Boolean => raw.as_bool().map(FieldValue::Boolean),
        FieldKind::Timestamp => FieldValue::parse(kind, raw.as_str()?).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn sample() -> Product {
        Product::new(ProductId::new(1), "A")
            .unwrap()
            .with_category("tools")
            .with_price(10)
            .with_created_at(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
    }

    #[test]
    fn full_serializer_exposes_every_field_in_order() {
        let out = Value::Object(ProductSerializer::full().to_representation(&sample()));
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"id":1,"name":"A","category":"tools","price":10,"in_stock":true,"created_at":"2024-01-02T03:04:05Z"}"#
        );
    }

    #[test]
    fn declared_order_and_renames_are_kept() {
        let s = ProductSerializer::from_field_names(&["price=cost", "id", "name"]).unwrap();
        let out = Value::Object(s.to_representation(&sample()));
        assert_eq!(serde_json::to_string(&out).unwrap(), r#"{"cost":10,"id":1,"name":"A"}"#);
    }

    #[test]
    fn many_of_empty_is_empty() {
        assert!(ProductSerializer::full().many(&[]).is_empty());
    }

    #[test]
    fn rejects_bad_configurations() {
        assert_eq!(
            ProductSerializer::new(vec![]).unwrap_err(),
            SerializerConfigError::NoFields
        );
        assert_eq!(
            ProductSerializer::from_field_names(&["id", "id=ident"]).unwrap_err(),
            SerializerConfigError::DuplicateField(ProductField::Id)
        );
        assert_eq!(
            ProductSerializer::from_field_names(&["id", "name=id"]).unwrap_err(),
            SerializerConfigError::DuplicateName("id".into())
        );
        assert_eq!(
            ProductSerializer::from_field_names(&["colour"]).unwrap_err(),
            SerializerConfigError::UnknownField("colour".into())
        );
        assert_eq!(
            ProductSerializer::from_field_names(&["price= "]).unwrap_err(),
            SerializerConfigError::EmptyName(ProductField::Price)
        );
    }

    #[test]
    fn reads_back_what_it_writes() {
        let s = ProductSerializer::full();
        let repr = Value::Object(s.to_representation(&sample()));
        assert_eq!(s.from_representation(&repr).unwrap(), sample());
    }

    #[test]
    fn reading_fills_defaults_for_missing_optional_fields() {
        let p = ProductSerializer::full()
            .from_representation(&json!({"id": 5, "name": "Saw"}))
            .unwrap();
        assert_eq!(p.id_typed(), ProductId::new(5));
        assert!(p.in_stock());
        assert_eq!(p.price(), 0);
    }

    #[test]
    fn reading_reports_missing_and_mistyped_fields() {
        let s = ProductSerializer::from_field_names(&["id=sku_id", "name", "price"]).unwrap();
        assert_eq!(
            s.from_representation(&json!({"name": "Saw"})).unwrap_err(),
            SerializerError::MissingField("sku_id".into())
        );
        match s
            .from_representation(&json!({"sku_id": 1, "name": "Saw", "price": "10"}))
            .unwrap_err()
        {
            SerializerError::InvalidField { name, .. } => assert_eq!(name, "price"),
            other => panic!("Expected InvalidField, got {other:?}"),
        }
        assert_eq!(
            s.from_representation(&json!([1, 2])).unwrap_err(),
            SerializerError::NotAnObject
        );
        assert!(matches!(
            s.from_representation(&json!({"sku_id": 1, "name": " "})).unwrap_err(),
            SerializerError::Domain(DomainError::Validation(_))
        ));
    }
}
