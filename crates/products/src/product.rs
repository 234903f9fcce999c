use core::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopfront_core::{DomainError, DomainResult, Entity, ProductId};

/// Value kind of a product field; drives parsing of filter values and
/// serializer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Text,
    Boolean,
    Timestamp,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Text => "text",
            FieldKind::Boolean => "boolean",
            FieldKind::Timestamp => "timestamp",
        }
    }

    /// Human-readable description of an accepted value (used in error messages).
    pub fn expectation(self) -> &'static str {
        match self {
            FieldKind::Integer => "a whole number",
            FieldKind::Text => "a string",
            FieldKind::Boolean => "a boolean (true or false)",
            FieldKind::Timestamp => "an RFC 3339 timestamp or a YYYY-MM-DD date",
        }
    }

    pub fn is_ordered(self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::Timestamp)
    }
}

impl core::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addressable attributes of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductField {
    Id,
    Name,
    Category,
    Price,
    InStock,
    CreatedAt,
}

impl ProductField {
    /// Every field, in canonical order.
    pub const ALL: [ProductField; 6] = [
        ProductField::Id,
        ProductField::Name,
        ProductField::Category,
        ProductField::Price,
        ProductField::InStock,
        ProductField::CreatedAt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProductField::Id => "id",
            ProductField::Name => "name",
            ProductField::Category => "category",
            ProductField::Price => "price",
            ProductField::InStock => "in_stock",
            ProductField::CreatedAt => "created_at",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            ProductField::Id | ProductField::Price => FieldKind::Integer,
            ProductField::Name | ProductField::Category => FieldKind::Text,
            ProductField::InStock => FieldKind::Boolean,
            ProductField::CreatedAt => FieldKind::Timestamp,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl core::fmt::Display for ProductField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A value could not be read as the expected field kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("expected {}", .kind.expectation())]
pub struct InvalidValue {
    pub kind: FieldKind,
}

/// A typed scalar held by (or compared against) a product field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Boolean(_) => FieldKind::Boolean,
            FieldValue::Timestamp(_) => FieldKind::Timestamp,
        }
    }

    /// Parse a textual value (query string, config) as the given kind.
    ///
    /// Text is taken verbatim; callers decide whether to trim.
    pub fn parse(kind: FieldKind, raw: &str) -> Result<Self, InvalidValue> {
        let invalid = InvalidValue { kind };
        match kind {
            FieldKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| invalid),
            FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
            FieldKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(FieldValue::Boolean(true)),
                "false" | "0" => Ok(FieldValue::Boolean(false)),
                _ => Err(invalid),
            },
            FieldKind::Timestamp => parse_timestamp(raw.trim())
                .map(FieldValue::Timestamp)
                .ok_or(invalid),
        }
    }

    /// Ordering between two values of the same kind; `None` across kinds.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Catalog record, as read from the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    name: String,
    category: String,
    price: i64, // smallest currency unit
    in_stock: bool,
    created_at: DateTime<Utc>,
}

impl Product {
    /// Create a product with default attributes (no category, price 0, in stock,
    /// created at the Unix epoch).
    pub fn new(id: ProductId, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            category: String::new(),
            price: 0,
            in_stock: true,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        })
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_price(mut self, price: i64) -> Self {
        self.price = price;
        self
    }

    pub fn with_in_stock(mut self, in_stock: bool) -> Self {
        self.in_stock = in_stock;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn in_stock(&self) -> bool {
        self.in_stock
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Read a field as a typed value.
    pub fn value(&self, field: ProductField) -> FieldValue {
        match field {
            ProductField::Id => FieldValue::Integer(self.id.get()),
            ProductField::Name => FieldValue::Text(self.name.clone()),
            ProductField::Category => FieldValue::Text(self.category.clone()),
            ProductField::Price => FieldValue::Integer(self.price),
            ProductField::InStock => FieldValue::Boolean(self.in_stock),
            ProductField::CreatedAt => FieldValue::Timestamp(self.created_at),
        }
    }

    /// Overwrite a field. The value kind must match the field kind.
    pub fn set(&mut self, field: ProductField, value: FieldValue) -> DomainResult<()> {
        match (field, value) {
            (ProductField::Id, FieldValue::Integer(v)) => self.id = ProductId::new(v),
            (ProductField::Name, FieldValue::Text(v)) => {
                if v.trim().is_empty() {
                    return Err(DomainError::validation("product name cannot be empty"));
                }
                self.name = v;
            }
            (ProductField::Category, FieldValue::Text(v)) => self.category = v,
            (ProductField::Price, FieldValue::Integer(v)) => self.price = v,
            (ProductField::InStock, FieldValue::Boolean(v)) => self.in_stock = v,
            (ProductField::CreatedAt, FieldValue::Timestamp(v)) => self.created_at = v,
            (field, value) => {
                return Err(DomainError::validation(format!(
                    "field `{field}` expects a {} value, got {}",
                    field.kind(),
                    value.kind()
                )));
            }
        }
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
