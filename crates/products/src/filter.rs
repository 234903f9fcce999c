//! Query-string filtering for the product list.
//!
//! A [`ProductFilterSet`] is a static table of declarations (`parameter -> field + lookup`)
//! validated once when the service starts. Per request it turns the query-string
//! pairs into a [`ProductQuery`]: a conjunction of typed predicates that can be
//! evaluated in memory or pushed down to a store.
//!
//! Request-time rules:
//! - unknown parameters are ignored
//! - empty values skip their filter
//! - a repeated parameter uses its last value
//! - every unparsable value is reported, nothing is silently dropped

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::product::{FieldKind, FieldValue, Product, ProductField};

/// Comparison applied between a product field and the requested value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lookup {
    Exact,
    IExact,
    IContains,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Lookup {
    pub fn as_str(self) -> &'static str {
        match self {
            Lookup::Exact => "exact",
            Lookup::IExact => "iexact",
            Lookup::IContains => "icontains",
            Lookup::Gt => "gt",
            Lookup::Gte => "gte",
            Lookup::Lt => "lt",
            Lookup::Lte => "lte",
            Lookup::In => "in",
        }
    }

    pub fn supports(self, kind: FieldKind) -> bool {
        match self {
            Lookup::Exact => true,
            Lookup::IExact | Lookup::IContains => kind == FieldKind::Text,
            Lookup::Gt | Lookup::Gte | Lookup::Lt | Lookup::Lte => kind.is_ordered(),
            Lookup::In => kind != FieldKind::Boolean,
        }
    }
}

impl core::fmt::Display for Lookup {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One filterable query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDecl {
    pub param: String,
    pub field: ProductField,
    pub lookup: Lookup,
}

impl FilterDecl {
    pub fn new(param: impl Into<String>, field: ProductField, lookup: Lookup) -> Self {
        Self {
            param: param.into(),
            field,
            lookup,
        }
    }
}

/// The catalog's stock filter declarations.
pub fn default_filters() -> Vec<FilterDecl> {
    use Lookup::*;
    use ProductField::*;

    vec![
        FilterDecl::new("id", Id, Exact),
        FilterDecl::new("ids", Id, In),
        FilterDecl::new("name", Name, Exact),
        FilterDecl::new("name_contains", Name, IContains),
        FilterDecl::new("category", Category, IExact),
        FilterDecl::new("price", Price, Exact),
        FilterDecl::new("min_price", Price, Gte),
        FilterDecl::new("max_price", Price, Lte),
        FilterDecl::new("in_stock", InStock, Exact),
        FilterDecl::new("created_after", CreatedAt, Gte),
        FilterDecl::new("created_before", CreatedAt, Lte),
    ]
}

/// Rejected filter declarations (startup-time).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterConfigError {
    #[error("filter parameter name cannot be empty")]
    EmptyParam,

    #[error("duplicate filter parameter `{0}`")]
    DuplicateParam(String),

    #[error("lookup `{lookup}` is not supported on {kind} field `{field}` (parameter `{param}`)")]
    UnsupportedLookup {
        param: String,
        field: ProductField,
        kind: FieldKind,
        lookup: Lookup,
    },
}

/// Rejected filter values (request-time).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Parameter name -> validation messages.
    #[error("invalid filter values: {}", describe(.0))]
    InvalidValues(BTreeMap<String, Vec<String>>),
}

impl FilterError {
    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        match self {
            FilterError::InvalidValues(fields) => fields,
        }
    }
}

fn describe(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields
        .iter()
        .map(|(param, msgs)| format!("{param}: {}", msgs.join("; ")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    One(FieldValue),
    Many(Vec<FieldValue>),
}

/// A single typed condition on one product field.
///
/// For `iexact` / `icontains` the text operand is stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    field: ProductField,
    lookup: Lookup,
    operand: Operand,
}

impl Predicate {
    pub fn field(&self) -> ProductField {
        self.field
    }

    pub fn lookup(&self) -> Lookup {
        self.lookup
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    pub fn matches(&self, product: &Product) -> bool {
        use core::cmp::Ordering::*;

        let actual = product.value(self.field);
        match (&self.operand, self.lookup) {
            (Operand::Many(values), Lookup::In) => values.contains(&actual),
            (Operand::One(expected), Lookup::Exact) => actual == *expected,
            (Operand::One(FieldValue::Text(needle)), Lookup::IExact) => match &actual {
                FieldValue::Text(s) => s.to_lowercase() == *needle,
                _ => false,
            },
            (Operand::One(FieldValue::Text(needle)), Lookup::IContains) => match &actual {
                FieldValue::Text(s) => s.to_lowercase().contains(needle.as_str()),
                _ => false,
            },
            (Operand::One(expected), lookup) => match actual.compare(expected) {
                Some(ord) => match lookup {
                    Lookup::Gt => ord == Greater,
                    Lookup::Gte => ord != Less,
                    Lookup::Lt => ord == Less,
                    Lookup::Lte => ord != Greater,
                    _ => false,
                },
                None => false,
            },
            (Operand::Many(_), _) => false,
        }
    }
}

/// Conjunction of predicates produced for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    predicates: Vec<Predicate>,
}

impl ProductQuery {
    /// Query that matches every product.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_unfiltered(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.predicates.iter().all(|p| p.matches(product))
    }

    /// Keep matching products, preserving order.
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        if self.is_unfiltered() {
            return products;
        }
        products.into_iter().filter(|p| self.matches(p)).collect()
    }
}

/// Validated filter declarations for the product list.
#[derive(Debug, Clone)]
pub struct ProductFilterSet {
    decls: Vec<FilterDecl>,
}

impl ProductFilterSet {
    pub fn new(decls: Vec<FilterDecl>) -> Result<Self, FilterConfigError> {
        let mut seen = HashSet::new();
        for decl in &decls {
            if decl.param.trim().is_empty() {
                return Err(FilterConfigError::EmptyParam);
            }
            if !seen.insert(decl.param.as_str()) {
                return Err(FilterConfigError::DuplicateParam(decl.param.clone()));
            }
            let kind = decl.field.kind();
            if !decl.lookup.supports(kind) {
                return Err(FilterConfigError::UnsupportedLookup {
                    param: decl.param.clone(),
                    field: decl.field,
                    kind,
                    lookup: decl.lookup,
                });
            }
        }
        Ok(Self { decls })
    }

    pub fn declarations(&self) -> &[FilterDecl] {
        &self.decls
    }

    /// Turn raw query-string pairs into a query.
    pub fn parse<K, V>(&self, params: &[(K, V)]) -> Result<ProductQuery, FilterError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut predicates = Vec::new();
        let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for decl in &self.decls {
            let Some(raw) = params
                .iter()
                .rev()
                .find(|(k, _)| k.as_ref() == decl.param.as_str())
                .map(|(_, v)| v.as_ref().trim())
            else {
                continue;
            };
            if raw.is_empty() {
                continue;
            }

            match parse_operand(decl, raw) {
                Ok(Some(operand)) => predicates.push(Predicate {
                    field: decl.field,
                    lookup: decl.lookup,
                    operand,
                }),
                Ok(None) => {}
                Err(msg) => errors.entry(decl.param.clone()).or_default().push(msg),
            }
        }

        if errors.is_empty() {
            Ok(ProductQuery { predicates })
        } else {
            Err(FilterError::InvalidValues(errors))
        }
    }
}

fn parse_operand(decl: &FilterDecl, raw: &str) -> Result<Option<Operand>, String> {
    let kind = decl.field.kind();

    if decl.lookup == Lookup::In {
        let mut values = Vec::new();
        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let value = FieldValue::parse(kind, item)
                .map_err(|e| format!("`{item}` is not valid: {e}"))?;
            values.push(value);
        }
        return Ok((!values.is_empty()).then_some(Operand::Many(values)));
    }

    let value = FieldValue::parse(kind, raw).map_err(|_| format!("enter {}", kind.expectation()))?;
    let value = match (decl.lookup, value) {
        (Lookup::IExact | Lookup::IContains, FieldValue::Text(s)) => FieldValue::Text(s.to_lowercase()),
        (_, v) => v,
    };
    Ok(Some(Operand::One(value)))
}
