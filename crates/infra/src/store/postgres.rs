//! Postgres-backed product store.
//!
//! Reads the `products` table:
//!
//! ```sql
//! products (
//!     id          BIGINT PRIMARY KEY,
//!     name        TEXT NOT NULL,
//!     category    TEXT NOT NULL DEFAULT '',
//!     price       BIGINT NOT NULL,
//!     in_stock    BOOLEAN NOT NULL,
//!     created_at  TIMESTAMPTZ NOT NULL
//! )
//! ```
//!
//! The table is owned by whatever loads the catalog; this adapter never writes.

use std::time::Duration;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use shopfront_core::ProductId;
use shopfront_products::{FieldValue, Lookup, Operand, Predicate, Product, ProductField, ProductQuery};

use super::{ProductStore, StoreError};

const SELECT_PRODUCTS: &str = "SELECT id, name, category, price, in_stock, created_at FROM products";

/// Postgres-backed product store.
///
/// Uses an SQLx connection pool (thread-safe, cheap to clone). Filters are
/// translated into a parameterized `WHERE` clause so only matching rows leave
/// the database.
#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a store whose pool connects on first use.
    ///
    /// Only the URL is validated here; an unreachable database surfaces later as
    /// [`StoreError::Unavailable`] on each request.
    pub fn connect_lazy(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(database_url)
            .map_err(|e| StoreError::Unavailable(format!("invalid database configuration: {e}")))?;
        Ok(Self::new(pool))
    }

    async fn run(&self, mut builder: QueryBuilder<'static, Postgres>) -> Result<Vec<Product>, StoreError> {
        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        tracing::debug!(rows = rows.len(), "fetched product rows");
        rows.iter().map(product_from_row).collect()
    }
}

#[async_trait::async_trait]
impl ProductStore for PostgresProductStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn fetch_all(&self) -> Result<Vec<Product>, StoreError> {
        self.run(select_products(&ProductQuery::all())).await
    }

    async fn fetch_matching(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError> {
        self.run(select_products(query)).await
    }
}

fn column(field: ProductField) -> &'static str {
    match field {
        ProductField::Id => "id",
        ProductField::Name => "name",
        ProductField::Category => "category",
        ProductField::Price => "price",
        ProductField::InStock => "in_stock",
        ProductField::CreatedAt => "created_at",
    }
}

pub(crate) fn select_products(query: &ProductQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(SELECT_PRODUCTS);
    for (i, predicate) in query.predicates().iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        push_predicate(&mut builder, predicate);
    }
    builder.push(" ORDER BY id");
    builder
}

fn push_predicate(builder: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate) {
    let col = column(predicate.field());
    match (predicate.lookup(), predicate.operand()) {
        (Lookup::In, Operand::Many(values)) => {
            builder.push(col).push(" IN (");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                bind_value(builder, value);
            }
            builder.push(")");
        }
        // Text operands for case-insensitive lookups arrive lowercased.
        (Lookup::IExact, Operand::One(value)) => {
            builder.push(format!("LOWER({col}) = "));
            bind_value(builder, value);
        }
        (Lookup::IContains, Operand::One(FieldValue::Text(needle))) => {
            builder
                .push(format!("LOWER({col}) LIKE "))
                .push_bind(format!("%{}%", escape_like(needle)))
                .push(" ESCAPE '\\'");
        }
        (lookup, Operand::One(value)) => {
            let op = match lookup {
                Lookup::Gt => ">",
                Lookup::Gte => ">=",
                Lookup::Lt => "<",
                Lookup::Lte => "<=",
                _ => "=",
            };
            builder.push(format!("{col} {op} "));
            bind_value(builder, value);
        }
        // Not produced by `ProductFilterSet`; keep the clause well-formed.
        (_, Operand::Many(_)) => {
            builder.push("FALSE");
        }
    }
}

fn bind_value(builder: &mut QueryBuilder<'static, Postgres>, value: &FieldValue) {
    match value.clone() {
        FieldValue::Integer(v) => builder.push_bind(v),
        FieldValue::Text(v) => builder.push_bind(v),
        FieldValue::Boolean(v) => builder.push_bind(v),
        FieldValue::Timestamp(v) => builder.push_bind(v),
    };
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Decode(e.to_string());

    let id: i64 = row.try_get("id").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let category: String = row.try_get("category").map_err(decode)?;
    let price: i64 = row.try_get("price").map_err(decode)?;
    let in_stock: bool = row.try_get("in_stock").map_err(decode)?;
    let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at").map_err(decode)?;

    let product = Product::new(ProductId::new(id), name)
        .map_err(|e| StoreError::Decode(format!("product {id}: {e}")))?
        .with_category(category)
        .with_price(price)
        .with_in_stock(in_stock)
        .with_created_at(created_at);
    Ok(product)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("{operation}: connection pool exhausted or closed"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("{operation}: {e}")),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("{operation}: {e}")),
        sqlx::Error::Database(db_err) => {
            StoreError::Query(format!("database error in {operation}: {}", db_err.message()))
        }
        e @ (sqlx::Error::ColumnNotFound(_) | sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_)) => {
            StoreError::Decode(format!("{operation}: {e}"))
        }
        other => StoreError::Query(format!("{operation}: {other}")),
    }
}
