use axum::Router;

pub mod products;
pub mod system;

/// Router for the catalog endpoints.
pub fn router() -> Router {
    products::router()
}
