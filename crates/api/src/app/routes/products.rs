use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::errors;
use crate::app::services::AppServices;

/// Read-only: any verb other than GET gets `405 Method Not Allowed`.
/// The trailing-slash form is served too.
pub fn router() -> Router {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/", get(list_products))
}

#[tracing::instrument(name = "list_products", skip_all)]
pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<Vec<(String, String)>>,
) -> axum::response::Response {
    match services.list_products(&params).await {
        Ok(items) => {
            tracing::debug!(params = params.len(), count = items.len(), "listed products");
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::list_error_to_response(e),
    }
}
