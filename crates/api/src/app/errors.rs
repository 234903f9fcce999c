use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use shopfront_products::FilterError;

use crate::app::services::ListError;

pub fn list_error_to_response(err: ListError) -> axum::response::Response {
    match err {
        ListError::InvalidFilter(e) => filter_error_to_response(&e),
        ListError::Store(e) => {
            // Details stay in the logs.
            tracing::error!(error = %e, "product store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "internal error")
        }
    }
}

pub fn filter_error_to_response(err: &FilterError) -> axum::response::Response {
    tracing::debug!(error = %err, "rejected filter parameters");
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "invalid_filter",
            "message": err.to_string(),
            "fields": err.fields(),
        })),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
