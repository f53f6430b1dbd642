//! HTTP API handlers for shelf-bm

pub mod books;
pub mod health;

pub use books::{book_routes, lookup_book};
pub use health::health_routes;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Fallback for unknown routes
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
