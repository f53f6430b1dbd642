//! shelf-bm library interface
//!
//! Book Metadata relay: given an ISBN, returns provider metadata that passed
//! the trust gate plus a verified cover image URL.

pub mod api;
pub mod config;
pub mod covers;
pub mod error;
pub mod isbn;
pub mod metadata;

pub use crate::error::{ApiError, ApiResult};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::covers::CoverWaterfall;
use crate::metadata::{MetadataProvider, OpenAiProvider};

/// Application state shared across handlers
///
/// Holds no per-request mutable state; every lookup is independent.
#[derive(Clone)]
pub struct AppState {
    /// Metadata provider (the language-model lookup in production)
    pub provider: Arc<dyn MetadataProvider>,
    /// Cover discovery chain
    pub covers: Arc<CoverWaterfall>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(provider: Arc<dyn MetadataProvider>, covers: Arc<CoverWaterfall>) -> Self {
        Self {
            provider,
            covers,
            startup_time: Utc::now(),
        }
    }

    /// Production wiring from resolved configuration
    pub fn from_config(config: &ServiceConfig, http_client: reqwest::Client) -> Self {
        let provider = OpenAiProvider::new(http_client.clone(), config.provider.clone());
        let covers = CoverWaterfall::standard(http_client, &config.covers);
        Self::new(Arc::new(provider), Arc::new(covers))
    }
}

/// Build application router
///
/// Every response, including errors and preflight, carries open CORS headers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::book_routes())
        .merge(api::health_routes())
        .fallback(api::not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Last-resort 500 for a panicking handler
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "Server error while looking up the ISBN.".to_string());

    tracing::error!(detail = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "found": false, "message": detail })),
    )
        .into_response()
}
