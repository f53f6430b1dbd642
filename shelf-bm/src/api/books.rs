//! Book lookup endpoint
//!
//! `POST /api/books/ai` with `{"isbn": "..."}`:
//! 1. Clean the identifier
//! 2. Ask the metadata provider
//! 3. Apply the trust gate (rejection is a 200 "not found", not an error)
//! 4. Discover a cover for trusted records only
//! 5. Merge and respond

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::isbn;
use crate::metadata::{trust_gate, ProviderRecord};
use crate::AppState;

pub const MISSING_ISBN_MESSAGE: &str = "ISBN is missing.";
pub const UNTRUSTED_MESSAGE: &str =
    "No reliable record was found for this ISBN. You can enter the details manually.";

/// Trusted book metadata plus discovered cover
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub found: bool,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub page_count: Option<u32>,
    pub published_date: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: String,
    pub categories: Vec<String>,
}

impl BookResponse {
    pub fn from_record(record: ProviderRecord, cover_image_url: String) -> Self {
        Self {
            found: true,
            title: record.title,
            author: record.author,
            publisher: record.publisher,
            page_count: record.page_count,
            published_date: record.published_date,
            description: record.description,
            cover_image_url,
            categories: record.categories,
        }
    }
}

/// Explicit "nothing trustworthy" reply
#[derive(Debug, Clone, Serialize)]
pub struct NotFoundResponse {
    pub found: bool,
    pub message: String,
}

impl NotFoundResponse {
    pub fn untrusted() -> Self {
        Self {
            found: false,
            message: UNTRUSTED_MESSAGE.to_string(),
        }
    }
}

/// Identifier from a request body; bodies that are not JSON count as empty
///
/// Strings are trimmed and numbers are accepted as their decimal text.
pub fn requested_isbn(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let raw = match value.get("isbn")? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    if raw.is_empty() {
        None
    } else {
        Some(raw)
    }
}

/// POST /api/books/ai
pub async fn lookup_book(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    let raw = requested_isbn(&body)
        .ok_or_else(|| ApiError::BadRequest(MISSING_ISBN_MESSAGE.to_string()))?;

    let clean = isbn::clean(&raw);
    info!(
        isbn = %raw,
        clean = %clean,
        provider = state.provider.name(),
        "Book lookup requested"
    );

    let record = state.provider.lookup(&clean).await?;

    let verdict = trust_gate::evaluate(&clean, &record);
    if !verdict.is_trusted() {
        warn!(
            isbn = %clean,
            source_isbn = ?record.source_isbn,
            verdict = ?verdict,
            "Provider record rejected by trust gate"
        );
        return Ok((StatusCode::OK, Json(NotFoundResponse::untrusted())).into_response());
    }

    let cover_image_url = state.covers.discover(&clean).await;
    let response = BookResponse::from_record(record, cover_image_url);

    info!(
        isbn = %clean,
        title = ?response.title,
        cover = %response.cover_image_url,
        "Book lookup answered"
    );

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Build book routes
pub fn book_routes() -> Router<AppState> {
    Router::new().route("/api/books/ai", post(lookup_book))
}
