//! Book metadata from an external provider
//!
//! The provider is untrusted: its reply is parsed leniently into a
//! [`ProviderRecord`] and then has to pass the [`trust_gate`] before any of it
//! reaches a client.

pub mod openai;
pub mod trust_gate;

pub use openai::OpenAiProvider;
pub use trust_gate::TrustVerdict;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```json").expect("fence pattern is valid"));

/// Provider failure (surfaced to the caller as a server error)
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Request could not be sent or the connection failed
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-success status
    #[error("{0}")]
    Api(String),

    /// Provider envelope could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Source of book metadata for a cleaned identifier
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Look up `isbn`; an unparseable reply yields an empty record, not an error
    async fn lookup(&self, isbn: &str) -> Result<ProviderRecord, ProviderError>;
}

/// The provider's claimed record, as parsed (not yet trusted)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderRecord {
    pub found: bool,
    pub source_isbn: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub page_count: Option<u32>,
    pub published_date: Option<String>,
    pub description: Option<String>,
    pub categories: Vec<String>,
}

impl ProviderRecord {
    /// Parse model output text, tolerating markdown code fences
    ///
    /// Invalid JSON is logged and replaced by the empty record, which the
    /// trust gate then rejects.
    pub fn parse_reply(text: &str) -> Self {
        let cleaned = JSON_FENCE.replace_all(text, "").replace("```", "");
        let cleaned = cleaned.trim();

        if cleaned.is_empty() {
            return Self::default();
        }

        match serde_json::from_str::<Value>(cleaned) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                warn!(error = %e, "Provider reply is not valid JSON");
                Self::default()
            }
        }
    }

    /// Build a record from loosely-typed JSON; wrong-typed fields become `None`
    pub fn from_value(value: &Value) -> Self {
        Self {
            found: value.get("found").and_then(Value::as_bool).unwrap_or(false),
            source_isbn: string_field(value, "sourceIsbn"),
            title: string_field(value, "title"),
            author: string_field(value, "author"),
            publisher: string_field(value, "publisher"),
            page_count: value.get("pageCount").and_then(page_count),
            published_date: value.get("publishedDate").and_then(published_date),
            description: string_field(value, "description"),
            categories: value.get("categories").map(categories).unwrap_or_default(),
        }
    }
}

/// Non-empty string field
fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Positive whole page count from a number or a numeric string
///
/// Fractional values (`212.7`) are rejected rather than rounded.
fn page_count(value: &Value) -> Option<u32> {
    let count = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 1.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;

    u32::try_from(count).ok().filter(|c| *c > 0)
}

/// Publication year as text; numeric years are accepted too
fn published_date(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Trimmed, non-empty string entries in original order
pub fn categories(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
