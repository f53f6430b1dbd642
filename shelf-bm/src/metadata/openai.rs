//! OpenAI Responses API metadata provider
//!
//! Asks a web-search-enabled model for a single JSON object describing the
//! book. The prompt pins the exact identifier and tells the model to report
//! `found: false` rather than guess; the trust gate enforces it regardless.
//!
//! # API Reference
//! - Endpoint: `POST {base_url}/responses`
//! - Auth: `Authorization: Bearer <key>`

use super::{MetadataProvider, ProviderError, ProviderRecord};
use crate::config::ProviderSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, info};

/// OpenAI metadata provider
pub struct OpenAiProvider {
    http_client: Client,
    settings: ProviderSettings,
}

impl OpenAiProvider {
    pub fn new(http_client: Client, settings: ProviderSettings) -> Self {
        Self {
            http_client,
            settings,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.settings.base_url)
    }

    /// Request body for one identifier lookup
    pub fn request_body(&self, isbn: &str) -> Value {
        json!({
            "model": self.settings.model,
            "tools": [{ "type": "web_search" }],
            "temperature": 0,
            "input": [
                {
                    "type": "message",
                    "role": "system",
                    "content": [{ "type": "input_text", "text": system_prompt(isbn) }],
                },
                {
                    "type": "message",
                    "role": "user",
                    "content": [{
                        "type": "input_text",
                        "text": format!("Return the metadata for ISBN {} only.", isbn),
                    }],
                },
            ],
        })
    }
}

/// Instructions pinning the output schema and the exact-identifier rules
fn system_prompt(isbn: &str) -> String {
    format!(
        r#"You are a book data assistant.

Your task is to produce ONLY the metadata of the book with the given ISBN and to return it as a single valid JSON object.

The output must have exactly this shape:

{{
  "found": boolean,
  "sourceIsbn": "the ISBN exactly as printed in the source you used, or null",
  "title": "Book title",
  "author": "Author name",
  "publisher": "Publisher name",
  "pageCount": number,
  "publishedDate": "Year",
  "description": "Short summary",
  "categories": ["Category 1", "Category 2"]
}}

ISBN RULES:
- The ISBN is: {isbn}
- When searching the web, use ONLY books that match this ISBN exactly.
- Do NOT accept any result whose ISBN field does not clearly show {isbn}.
- If the ISBN does not match exactly, return "found": false and "sourceIsbn": null.
- If you are not certain, do NOT guess: return "found": false.

Fields:
- "found": true if the book was found, otherwise false.
- "sourceIsbn": the real value of the ISBN field you saw online; null if not found or not certain.
- "title", "author", "publisher": prefer the edition published in the book's local market (e.g. the Turkish title and publisher for a book published in Turkey); otherwise use the original title and author.
- "pageCount": a number only (e.g. 320); null if unknown.
- "publishedDate": the year only, as a string (e.g. "2014").
- "description": a short summary of 2-4 sentences, in the language of the edition.
- "categories": an array of genre names such as "Self-Help", "Science Fiction", "Fantasy", "Psychology", "History"; [] if none.

Strict rules:
1. NEVER produce a cover image, link, URL or image source.
2. Do not write anything outside the JSON: no explanation, comment, markdown or warning before or after it.
3. The JSON must be valid: all keys and string values in double quotes, no trailing commas, no comments."#,
        isbn = isbn
    )
}

/// Assistant text from a Responses API envelope
///
/// Takes the first assistant `message` item (else the first output item) and
/// returns its first `output_text` part, trimmed. Missing pieces yield "".
pub fn reply_text(envelope: &Value) -> String {
    let items = match envelope.get("output").and_then(Value::as_array) {
        Some(items) => items,
        None => return String::new(),
    };

    let message = items
        .iter()
        .find(|item| {
            item.get("type").and_then(Value::as_str) == Some("message")
                && item.get("role").and_then(Value::as_str) == Some("assistant")
        })
        .or_else(|| items.first());

    message
        .and_then(|item| item.get("content"))
        .and_then(Value::as_array)
        .and_then(|parts| {
            parts
                .iter()
                .find(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
        })
        .and_then(|part| part.get("text"))
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

#[async_trait]
impl MetadataProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "OpenAI"
    }

    async fn lookup(&self, isbn: &str) -> Result<ProviderRecord, ProviderError> {
        debug!(isbn = %isbn, model = %self.settings.model, "Querying metadata provider");

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(&self.request_body(isbn))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        let envelope: Option<Value> = serde_json::from_slice(&body).ok();

        if !status.is_success() {
            let message = envelope
                .as_ref()
                .and_then(|v| v.pointer("/error/message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("OpenAI error: {}", status.as_u16()));
            error!(isbn = %isbn, status = status.as_u16(), message = %message, "Metadata provider error");
            return Err(ProviderError::Api(message));
        }

        let envelope = envelope
            .ok_or_else(|| ProviderError::Decode("response body is not JSON".to_string()))?;

        let record = ProviderRecord::parse_reply(&reply_text(&envelope));
        info!(
            isbn = %isbn,
            found = record.found,
            source_isbn = ?record.source_isbn,
            "Metadata provider replied"
        );
        Ok(record)
    }
}
