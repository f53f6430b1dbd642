//! Candidate cover verification
//!
//! A candidate counts as a real cover when a HEAD request answers exactly
//! `200 OK` with a declared `Content-Length` above [`MIN_COVER_BYTES`].
//! Hosts commonly answer missing covers with a tiny "no image" icon, which
//! the size floor screens out without downloading the body.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Timeout for the HEAD existence check
pub const VERIFY_TIMEOUT: Duration = Duration::from_millis(2500);

/// Declared sizes at or below this are treated as placeholder icons
pub const MIN_COVER_BYTES: u64 = 2500;

/// Verification seam used by the direct-URL and scraped-page probes
#[async_trait]
pub trait CoverVerifier: Send + Sync {
    /// True only for a live, adequately sized image. Never errors.
    async fn verify(&self, url: &str) -> bool;
}

/// HEAD-request verifier
pub struct HeadVerifier {
    http_client: Client,
    timeout: Duration,
}

impl HeadVerifier {
    pub fn new(http_client: Client) -> Self {
        Self {
            http_client,
            timeout: VERIFY_TIMEOUT,
        }
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CoverVerifier for HeadVerifier {
    async fn verify(&self, url: &str) -> bool {
        let response = match self
            .http_client
            .head(url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %url, error = %e, "Cover HEAD check failed");
                return false;
            }
        };

        let accepted = accepts(response.status(), response.headers());
        debug!(
            url = %url,
            status = response.status().as_u16(),
            content_length = ?declared_length(response.headers()),
            accepted,
            "Cover HEAD check"
        );
        accepted
    }
}

/// Declared body size from the `Content-Length` header
///
/// Read from the header map rather than the body size hint: a HEAD response
/// has no body, so the hint is always zero.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Accept/reject decision for a HEAD response
pub fn accepts(status: StatusCode, headers: &HeaderMap) -> bool {
    if status != StatusCode::OK {
        return false;
    }
    matches!(declared_length(headers), Some(len) if len > MIN_COVER_BYTES)
}
