//! Cover source probes
//!
//! Direct-URL probes fill a template and verify the result. The detail-page
//! and image-search probes scrape with text patterns rather than a parser:
//! neither page is a stable contract, so extraction is best-effort and the
//! classifier/verifier decide what survives.

use super::classifier::is_cover_photo;
use super::verifier::CoverVerifier;
use super::{CoverProbe, ProbeError, BROWSER_USER_AGENT};
use crate::isbn;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Timeout for the scraped detail page
pub const DETAIL_PAGE_TIMEOUT: Duration = Duration::from_secs(4);

/// First `<img src>` inside the detail page's cover container
static DETAIL_IMAGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<div\s+class="image">\s*<img\s+src="([^"]+)""#)
        .expect("detail image pattern is valid")
});

/// `["<url>",<width>,<height>]` literals embedded in image-search results
static SEARCH_IMAGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\["(https?://[^"]+)",\s*(\d+),\s*(\d+)\]"#)
        .expect("search image pattern is valid")
});

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

// ============================================================================
// Direct template probes
// ============================================================================

/// Fixed URL template with an `{isbn}` placeholder, verified before use
pub struct TemplateProbe {
    name: &'static str,
    template: String,
    verifier: Arc<dyn CoverVerifier>,
}

impl TemplateProbe {
    pub fn new(name: &'static str, template: &str, verifier: Arc<dyn CoverVerifier>) -> Self {
        Self {
            name,
            template: template.to_string(),
            verifier,
        }
    }

    pub fn url_for(&self, isbn: &str) -> String {
        self.template.replace("{isbn}", isbn)
    }
}

#[async_trait]
impl CoverProbe for TemplateProbe {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn attempt(&self, isbn: &str) -> Result<Option<String>, ProbeError> {
        let url = self.url_for(isbn);
        if self.verifier.verify(&url).await {
            Ok(Some(url))
        } else {
            Ok(None)
        }
    }
}

/// Marketplace template keyed by the 10-character identifier (`{isbn10}`)
///
/// Identifiers without a 10-character form are skipped.
pub struct MarketplaceProbe {
    template: String,
    verifier: Arc<dyn CoverVerifier>,
}

impl MarketplaceProbe {
    pub fn new(template: &str, verifier: Arc<dyn CoverVerifier>) -> Self {
        Self {
            template: template.to_string(),
            verifier,
        }
    }

    pub fn url_for(&self, isbn: &str) -> Option<String> {
        isbn::isbn10(isbn).map(|isbn10| self.template.replace("{isbn10}", &isbn10))
    }
}

#[async_trait]
impl CoverProbe for MarketplaceProbe {
    fn name(&self) -> &'static str {
        "Amazon"
    }

    async fn attempt(&self, isbn: &str) -> Result<Option<String>, ProbeError> {
        let url = match self.url_for(isbn) {
            Some(url) => url,
            None => {
                debug!(isbn = %isbn, "No 10-character form, skipping marketplace");
                return Ok(None);
            }
        };

        if self.verifier.verify(&url).await {
            Ok(Some(url))
        } else {
            Ok(None)
        }
    }
}

// ============================================================================
// Scraped detail page
// ============================================================================

/// Identifier lookup page scraped for its cover container
pub struct DetailPageProbe {
    http_client: Client,
    template: String,
    verifier: Arc<dyn CoverVerifier>,
    timeout: Duration,
}

impl DetailPageProbe {
    pub fn new(http_client: Client, template: &str, verifier: Arc<dyn CoverVerifier>) -> Self {
        Self {
            http_client,
            template: template.to_string(),
            verifier,
            timeout: DETAIL_PAGE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// First image URL inside the cover container, if any
pub fn extract_detail_image(html: &str) -> Option<String> {
    DETAIL_IMAGE_PATTERN
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|url| !url.is_empty())
}

#[async_trait]
impl CoverProbe for DetailPageProbe {
    fn name(&self) -> &'static str {
        "ISBNSearch"
    }

    async fn attempt(&self, isbn: &str) -> Result<Option<String>, ProbeError> {
        let page_url = self.template.replace("{isbn}", isbn);

        let response = self
            .http_client
            .get(&page_url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ProbeError::Parse(e.to_string()))?;

        let candidate = match extract_detail_image(&html) {
            Some(url) => url,
            None => return Ok(None),
        };

        debug!(isbn = %isbn, candidate = %candidate, "Detail page cover candidate");

        if self.verifier.verify(&candidate).await {
            Ok(Some(candidate))
        } else {
            Ok(None)
        }
    }
}

// ============================================================================
// Image search
// ============================================================================

/// Exact-phrase image search
///
/// Candidates are filtered by the classifier only. No HEAD verification is
/// done for this source: an embedded `[url, w, h]` literal already describes
/// an indexed image.
pub struct ImageSearchProbe {
    http_client: Client,
    search_url: String,
    timeout: Option<Duration>,
}

impl ImageSearchProbe {
    pub fn new(http_client: Client, search_url: &str) -> Self {
        Self {
            http_client,
            search_url: search_url.to_string(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Decode JSON string escapes (`\u003d`, `\/`), falling back to the raw text
pub fn unescape_url(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", raw)).unwrap_or_else(|_| raw.to_string())
}

/// First classifier-approved image URL embedded in search result text
pub fn extract_search_image(body: &str) -> Option<String> {
    SEARCH_IMAGE_PATTERN
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape_url(m.as_str()))
        .find(|url| is_cover_photo(url))
}

#[async_trait]
impl CoverProbe for ImageSearchProbe {
    fn name(&self) -> &'static str {
        "Google Images"
    }

    async fn attempt(&self, isbn: &str) -> Result<Option<String>, ProbeError> {
        // Quoting forces an exact-phrase match on the identifier
        let query = format!("\"{}\"", isbn);

        let mut request = self
            .http_client
            .get(&self.search_url)
            .query(&[("q", query.as_str()), ("tbm", "isch")])
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT, HTML_ACCEPT);

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProbeError::Parse(e.to_string()))?;

        Ok(extract_search_image(&body))
    }
}
