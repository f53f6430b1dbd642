//! Cover discovery waterfall
//!
//! Probes run strictly in order; the first candidate wins and the rest never
//! run. Order encodes quality: curated catalogs, then the scraped detail page,
//! then marketplace links, then unconstrained image search. If every probe
//! comes up empty the placeholder image is returned, so discovery cannot fail.
//!
//! # Probes
//! 1. **Direct** - high-quality catalog template (verified)
//! 2. **Detail page** - scraped lookup page (verified)
//! 3. **Catalog** - secondary catalog template (verified)
//! 4. **Marketplace** - 10-character identifier template (verified)
//! 5. **Image search** - exact-phrase search, classifier only
//!
//! Each probe's failure is isolated: errors are logged and treated as "no
//! candidate".

pub mod classifier;
pub mod probes;
pub mod verifier;

pub use probes::{DetailPageProbe, ImageSearchProbe, MarketplaceProbe, TemplateProbe};
pub use verifier::{CoverVerifier, HeadVerifier};

use crate::config::CoverSources;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Browser user-agent for scraped sources that refuse bot clients
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Probe failure (always recoverable; the waterfall moves on)
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Request could not be sent or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Remote answered with a non-success status
    #[error("Unexpected status {0}")]
    Status(u16),

    /// Response body could not be read or understood
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        ProbeError::Network(e.to_string())
    }
}

/// One strategy for locating a cover image
///
/// # Example
/// ```rust,ignore
/// use shelf_bm::covers::{CoverProbe, ProbeError};
///
/// pub struct FixedProbe;
///
/// #[async_trait::async_trait]
/// impl CoverProbe for FixedProbe {
///     fn name(&self) -> &'static str { "Fixed" }
///
///     async fn attempt(&self, isbn: &str) -> Result<Option<String>, ProbeError> {
///         Ok(Some(format!("https://covers.example/{}.jpg", isbn)))
///     }
/// }
/// ```
#[async_trait]
pub trait CoverProbe: Send + Sync {
    /// Source name for logging
    fn name(&self) -> &'static str;

    /// Try this source for `isbn` (already cleaned)
    ///
    /// `Ok(None)` means the source had nothing usable.
    async fn attempt(&self, isbn: &str) -> Result<Option<String>, ProbeError>;
}

/// Ordered probe list with a guaranteed fallback
pub struct CoverWaterfall {
    probes: Vec<Arc<dyn CoverProbe>>,
    placeholder: String,
}

impl CoverWaterfall {
    pub fn new(probes: Vec<Arc<dyn CoverProbe>>, placeholder: impl Into<String>) -> Self {
        Self {
            probes,
            placeholder: placeholder.into(),
        }
    }

    /// The production chain, in quality order
    pub fn standard(http_client: Client, sources: &CoverSources) -> Self {
        let verifier: Arc<dyn CoverVerifier> = Arc::new(HeadVerifier::new(http_client.clone()));

        let probes: Vec<Arc<dyn CoverProbe>> = vec![
            Arc::new(TemplateProbe::new(
                "DirectTextbook",
                &sources.direct_template,
                Arc::clone(&verifier),
            )),
            Arc::new(DetailPageProbe::new(
                http_client.clone(),
                &sources.detail_page_template,
                Arc::clone(&verifier),
            )),
            Arc::new(TemplateProbe::new(
                "AbeBooks",
                &sources.catalog_template,
                Arc::clone(&verifier),
            )),
            Arc::new(MarketplaceProbe::new(
                &sources.marketplace_template,
                Arc::clone(&verifier),
            )),
            Arc::new(
                ImageSearchProbe::new(http_client, &sources.image_search_url)
                    .with_timeout(sources.image_search_timeout()),
            ),
        ];

        Self::new(probes, sources.placeholder_url.clone())
    }

    /// Run the probes in order and return the first candidate, else the placeholder
    pub async fn discover(&self, isbn: &str) -> String {
        info!(isbn = %isbn, "Searching for cover");

        for probe in &self.probes {
            let name = probe.name();
            match probe.attempt(isbn).await {
                Ok(Some(url)) => {
                    info!(isbn = %isbn, source = name, url = %url, "Cover found");
                    return url;
                }
                Ok(None) => {
                    debug!(isbn = %isbn, source = name, "No cover from source");
                }
                Err(e) => {
                    warn!(isbn = %isbn, source = name, error = %e, "Cover probe failed");
                }
            }
        }

        warn!(isbn = %isbn, "No cover found in any source, using placeholder");
        self.placeholder.clone()
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Get probe count
    pub fn count(&self) -> usize {
        self.probes.len()
    }
}

// ============================================================================
// Mock Probes for Testing
// ============================================================================
