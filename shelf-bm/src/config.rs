//! Configuration resolution for shelf-bm
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments / environment variables (via clap)
//! 2. TOML bootstrap file (`<config dir>/shelf/shelf-bm.toml` or `--config`)
//! 3. Built-in defaults
//!
//! The provider API key has no default. Startup fails if it is missing.

use serde::Deserialize;
use shelf_common::{Error, Result};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LOG_FILTER: &str = "shelf_bm=info,tower_http=info";

/// Cover source endpoints, in waterfall order
///
/// Templates use `{isbn}` (cleaned identifier) or `{isbn10}` (10-character form).
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoverSources {
    pub direct_template: String,
    pub detail_page_template: String,
    pub catalog_template: String,
    pub marketplace_template: String,
    pub image_search_url: String,
    /// Image search timeout in seconds (0 disables the per-request timeout)
    pub image_search_timeout_secs: u64,
    pub placeholder_url: String,
}

impl Default for CoverSources {
    fn default() -> Self {
        Self {
            direct_template: "https://www.directtextbook.com/large/{isbn}.webp".to_string(),
            detail_page_template: "https://isbnsearch.org/isbn/{isbn}".to_string(),
            catalog_template: "https://pictures.abebooks.com/isbn/{isbn}-us-300.jpg".to_string(),
            marketplace_template: "http://images.amazon.com/images/P/{isbn10}.01.LZZZZZZZ.jpg"
                .to_string(),
            image_search_url: "https://www.google.com/search".to_string(),
            image_search_timeout_secs: 10,
            placeholder_url:
                "https://cdn.vectorstock.com/i/500p/33/47/no-photo-available-icon-vector-40343347.jpg"
                    .to_string(),
        }
    }
}

impl CoverSources {
    pub fn image_search_timeout(&self) -> Option<Duration> {
        match self.image_search_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Filter directive (e.g. `info`, `shelf_bm=debug`); `RUST_LOG` wins when set
    #[serde(default)]
    pub level: Option<String>,
}

/// Bootstrap configuration loaded from TOML
///
/// Every field is optional so a partial file only overrides what it names.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
    pub covers: CoverSources,
    pub logging: LoggingConfig,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
}

/// Metadata provider settings
#[derive(Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub provider: ProviderSettings,
    pub covers: CoverSources,
    pub log_filter: String,
}

impl ServiceConfig {
    /// Merge CLI/env overrides over the TOML file over defaults
    pub fn resolve(cli: CliOverrides, toml: TomlConfig) -> Result<Self> {
        let api_key = cli
            .openai_api_key
            .filter(|k| is_valid_key(k))
            .or_else(|| toml.openai_api_key.filter(|k| is_valid_key(k)))
            .ok_or_else(|| {
                Error::Config(
                    "OpenAI API key not configured. Provide one of:\n\
                     1. Environment: OPENAI_API_KEY=your-key\n\
                     2. Command line: --openai-api-key your-key\n\
                     3. TOML config: ~/.config/shelf/shelf-bm.toml (openai_api_key = \"your-key\")"
                        .to_string(),
                )
            })?;

        let base_url = toml
            .openai_base_url
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            host: cli
                .host
                .or(toml.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            provider: ProviderSettings {
                api_key: api_key.trim().to_string(),
                model: cli
                    .openai_model
                    .or(toml.openai_model)
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url,
            },
            covers: toml.covers,
            log_filter: toml
                .logging
                .level
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
