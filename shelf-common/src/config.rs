//! Bootstrap configuration file loading
//!
//! Each SHELF module may read an optional TOML file at startup. Lookup order:
//! 1. Explicit path (command-line argument or environment variable)
//! 2. User config directory: `<config dir>/shelf/<module>.toml`
//! 3. System config (Linux only): `/etc/shelf/<module>.toml`
//! 4. None found: built-in defaults (`T::default()`)
//!
//! An explicit path that does not exist is an error; a missing default file is not.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A parsed bootstrap config plus the file it came from (if any)
#[derive(Debug, Clone)]
pub struct LoadedConfig<T> {
    pub config: T,
    pub source: Option<PathBuf>,
}

/// Load the TOML bootstrap config for `module_name`
pub fn load_toml_config<T>(explicit: Option<&Path>, module_name: &str) -> Result<LoadedConfig<T>>
where
    T: DeserializeOwned + Default,
{
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config = read_toml_file(path)?;
        info!("Loaded configuration from {}", path.display());
        return Ok(LoadedConfig {
            config,
            source: Some(path.to_path_buf()),
        });
    }

    for candidate in default_config_paths(module_name) {
        if candidate.exists() {
            let config = read_toml_file(&candidate)?;
            info!("Loaded configuration from {}", candidate.display());
            return Ok(LoadedConfig {
                config,
                source: Some(candidate),
            });
        }
        debug!("No config file at {}", candidate.display());
    }

    Ok(LoadedConfig {
        config: T::default(),
        source: None,
    })
}

/// Parse a single TOML file into `T`
pub fn read_toml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Candidate default locations, highest priority first
pub fn default_config_paths(module_name: &str) -> Vec<PathBuf> {
    let file_name = format!("{}.toml", module_name);
    let mut paths = Vec::new();

    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("shelf").join(&file_name));
    }

    if cfg!(target_os = "linux") {
        paths.push(PathBuf::from("/etc/shelf").join(&file_name));
    }

    paths
}
