//! # SHELF Common Library
//!
//! Shared code for SHELF microservices:
//! - Error and result types
//! - TOML bootstrap configuration loading

pub mod config;
pub mod error;

pub use error::{Error, Result};
