// src/config.rs

//! Configuration loading utilities.
//!
//! This module provides convenience functions for loading the application
//! configuration and the saved queries from files.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::storage::QueryRegistry;

/// Load configuration from a TOML file.
///
/// A missing file falls back to defaults; a file that exists but fails to
/// parse is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::warn!("No config at {}, using default configuration.", path.display());
        return Ok(Config::default());
    }
    Config::load(path)
}

/// Load and validate the configuration, then open its saved queries file.
pub async fn load_all(config_path: &Path) -> Result<(Config, QueryRegistry)> {
    let config = load_config(config_path)?;
    config
        .validate()
        .map_err(|e| AppError::config(format!("Invalid config: {e}")))?;

    let registry = QueryRegistry::open(&config.watch.queries_file).await?;
    Ok((config, registry))
}
