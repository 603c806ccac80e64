// Configuration module for analytics-tracker
//
// Provides:
// - YAML configuration file loading
// - Environment variable substitution
// - Configuration validation
// - Default values

pub mod types;
mod loader;

pub use loader::ConfigLoader;
pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    ConfigLoader::load(path).context("Failed to load configuration")
}

/// Load configuration with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let mut config = load_config(path)?;

    // Allow environment variables to override config values
    if let Ok(server_url) = std::env::var("TRACKER_SERVER_URL") {
        if let Some(batch) = config.sink.backend_config.as_batch_mut() {
            batch.server_url = server_url.clone();
        }
        if let Some(debug) = config.sink.backend_config.as_debug_mut() {
            debug.server_url = server_url;
        }
    }

    if let Ok(app_id) = std::env::var("TRACKER_APP_ID") {
        if let Some(batch) = config.sink.backend_config.as_batch_mut() {
            batch.app_id = app_id.clone();
        }
        if let Some(debug) = config.sink.backend_config.as_debug_mut() {
            debug.app_id = app_id;
        }
    }

    Ok(config)
}
