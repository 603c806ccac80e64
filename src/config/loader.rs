// Configuration loader with environment variable substitution

use super::types::*;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        // Substitute environment variables
        let content = Self::substitute_env_vars(&content);

        // Parse YAML
        let config: AppConfig =
            serde_yaml::from_str(&content).context("Failed to parse YAML configuration")?;

        // Validate configuration
        Self::validate(&config)?;

        Ok(config)
    }

    /// Substitute ${VAR} and ${VAR:-default} patterns with environment variables
    ///
    /// Examples:
    /// - ${HOME} -> /home/user
    /// - ${APP_ID:-demo-app} -> demo-app (if APP_ID not set)
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}:]+)(?::-([^}]+))?\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str());

            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if let Some(default) = default_value {
                        default.to_string()
                    } else {
                        // Keep original if no default and var not found
                        format!("${{{}}}", var_name)
                    }
                }
            }
        })
        .to_string()
    }

    /// Validate configuration
    fn validate(config: &AppConfig) -> Result<()> {
        match config.sink.backend.as_str() {
            "batch" => {
                let Some(batch) = config.sink.backend_config.as_batch() else {
                    bail!("batch backend selected but batch config missing");
                };
                if batch.app_id.is_empty() {
                    bail!("batch.app_id cannot be empty");
                }
                if batch.max_buffer_length == 0 {
                    bail!("batch.max_buffer_length must be > 0");
                }
                if batch.timeout_seconds == 0 {
                    bail!("batch.timeout_seconds must be > 0");
                }
            }
            "debug" => {
                let Some(debug) = config.sink.backend_config.as_debug() else {
                    bail!("debug backend selected but debug config missing");
                };
                if debug.app_id.is_empty() {
                    bail!("debug.app_id cannot be empty");
                }
            }
            "file" => {
                let Some(file) = config.sink.backend_config.as_file() else {
                    bail!("file backend selected but file config missing");
                };
                if file.prefix.is_empty() {
                    bail!("file.prefix cannot be empty");
                }
            }
            unknown => bail!(
                "Unknown backend: '{}'. Supported: batch, debug, file",
                unknown
            ),
        }

        Ok(())
    }
}
