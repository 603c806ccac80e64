// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Configuration types for the tracker binary

use crate::sink::{BatchConfig, DebugConfig, FileConfig};
use crate::tracker::TrackerConfig;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub sink: SinkConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sink configuration with backend selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SinkConfig {
    /// Backend type: "batch", "debug", "file"
    pub backend: String,

    /// Backend-specific configuration
    #[serde(flatten)]
    pub backend_config: SinkBackendConfig,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
            backend_config: SinkBackendConfig::File {
                file: FileConfig::default(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SinkBackendConfig {
    Batch {
        #[serde(rename = "batch")]
        batch: BatchConfig,
    },
    Debug {
        #[serde(rename = "debug")]
        debug: DebugConfig,
    },
    File {
        #[serde(rename = "file")]
        file: FileConfig,
    },
}

impl SinkBackendConfig {
    pub fn as_batch(&self) -> Option<&BatchConfig> {
        match self {
            SinkBackendConfig::Batch { batch } => Some(batch),
            _ => None,
        }
    }

    pub fn as_batch_mut(&mut self) -> Option<&mut BatchConfig> {
        match self {
            SinkBackendConfig::Batch { batch } => Some(batch),
            _ => None,
        }
    }

    pub fn as_debug(&self) -> Option<&DebugConfig> {
        match self {
            SinkBackendConfig::Debug { debug } => Some(debug),
            _ => None,
        }
    }

    pub fn as_debug_mut(&mut self) -> Option<&mut DebugConfig> {
        match self {
            SinkBackendConfig::Debug { debug } => Some(debug),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileConfig> {
        match self {
            SinkBackendConfig::File { file } => Some(file),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"

    #[serde(default = "default_log_format")]
    pub format: String, // "text", "json"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}
