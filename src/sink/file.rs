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

// Rotating JSON-lines file sink

use super::Sink;
use crate::errors::TrackerError;
use crate::record::Record;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// File rotation granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotateMode {
    #[default]
    Daily,
    Hourly,
}

impl RotateMode {
    fn suffix_pattern(self) -> &'static str {
        match self {
            RotateMode::Daily => "%Y-%m-%d",
            RotateMode::Hourly => "%Y-%m-%d-%H",
        }
    }
}

/// File sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileConfig {
    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub mode: RotateMode,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            prefix: default_prefix(),
            mode: RotateMode::Daily,
        }
    }
}

fn default_path() -> String {
    ".".to_string()
}
fn default_prefix() -> String {
    "events.log".to_string()
}

/// Writes one JSON object per line to `<path>/<prefix>.<suffix>` and
/// rotates to a new file whenever the time-bucketed suffix changes.
/// Pairs with an external log-shipping agent for durable delivery.
pub struct FileSink {
    base_path: PathBuf,
    prefix: String,
    mode: RotateMode,
    current_suffix: String,
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn new(config: FileConfig) -> Result<Self, TrackerError> {
        if config.prefix.is_empty() {
            return Err(TrackerError::IllegalParameter(
                "file prefix cannot be empty".to_string(),
            ));
        }

        let base_path = PathBuf::from(&config.path);
        let suffix = Local::now().format(config.mode.suffix_pattern()).to_string();
        let writer = Self::open(&base_path, &config.prefix, &suffix)?;

        info!("file sink ready. path: {}", base_path.display());
        Ok(Self {
            base_path,
            prefix: config.prefix,
            mode: config.mode,
            current_suffix: suffix,
            writer,
        })
    }

    fn open(base_path: &PathBuf, prefix: &str, suffix: &str) -> Result<BufWriter<File>, TrackerError> {
        std::fs::create_dir_all(base_path).map_err(|e| {
            TrackerError::Connection(format!(
                "could not create log directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let file_path = base_path.join(format!("{}.{}", prefix, suffix));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .map_err(|e| {
                TrackerError::Connection(format!(
                    "could not open log file {}: {}",
                    file_path.display(),
                    e
                ))
            })?;
        Ok(BufWriter::new(file))
    }

    fn rotate_if_needed(&mut self) -> Result<(), TrackerError> {
        let suffix = Local::now().format(self.mode.suffix_pattern()).to_string();
        if suffix != self.current_suffix {
            debug!("rotating log file to suffix {}", suffix);
            self.writer
                .flush()
                .map_err(|e| TrackerError::Connection(format!("could not flush log file: {}", e)))?;
            self.writer = Self::open(&self.base_path, &self.prefix, &suffix)?;
            self.current_suffix = suffix;
        }
        Ok(())
    }
}

impl Sink for FileSink {
    fn add(&mut self, record: Record) -> Result<(), TrackerError> {
        self.rotate_if_needed()?;
        let json = serde_json::to_string(&record).map_err(|e| {
            TrackerError::IllegalParameter(format!("could not serialize record: {}", e))
        })?;
        writeln!(self.writer, "{}", json)
            .map_err(|e| TrackerError::Connection(format!("could not write log file: {}", e)))
    }

    fn flush(&mut self) -> Result<(), TrackerError> {
        self.writer
            .flush()
            .map_err(|e| TrackerError::Connection(format!("could not flush log file: {}", e)))
    }

    fn close(&mut self) -> Result<(), TrackerError> {
        self.flush()
    }
}
