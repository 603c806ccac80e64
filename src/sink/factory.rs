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

// Sink factory for creating delivery sinks from configuration

use super::batch::BatchSink;
use super::debug::DebugSink;
use super::file::FileSink;
use super::Sink;
use crate::config::SinkConfig;
use anyhow::{bail, Result};

pub struct SinkFactory;

impl SinkFactory {
    /// Create a delivery sink from configuration
    pub fn create(config: &SinkConfig) -> Result<Box<dyn Sink>> {
        match config.backend.as_str() {
            "batch" => {
                let backend_config = config
                    .backend_config
                    .as_batch()
                    .ok_or_else(|| anyhow::anyhow!("batch config missing"))?;

                let sink = BatchSink::new(backend_config.clone())?;
                Ok(Box::new(sink))
            }

            "debug" => {
                let backend_config = config
                    .backend_config
                    .as_debug()
                    .ok_or_else(|| anyhow::anyhow!("debug config missing"))?;

                let sink = DebugSink::new(backend_config.clone())?;
                Ok(Box::new(sink))
            }

            "file" => {
                let backend_config = config
                    .backend_config
                    .as_file()
                    .ok_or_else(|| anyhow::anyhow!("file config missing"))?;

                let sink = FileSink::new(backend_config.clone())?;
                Ok(Box::new(sink))
            }

            unknown => bail!(
                "Unknown sink backend: '{}'. Supported: batch, debug, file",
                unknown
            ),
        }
    }
}
