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

// Per-record debug upload sink

use super::Sink;
use crate::errors::TrackerError;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const DEBUG_PATH: &str = "/data_debug";

/// Debug sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebugConfig {
    pub server_url: String,
    pub app_id: String,

    /// When false the receiver validates the record but does not store it.
    #[serde(default = "default_write_data")]
    pub write_data: bool,

    #[serde(default)]
    pub device_id: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_write_data() -> bool {
    true
}
fn default_timeout() -> u64 {
    10
}

/// Posts every record on its own, synchronously, and surfaces the
/// receiver's per-record validation verdict. Meant for integration
/// debugging, not production volume; there is no buffering, so the
/// default no-op `flush`/`close` apply.
pub struct DebugSink {
    client: reqwest::blocking::Client,
    url: reqwest::Url,
    app_id: String,
    write_data: bool,
    device_id: Option<String>,
}

impl DebugSink {
    pub fn new(config: DebugConfig) -> Result<Self, TrackerError> {
        let mut url = reqwest::Url::parse(&config.server_url)
            .map_err(|e| TrackerError::IllegalParameter(format!("invalid server url: {}", e)))?;
        url.set_path(DEBUG_PATH);

        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = reqwest::blocking::ClientBuilder::new()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::Connection(format!("failed to build HTTP client: {}", e)))?;

        info!(
            "debug sink ready. server_url: {}, app_id: {}, device_id: {:?}",
            config.server_url, config.app_id, config.device_id
        );
        Ok(Self {
            client,
            url,
            app_id: config.app_id,
            write_data: config.write_data,
            device_id: config.device_id,
        })
    }

    fn form_fields(&self, record_json: String) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("data", record_json),
            ("appid", self.app_id.clone()),
            (
                "dryRun",
                if self.write_data { "0" } else { "1" }.to_string(),
            ),
            ("source", "server".to_string()),
        ];
        if let Some(device_id) = &self.device_id {
            fields.push(("deviceId", device_id.clone()));
        }
        fields
    }
}

impl Sink for DebugSink {
    fn add(&mut self, record: Record) -> Result<(), TrackerError> {
        let json = serde_json::to_string(&record).map_err(|e| {
            TrackerError::IllegalParameter(format!("could not serialize record: {}", e))
        })?;
        debug!("posting debug record: {}", json);

        let response = self
            .client
            .post(self.url.clone())
            .header("TE-Integration-Type", "rust")
            .header("TE-Integration-Version", env!("CARGO_PKG_VERSION"))
            .header("TE-Integration-Count", "1")
            .header("TE-Integration-Extra", "debug")
            .form(&self.form_fields(json))
            .send()
            .map_err(|e| {
                TrackerError::Connection(format!("could not connect to receiver: {}", e))
            })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| {
            TrackerError::Connection(format!("could not read receiver response: {}", e))
        })?;

        if status == 200 {
            let parsed: serde_json::Value = serde_json::from_str(&body).map_err(|_| {
                TrackerError::Server(format!("could not interpret receiver response: '{}'", body))
            })?;
            if parsed.get("errorLevel").and_then(serde_json::Value::as_i64) == Some(0) {
                debug!("debug record accepted");
                return Ok(());
            }
        }

        Err(TrackerError::Server(format!(
            "receiver responded with {} returning: '{}'",
            status, body
        )))
    }
}
