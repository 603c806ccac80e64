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

// Buffered batch upload sink

use super::Sink;
use crate::errors::TrackerError;
use crate::record::Record;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

/// Buffer length used when the config does not set one.
pub const DEFAULT_BUFFER_LENGTH: usize = 20;

/// Hard cap on the configured buffer length.
pub const MAX_BUFFER_LENGTH: usize = 2000;

const UPLOAD_PATH: &str = "/sync_server";
const INTEGRATION_TYPE: &str = "rust";
const INTEGRATION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Batch sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    pub server_url: String,
    pub app_id: String,

    #[serde(default = "default_buffer_length")]
    pub max_buffer_length: usize,

    /// Gzip chunk bodies (default on).
    #[serde(default = "default_compress")]
    pub compress: bool,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Keep buffered records when a flush fails instead of dropping them.
    /// Off by default: a failed flush clears the buffer, matching the
    /// at-most-once delivery attempt of the upstream protocol.
    #[serde(default)]
    pub retain_on_failure: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8991".to_string(),
            app_id: String::new(),
            max_buffer_length: default_buffer_length(),
            compress: default_compress(),
            timeout_seconds: default_timeout(),
            retain_on_failure: false,
        }
    }
}

fn default_buffer_length() -> usize {
    DEFAULT_BUFFER_LENGTH
}
fn default_compress() -> bool {
    true
}
fn default_timeout() -> u64 {
    10
}

/// One POST per chunk, abstracted so tests can substitute the wire.
pub trait Transport: Send {
    /// Post `body` with the given headers; returns status code and body.
    /// Transport-level failures map to [`TrackerError::Connection`].
    fn post(
        &self,
        body: Vec<u8>,
        headers: &[(&'static str, String)],
    ) -> Result<(u16, String), TrackerError>;
}

/// Production transport over a blocking reqwest client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    url: reqwest::Url,
}

impl HttpTransport {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, TrackerError> {
        let mut url = reqwest::Url::parse(server_url)
            .map_err(|e| TrackerError::IllegalParameter(format!("invalid server url: {}", e)))?;
        url.set_path(UPLOAD_PATH);

        let client = reqwest::blocking::ClientBuilder::new()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::Connection(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, url })
    }
}

impl Transport for HttpTransport {
    fn post(
        &self,
        body: Vec<u8>,
        headers: &[(&'static str, String)],
    ) -> Result<(u16, String), TrackerError> {
        let mut request = self.client.post(self.url.clone()).body(body);
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        let response = request.send().map_err(|e| {
            TrackerError::Connection(format!("could not connect to receiver: {}", e))
        })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| {
            TrackerError::Connection(format!("could not read receiver response: {}", e))
        })?;
        Ok((status, body))
    }
}

/// Buffers records in memory and uploads them in fixed-size chunks.
///
/// Flush is purely size-triggered (inside `add`) or caller-triggered; there
/// is no background timer. The whole buffer is drained by one flush: it is
/// partitioned into chunks of at most `max_buffer_length` records, each
/// posted as one gzip-compressed JSON array. A chunk failure aborts the
/// remaining chunks. Unless `retain_on_failure` is set the buffer is
/// cleared no matter how the flush ended; with it set, chunks the receiver
/// already accepted are dropped and only the rest is kept for retry.
pub struct BatchSink {
    app_id: String,
    max_length: usize,
    compress: bool,
    retain_on_failure: bool,
    buffers: Vec<Record>,
    transport: Box<dyn Transport>,
}

impl BatchSink {
    pub fn new(config: BatchConfig) -> Result<Self, TrackerError> {
        let transport = HttpTransport::new(
            &config.server_url,
            Duration::from_secs(config.timeout_seconds),
        )?;
        info!(
            "batch sink ready. server_url: {}, app_id: {}",
            config.server_url, config.app_id
        );
        Ok(Self::with_transport(config, Box::new(transport)))
    }

    /// Build a sink over a caller-supplied transport.
    pub fn with_transport(config: BatchConfig, transport: Box<dyn Transport>) -> Self {
        let max_length = config.max_buffer_length.min(MAX_BUFFER_LENGTH).max(1);
        Self {
            app_id: config.app_id,
            max_length,
            compress: config.compress,
            retain_on_failure: config.retain_on_failure,
            buffers: Vec::new(),
            transport,
        }
    }

    pub fn set_compress(&mut self, compress: bool) {
        self.compress = compress;
    }

    pub fn buffer_len(&self) -> usize {
        self.buffers.len()
    }

    pub fn max_buffer_length(&self) -> usize {
        self.max_length
    }

    fn post_chunk(&self, chunk: &[Record]) -> Result<(), TrackerError> {
        let json = serde_json::to_vec(chunk).map_err(|e| {
            TrackerError::IllegalParameter(format!("could not serialize chunk: {}", e))
        })?;

        let payload = if self.compress {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder
                .write_all(&json)
                .and_then(|_| encoder.finish())
                .map_err(|e| TrackerError::Connection(format!("gzip compression failed: {}", e)))?
        } else {
            json
        };

        let headers = [
            ("Content-Type", "application/plaintext".to_string()),
            ("appid", self.app_id.clone()),
            (
                "compress",
                if self.compress { "gzip" } else { "none" }.to_string(),
            ),
            ("TE-Integration-Type", INTEGRATION_TYPE.to_string()),
            ("TE-Integration-Version", INTEGRATION_VERSION.to_string()),
            ("TE-Integration-Count", chunk.len().to_string()),
            ("TE-Integration-Extra", "batch".to_string()),
        ];

        debug!("posting chunk of {} records", chunk.len());
        let (status, body) = self.transport.post(payload, &headers)?;

        if status == 200 {
            let parsed: serde_json::Value = serde_json::from_str(&body).map_err(|_| {
                TrackerError::Server(format!("could not interpret receiver response: '{}'", body))
            })?;
            if parsed.get("code").and_then(serde_json::Value::as_i64) == Some(0) {
                debug!("chunk accepted");
                return Ok(());
            }
        }

        Err(TrackerError::Server(format!(
            "receiver responded with {} returning: '{}'",
            status, body
        )))
    }
}

impl Sink for BatchSink {
    fn add(&mut self, record: Record) -> Result<(), TrackerError> {
        self.buffers.push(record);
        debug!("record buffered. buffer size: {}", self.buffers.len());
        if self.buffers.len() >= self.max_length {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TrackerError> {
        debug!("flushing {} buffered records", self.buffers.len());

        let mut posted = 0;
        let mut outcome = Ok(());
        for chunk in self.buffers.chunks(self.max_length) {
            match self.post_chunk(chunk) {
                Ok(()) => posted += chunk.len(),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        if outcome.is_ok() || !self.retain_on_failure {
            self.buffers.clear();
        } else {
            // Accepted chunks must not be re-sent on the next attempt.
            self.buffers.drain(..posted);
        }
        outcome
    }

    fn close(&mut self) -> Result<(), TrackerError> {
        self.flush()
    }
}
