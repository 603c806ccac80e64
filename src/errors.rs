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

// Error taxonomy and the pluggable error handler

use thiserror::Error;
use tracing::debug;

/// Errors surfaced by the tracker and its sinks.
///
/// `IllegalParameter` is raised before any I/O happens. `Connection` wraps
/// transport-level failures (DNS, connect, handshake, timeout). `Server`
/// covers a reachable receiver that rejected the upload: non-200 status,
/// HTTP 200 with a non-zero response code, or an unparsable response body.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("illegal parameter: {0}")]
    IllegalParameter(String),

    #[error("could not connect to receiver: {0}")]
    Connection(String),

    #[error("receiver rejected data: {0}")]
    Server(String),
}

/// Handler for errors recovered at the verb boundary.
///
/// Every verb catches validation and sink errors, hands them to the handler
/// exactly once, and returns `false`. The tracker never inspects anything
/// the handler does, so an implementation is free to log, panic, or forward
/// the error elsewhere.
pub trait ErrorHandler: Send {
    fn handle(&self, error: &TrackerError);
}

/// Default handler: log at debug level and swallow.
pub struct SilentErrorHandler;

impl ErrorHandler for SilentErrorHandler {
    fn handle(&self, error: &TrackerError) {
        debug!("tracker error dropped: {}", error);
    }
}

/// Handler that logs every error at warn level.
pub struct LogErrorHandler;

impl ErrorHandler for LogErrorHandler {
    fn handle(&self, error: &TrackerError) {
        tracing::warn!("tracker error: {}", error);
    }
}
