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

// Delivery sink module
//
// Provides a trait-based abstraction over record destinations, allowing
// the tracker to hand built records to different delivery paths
// (batched HTTP upload, per-record debug upload, local rotating files).

pub mod batch;
pub mod debug;
pub mod factory;
pub mod file;

pub use batch::{BatchConfig, BatchSink, HttpTransport, Transport};
pub use debug::{DebugConfig, DebugSink};
pub use factory::SinkFactory;
pub use file::{FileConfig, FileSink, RotateMode};

use crate::errors::TrackerError;
use crate::record::Record;

/// Destination for built records.
///
/// `flush` and `close` are optional capabilities: the default
/// implementations succeed without doing anything, so sinks without
/// buffering only implement `add`.
pub trait Sink: Send {
    /// Accept one record for delivery. May perform I/O immediately
    /// (debug, file) or buffer until a threshold is crossed (batch).
    fn add(&mut self, record: Record) -> Result<(), TrackerError>;

    /// Push any buffered records to their destination.
    fn flush(&mut self) -> Result<(), TrackerError> {
        Ok(())
    }

    /// Release resources before shutdown, flushing first where relevant.
    fn close(&mut self) -> Result<(), TrackerError> {
        Ok(())
    }
}
