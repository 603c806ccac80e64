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

// Synchronous analytics event tracker with pluggable delivery sinks
//
// This is a lightweight client library that:
// - Validates event and user-profile records against schema rules
// - Merges library, session, dynamic, and call-site properties
// - Canonicalizes timestamps and stamps UUIDs
// - Delivers records through batched HTTP upload, per-record debug
//   upload, or rotating local JSON-lines files

pub mod config;
pub mod errors;
pub mod record;
pub mod sink;
pub mod time_format;
pub mod tracker;
pub mod validate;

// Re-export main types
pub use config::{load_config, load_config_with_env, AppConfig};
pub use errors::{ErrorHandler, LogErrorHandler, SilentErrorHandler, TrackerError};
pub use record::{EventType, Properties, PropertyValue, Record};
pub use sink::{
    BatchConfig, BatchSink, DebugConfig, DebugSink, FileConfig, FileSink, RotateMode, Sink,
    SinkFactory, Transport,
};
pub use time_format::{format_time, parse_time, utc_offset_hours};
pub use tracker::{RecordOptions, Tracker, TrackerConfig};
pub use validate::PropertyValidator;
