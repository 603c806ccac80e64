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

// Canonical timestamp formatting

use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Pattern used for every timestamp on the wire.
pub const TIME_PATTERN: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS.mmm`.
///
/// Milliseconds are truncated, not rounded, so repeated format/parse cycles
/// are idempotent.
pub fn format_time(time: &DateTime<FixedOffset>) -> String {
    time.format(TIME_PATTERN).to_string()
}

/// Parse a string produced by [`format_time`] back into a wall-clock time.
pub fn parse_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIME_PATTERN).ok()
}

/// UTC offset of the timestamp's zone, in hours, for `#zone_offset`.
pub fn utc_offset_hours(time: &DateTime<FixedOffset>) -> f64 {
    f64::from(time.offset().local_minus_utc()) / 3600.0
}
