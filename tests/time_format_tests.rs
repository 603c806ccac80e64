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

use analytics_tracker::time_format::{format_time, parse_time, utc_offset_hours};
use chrono::{FixedOffset, TimeZone, Timelike};

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

#[test]
fn test_format_pattern() {
    let time = utc().with_ymd_and_hms(2019, 10, 26, 2, 26, 12).unwrap();
    assert_eq!(format_time(&time), "2019-10-26 02:26:12.000");
}

#[test]
fn test_milliseconds_truncated_not_rounded() {
    let time = utc()
        .with_ymd_and_hms(2019, 10, 26, 2, 26, 12)
        .unwrap()
        .with_nanosecond(123_999_999)
        .unwrap();
    assert_eq!(format_time(&time), "2019-10-26 02:26:12.123");
}

#[test]
fn test_milliseconds_zero_padded() {
    let time = utc()
        .with_ymd_and_hms(2019, 10, 26, 2, 26, 12)
        .unwrap()
        .with_nanosecond(7_000_000)
        .unwrap();
    assert_eq!(format_time(&time), "2019-10-26 02:26:12.007");
}

#[test]
fn test_format_uses_wall_clock_of_offset() {
    let offset = FixedOffset::east_opt(8 * 3600).unwrap();
    let time = offset.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
    assert_eq!(format_time(&time), "2025-03-14 15:09:26.000");
}

#[test]
fn test_round_trip_is_idempotent() {
    let time = utc()
        .with_ymd_and_hms(2023, 1, 2, 3, 4, 5)
        .unwrap()
        .with_nanosecond(678_901_234)
        .unwrap();
    let formatted = format_time(&time);
    let parsed = parse_time(&formatted).unwrap();
    let reformatted = parsed.format("%Y-%m-%d %H:%M:%S%.3f").to_string();
    assert_eq!(formatted, reformatted);
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(parse_time("not a time").is_none());
}

#[test]
fn test_utc_offset_hours() {
    let time = utc().with_ymd_and_hms(2019, 10, 26, 2, 26, 12).unwrap();
    assert_eq!(utc_offset_hours(&time), 0.0);

    let kathmandu = FixedOffset::east_opt(5 * 3600 + 45 * 60).unwrap();
    let time = kathmandu.with_ymd_and_hms(2019, 10, 26, 2, 26, 12).unwrap();
    assert_eq!(utc_offset_hours(&time), 5.75);

    let pacific = FixedOffset::west_opt(8 * 3600).unwrap();
    let time = pacific.with_ymd_and_hms(2019, 10, 26, 2, 26, 12).unwrap();
    assert_eq!(utc_offset_hours(&time), -8.0);
}
