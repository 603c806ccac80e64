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

// Wire-level record types

use crate::time_format::format_time;
use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Verb tag carried in the `#type` field of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventType {
    #[serde(rename = "track")]
    Track,
    #[serde(rename = "track_update")]
    TrackUpdate,
    #[serde(rename = "track_overwrite")]
    TrackOverwrite,
    #[serde(rename = "user_set")]
    UserSet,
    #[serde(rename = "user_setOnce")]
    UserSetOnce,
    #[serde(rename = "user_add")]
    UserAdd,
    #[serde(rename = "user_unset")]
    UserUnset,
    #[serde(rename = "user_append")]
    UserAppend,
    #[serde(rename = "user_uniq_append")]
    UserUniqAppend,
    #[serde(rename = "user_del")]
    UserDel,
}

impl EventType {
    /// True for the event-reporting verbs that receive the merged
    /// super/dynamic property layers.
    pub fn is_track(self) -> bool {
        matches!(
            self,
            EventType::Track | EventType::TrackUpdate | EventType::TrackOverwrite
        )
    }
}

/// Closed value union for property maps.
///
/// Lists may hold scalars only; the validator rejects nested lists.
/// `Timestamp` never reaches the wire: normalization rewrites it to the
/// canonical formatted string before a record leaves the builder.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Timestamp(DateTime<FixedOffset>),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn is_numeric(&self) -> bool {
        matches!(self, PropertyValue::Int(_) | PropertyValue::Float(_))
    }

    /// Copy with every embedded timestamp rewritten to its canonical
    /// string form, including elements inside lists.
    pub fn normalized(&self) -> PropertyValue {
        match self {
            PropertyValue::Timestamp(t) => PropertyValue::String(format_time(t)),
            PropertyValue::List(items) => {
                PropertyValue::List(items.iter().map(PropertyValue::normalized).collect())
            }
            other => other.clone(),
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropertyValue::Int(v) => serializer.serialize_i64(*v),
            PropertyValue::Float(v) => serializer.serialize_f64(*v),
            PropertyValue::Bool(v) => serializer.serialize_bool(*v),
            PropertyValue::String(v) => serializer.serialize_str(v),
            PropertyValue::Timestamp(t) => serializer.serialize_str(&format_time(t)),
            PropertyValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(v as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

impl From<DateTime<FixedOffset>> for PropertyValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        PropertyValue::Timestamp(v)
    }
}

impl From<DateTime<Local>> for PropertyValue {
    fn from(v: DateTime<Local>) -> Self {
        PropertyValue::Timestamp(v.fixed_offset())
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(v: DateTime<Utc>) -> Self {
        PropertyValue::Timestamp(v.fixed_offset())
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(v: Vec<T>) -> Self {
        PropertyValue::List(v.into_iter().map(Into::into).collect())
    }
}

/// Property bag attached to a record.
pub type Properties = HashMap<String, PropertyValue>;

/// A single tracked record in its wire shape.
///
/// Reserved keys live at the top level; everything else stays under
/// `properties`. Immutable once handed to a sink.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    #[serde(rename = "#type")]
    pub event_type: EventType,

    #[serde(rename = "#time")]
    pub time: String,

    #[serde(rename = "#event_name", skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,

    #[serde(rename = "#event_id", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    #[serde(rename = "#account_id", skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    #[serde(rename = "#distinct_id", skip_serializing_if = "Option::is_none")]
    pub distinct_id: Option<String>,

    #[serde(rename = "#ip", skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(rename = "#uuid", skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(rename = "#first_check_id", skip_serializing_if = "Option::is_none")]
    pub first_check_id: Option<String>,

    #[serde(rename = "#app_id", skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,

    pub properties: Properties,
}
