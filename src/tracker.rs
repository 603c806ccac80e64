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

// Tracker facade: validation, record building, and sink dispatch

use crate::errors::{ErrorHandler, SilentErrorHandler, TrackerError};
use crate::record::{EventType, Properties, PropertyValue, Record};
use crate::sink::Sink;
use crate::time_format::{format_time, utc_offset_hours};
use crate::validate::PropertyValidator;
use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

const LIB_NAME: &str = "rust";
const LIB_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tracker construction options.
///
/// Replaces the original process-global toggles: validation and enrichment
/// behavior is fixed per tracker instance at construction time.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Enable local schema validation.
    #[serde(default)]
    pub stringent: bool,

    /// Legacy strict rules: name pattern and id length limits.
    #[serde(default)]
    pub strict: bool,

    /// Stamp a random `#uuid` on every record that has none.
    #[serde(default)]
    pub auto_uuid: bool,

    /// Inject `#zone_offset` into tracked events (legacy behavior).
    #[serde(default)]
    pub zone_offset: bool,
}

/// Per-call options shared by all verbs.
///
/// `distinct_id` and `account_id` identify the subject; at least one must
/// be present under stringent validation. `time` overrides the stamped
/// timestamp, `ip` lets the receiver resolve a location, and
/// `skip_local_check` bypasses the property-bag check for the
/// event-reporting verbs.
#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    pub distinct_id: Option<String>,
    pub account_id: Option<String>,
    pub time: Option<DateTime<FixedOffset>>,
    pub ip: Option<String>,
    pub first_check_id: Option<String>,
    pub skip_local_check: bool,
}

/// Facade over validation, record building, and sink dispatch.
///
/// Every verb is synchronous on the caller's thread and returns `true` on
/// success. Failures (validation, transport, server) are routed to the
/// error handler exactly once and turn into a `false` return; a failed
/// validation never reaches the sink.
pub struct Tracker {
    sink: Box<dyn Sink>,
    error_handler: Box<dyn ErrorHandler>,
    validator: PropertyValidator,
    super_properties: Properties,
    dynamic_properties: Option<Box<dyn Fn() -> Properties + Send>>,
    auto_uuid: bool,
    zone_offset: bool,
}

impl Tracker {
    pub fn new(sink: Box<dyn Sink>, config: TrackerConfig) -> Self {
        Self::with_error_handler(sink, config, Box::new(SilentErrorHandler))
    }

    pub fn with_error_handler(
        sink: Box<dyn Sink>,
        config: TrackerConfig,
        error_handler: Box<dyn ErrorHandler>,
    ) -> Self {
        info!("tracker init. config: {:?}", config);
        Self {
            sink,
            error_handler,
            validator: PropertyValidator::new(config.stringent, config.strict),
            super_properties: Properties::new(),
            dynamic_properties: None,
            auto_uuid: config.auto_uuid,
            zone_offset: config.zone_offset,
        }
    }

    /// Merge properties into the session-scoped set attached to every
    /// tracked event. Last write wins per key.
    pub fn set_super_properties(&mut self, properties: Properties, skip_local_check: bool) -> bool {
        if !skip_local_check {
            if let Err(_e) = self
                .validator
                .check_properties(EventType::Track, &properties)
            {
                self.error_handler.handle(&TrackerError::IllegalParameter(
                    "invalid super properties".to_string(),
                ));
                return false;
            }
        }
        for (key, value) in properties {
            self.super_properties.insert(key, value.normalized());
        }
        true
    }

    pub fn clear_super_properties(&mut self) {
        self.super_properties.clear();
    }

    pub fn super_properties(&self) -> &Properties {
        &self.super_properties
    }

    /// Install a provider invoked fresh for every tracked event; its
    /// output merges above super-properties and below call-site ones.
    pub fn set_dynamic_properties<F>(&mut self, provider: F)
    where
        F: Fn() -> Properties + Send + 'static,
    {
        self.dynamic_properties = Some(Box::new(provider));
    }

    pub fn clear_dynamic_properties(&mut self) {
        self.dynamic_properties = None;
    }

    /// Report an ordinary event.
    pub fn track(&mut self, event_name: &str, properties: Properties, opts: RecordOptions) -> bool {
        if let Err(e) = self.validate_event(EventType::Track, event_name, None, &properties, &opts)
        {
            self.error_handler.handle(&e);
            return false;
        }
        self.submit(
            EventType::Track,
            Some(event_name.to_string()),
            None,
            properties,
            opts,
        )
    }

    /// Report an updatable event; `event_id` is the correlation key the
    /// receiver uses to merge later corrections into the original event.
    pub fn track_update(
        &mut self,
        event_name: &str,
        event_id: &str,
        properties: Properties,
        opts: RecordOptions,
    ) -> bool {
        if let Err(e) = self.validate_event(
            EventType::TrackUpdate,
            event_name,
            Some(event_id),
            &properties,
            &opts,
        ) {
            self.error_handler.handle(&e);
            return false;
        }
        self.submit(
            EventType::TrackUpdate,
            Some(event_name.to_string()),
            Some(event_id.to_string()),
            properties,
            opts,
        )
    }

    /// Report an overwritable event; the receiver replaces the event with
    /// the same `event_id` wholesale.
    pub fn track_overwrite(
        &mut self,
        event_name: &str,
        event_id: &str,
        properties: Properties,
        opts: RecordOptions,
    ) -> bool {
        if let Err(e) = self.validate_event(
            EventType::TrackOverwrite,
            event_name,
            Some(event_id),
            &properties,
            &opts,
        ) {
            self.error_handler.handle(&e);
            return false;
        }
        self.submit(
            EventType::TrackOverwrite,
            Some(event_name.to_string()),
            Some(event_id.to_string()),
            properties,
            opts,
        )
    }

    /// Set user properties, overwriting existing values.
    pub fn user_set(&mut self, properties: Properties, opts: RecordOptions) -> bool {
        self.user_verb(EventType::UserSet, properties, opts)
    }

    /// Set user properties only where none exist yet.
    pub fn user_set_once(&mut self, properties: Properties, opts: RecordOptions) -> bool {
        self.user_verb(EventType::UserSetOnce, properties, opts)
    }

    /// Accumulate numeric user properties server-side.
    pub fn user_add(&mut self, properties: Properties, opts: RecordOptions) -> bool {
        self.user_verb(EventType::UserAdd, properties, opts)
    }

    /// Append values to list-typed user properties.
    pub fn user_append(&mut self, properties: Properties, opts: RecordOptions) -> bool {
        self.user_verb(EventType::UserAppend, properties, opts)
    }

    /// Append values to list-typed user properties, deduplicated
    /// server-side.
    pub fn user_uniq_append(&mut self, properties: Properties, opts: RecordOptions) -> bool {
        self.user_verb(EventType::UserUniqAppend, properties, opts)
    }

    /// Remove the named user properties. Each key is sent with the
    /// tombstone value `0`; the receiver treats it as a deletion marker,
    /// not a numeric zero.
    pub fn user_unset(&mut self, keys: &[&str], opts: RecordOptions) -> bool {
        let properties: Properties = keys
            .iter()
            .map(|key| (key.to_string(), PropertyValue::Int(0)))
            .collect();
        self.user_verb(EventType::UserUnset, properties, opts)
    }

    /// Delete the user. Cannot be undone.
    pub fn user_del(&mut self, opts: RecordOptions) -> bool {
        if let Err(e) = self
            .validator
            .check_id(opts.distinct_id.as_deref(), opts.account_id.as_deref())
        {
            self.error_handler.handle(&e);
            return false;
        }
        self.submit(EventType::UserDel, None, None, Properties::new(), opts)
    }

    /// Push buffered data through the sink, if it buffers at all.
    pub fn flush(&mut self) -> bool {
        debug!("tracker flush");
        match self.sink.flush() {
            Ok(()) => true,
            Err(e) => {
                self.error_handler.handle(&e);
                false
            }
        }
    }

    /// Flush and release the sink before shutdown. Best-effort: a failure
    /// is reported through the handler but shutdown continues.
    pub fn close(&mut self) -> bool {
        let ret = match self.sink.close() {
            Ok(()) => true,
            Err(e) => {
                self.error_handler.handle(&e);
                false
            }
        };
        info!("tracker closed");
        ret
    }

    fn user_verb(
        &mut self,
        event_type: EventType,
        properties: Properties,
        opts: RecordOptions,
    ) -> bool {
        let checks = self
            .validator
            .check_id(opts.distinct_id.as_deref(), opts.account_id.as_deref())
            .and_then(|_| self.validator.check_properties(event_type, &properties));
        if let Err(e) = checks {
            self.error_handler.handle(&e);
            return false;
        }
        self.submit(event_type, None, None, properties, opts)
    }

    fn validate_event(
        &self,
        event_type: EventType,
        event_name: &str,
        event_id: Option<&str>,
        properties: &Properties,
        opts: &RecordOptions,
    ) -> Result<(), TrackerError> {
        self.validator.check_name(event_name)?;
        if let Some(event_id) = event_id {
            self.validator.check_event_id(event_id)?;
        }
        self.validator
            .check_id(opts.distinct_id.as_deref(), opts.account_id.as_deref())?;
        if !opts.skip_local_check {
            self.validator.check_properties(event_type, properties)?;
        }
        Ok(())
    }

    fn submit(
        &mut self,
        event_type: EventType,
        event_name: Option<String>,
        event_id: Option<String>,
        properties: Properties,
        opts: RecordOptions,
    ) -> bool {
        let event_time = opts.time.unwrap_or_else(|| Local::now().fixed_offset());

        // Merge order fixes precedence: later layers win on key collision.
        let merged = if event_type.is_track() {
            let mut merged = Properties::new();
            merged.insert("#lib".to_string(), PropertyValue::from(LIB_NAME));
            merged.insert("#lib_version".to_string(), PropertyValue::from(LIB_VERSION));
            if self.zone_offset {
                merged.insert(
                    "#zone_offset".to_string(),
                    PropertyValue::Float(utc_offset_hours(&event_time)),
                );
            }
            merged.extend(self.super_properties.clone());
            if let Some(provider) = &self.dynamic_properties {
                merged.extend(provider());
            }
            merged.extend(properties);
            merged
        } else {
            properties
        };

        // Normalized copy: every timestamp becomes its canonical string
        // before the record leaves the builder.
        let mut properties: Properties = merged
            .into_iter()
            .map(|(key, value)| {
                let normalized = value.normalized();
                (key, normalized)
            })
            .collect();

        let hoisted_ip = take_string(&mut properties, "#ip");
        let hoisted_time = take_string(&mut properties, "#time");
        let app_id = take_string(&mut properties, "#app_id");
        let mut uuid = take_string(&mut properties, "#uuid");
        if self.auto_uuid && uuid.is_none() {
            uuid = Some(Uuid::new_v4().to_string());
        }

        let record = Record {
            event_type,
            time: hoisted_time.unwrap_or_else(|| format_time(&event_time)),
            event_name,
            event_id,
            account_id: opts.account_id,
            distinct_id: opts.distinct_id,
            ip: opts.ip.or(hoisted_ip),
            uuid,
            first_check_id: opts.first_check_id,
            app_id,
            properties,
        };

        match self.sink.add(record) {
            Ok(()) => true,
            Err(e) => {
                self.error_handler.handle(&e);
                false
            }
        }
    }
}

/// Remove a reserved key from the bag when it carries a string value.
fn take_string(properties: &mut Properties, key: &str) -> Option<String> {
    if matches!(properties.get(key), Some(PropertyValue::String(_))) {
        match properties.remove(key) {
            Some(PropertyValue::String(s)) => Some(s),
            _ => None,
        }
    } else {
        None
    }
}
