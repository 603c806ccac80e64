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

// Local schema validation for names, ids, and property bags

use crate::errors::TrackerError;
use crate::record::{EventType, Properties, PropertyValue};
use regex::Regex;

const NAME_PATTERN: &str = "^[a-zA-Z][a-zA-Z0-9_]{1,49}$";
const MAX_ID_LENGTH: usize = 64;

/// Validates record inputs against the schema rules.
///
/// Built once per tracker with explicit options instead of process-global
/// flags. With `stringent` off every check passes trivially. `strict`
/// additionally enforces the legacy rules: names must match
/// `^[a-zA-Z][a-zA-Z0-9_]{1,49}$` and present ids must be 1..=64 chars.
pub struct PropertyValidator {
    stringent: bool,
    name_pattern: Option<Regex>,
}

impl PropertyValidator {
    pub fn new(stringent: bool, strict: bool) -> Self {
        let name_pattern = if strict {
            // Pattern is a compile-time constant, cannot fail to parse.
            Some(Regex::new(NAME_PATTERN).unwrap())
        } else {
            None
        };
        Self {
            stringent,
            name_pattern,
        }
    }

    pub fn stringent(&self) -> bool {
        self.stringent
    }

    /// Event or property name check.
    pub fn check_name(&self, name: &str) -> Result<(), TrackerError> {
        if !self.stringent {
            return Ok(());
        }
        if name.is_empty() {
            return Err(TrackerError::IllegalParameter(
                "the name of event or property cannot be empty".to_string(),
            ));
        }
        if let Some(pattern) = &self.name_pattern {
            if !pattern.is_match(name) {
                return Err(TrackerError::IllegalParameter(format!(
                    "{} is invalid. It must start with a letter and contain letters, \
                     numbers, and _ with max length of 50",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Correlation key check for updatable/overwritable events.
    pub fn check_event_id(&self, event_id: &str) -> Result<(), TrackerError> {
        if !self.stringent {
            return Ok(());
        }
        if event_id.is_empty() {
            return Err(TrackerError::IllegalParameter(
                "the event_id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// At least one of distinct id / account id must be present.
    pub fn check_id(
        &self,
        distinct_id: Option<&str>,
        account_id: Option<&str>,
    ) -> Result<(), TrackerError> {
        if !self.stringent {
            return Ok(());
        }
        if distinct_id.is_none() && account_id.is_none() {
            return Err(TrackerError::IllegalParameter(
                "account id or distinct id must be provided".to_string(),
            ));
        }
        if self.name_pattern.is_some() {
            for id in [distinct_id, account_id].into_iter().flatten() {
                if id.is_empty() || id.len() > MAX_ID_LENGTH {
                    return Err(TrackerError::IllegalParameter(format!(
                        "the length of an id should be in (0, {}]",
                        MAX_ID_LENGTH
                    )));
                }
            }
        }
        Ok(())
    }

    /// Property-bag check: every key is name-checked, `user_add` values
    /// must be numeric, and list values may hold scalars only.
    pub fn check_properties(
        &self,
        event_type: EventType,
        properties: &Properties,
    ) -> Result<(), TrackerError> {
        if !self.stringent {
            return Ok(());
        }
        for (key, value) in properties {
            self.check_name(key)?;
            if event_type == EventType::UserAdd && !value.is_numeric() {
                return Err(TrackerError::IllegalParameter(
                    "property values for user_add must be numbers".to_string(),
                ));
            }
            if let PropertyValue::List(items) = value {
                if items
                    .iter()
                    .any(|item| matches!(item, PropertyValue::List(_)))
                {
                    return Err(TrackerError::IllegalParameter(format!(
                        "property '{}' holds a nested list; list values must be scalars",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}
