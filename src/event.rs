// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound state-change events.
//!
//! The System Access Point pushes state changes as JSON frames carrying a
//! `datapoints` map of `"device/channel/datapoint" → raw value` entries.
//! [`parse_event_frame`] flattens one frame into [`DatapointEvent`]s; the
//! transport feeds those into the
//! [`EventDispatcher`](crate::dispatch::EventDispatcher) over a channel.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::catalog::DatapointKey;

/// A single datapoint state-change notification from the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatapointEvent {
    key: DatapointKey,
    raw_value: String,
}

impl DatapointEvent {
    /// Creates an event from its subscription key and raw value.
    #[must_use]
    pub fn new(key: DatapointKey, raw_value: impl Into<String>) -> Self {
        Self {
            key,
            raw_value: raw_value.into(),
        }
    }

    /// Returns the subscription key the event addresses.
    #[must_use]
    pub fn key(&self) -> &DatapointKey {
        &self.key
    }

    /// Returns the raw string value carried by the event.
    #[must_use]
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }
}

/// Parses one push frame into its datapoint events.
///
/// Two frame layouts are accepted: the bare form
/// `{"datapoints": {...}}` and the SysAP form that nests the same object
/// under the access point identifier. Malformed frames and malformed
/// entries are bus noise: they are logged and skipped, never fatal, so
/// the returned vector may be empty.
#[must_use]
pub fn parse_event_frame(json: &str) -> Vec<DatapointEvent> {
    let datapoints = match serde_json::from_str::<RawFrame>(json) {
        Ok(frame) if !frame.datapoints.is_empty() => frame.datapoints,
        _ => match serde_json::from_str::<BTreeMap<String, RawFrame>>(json) {
            Ok(nested) => nested
                .into_values()
                .flat_map(|frame| frame.datapoints)
                .collect(),
            Err(error) => {
                tracing::warn!(%error, "Ignoring unparseable event frame");
                return Vec::new();
            }
        },
    };

    datapoints
        .into_iter()
        .filter_map(|(address, raw_value)| {
            let Some(key) = DatapointKey::parse(&address) else {
                tracing::warn!(address = %address, "Ignoring malformed datapoint address");
                return None;
            };
            Some(DatapointEvent::new(key, raw_value))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    datapoints: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_frame() {
        let events = parse_event_frame(
            r#"{"datapoints": {"ABCD1234/ch0000/odp0001": "42"}}"#,
        );
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].key(),
            &DatapointKey::new("ABCD1234", "ch0000", "odp0001")
        );
        assert_eq!(events[0].raw_value(), "42");
    }

    #[test]
    fn parse_nested_frame() {
        let events = parse_event_frame(
            r#"{"00000000-0000-0000-0000-000000000000": {
                "datapoints": {
                    "ABCD1234/ch0000/odp0000": "1",
                    "ABCD1234/ch0001/odp0000": "0"
                }
            }}"#,
        );
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn malformed_addresses_are_skipped() {
        let events = parse_event_frame(
            r#"{"datapoints": {
                "not-an-address": "1",
                "ABCD1234/ch0000/odp0001": "42"
            }}"#,
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].raw_value(), "42");
    }

    #[test]
    fn unparseable_frame_yields_nothing() {
        assert!(parse_event_frame("{not json").is_empty());
        assert!(parse_event_frame(r#"{"somethingElse": 1}"#).is_empty());
    }

    #[test]
    fn empty_datapoints_yields_nothing() {
        assert!(parse_event_frame(r#"{"datapoints": {}}"#).is_empty());
    }
}
