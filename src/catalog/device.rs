// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed device catalog parsed from the SysAP configuration document.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::CatalogError;

use super::ids::{ChannelId, DatapointId, DeviceId};

/// Classification of a channel into the device kind its handler serves.
///
/// The SysAP declares a function id per channel; the classification below
/// covers the functions this library binds. Everything else maps to
/// [`ThingType::Unknown`] and is skipped by discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThingType {
    /// Binary switch actuator.
    Actuator,
    /// Dimming actuator with a brightness level.
    DimmingActuator,
    /// Shutter or blind actuator.
    ShutterActuator,
    /// Room temperature controller.
    Thermostat,
    /// Window/door contact sensor.
    WindowSensor,
    /// Scene trigger.
    Scene,
    /// Automation rule toggle.
    Rule,
    /// Door ring sensor.
    DoorRingSensor,
    /// Unclassified channel function.
    Unknown,
}

impl ThingType {
    /// Classifies a channel from the hexadecimal function id declared in
    /// the SysAP configuration.
    #[must_use]
    pub fn from_function_id(function_id: &str) -> Self {
        let Ok(fid) = u16::from_str_radix(function_id.trim(), 16) else {
            return Self::Unknown;
        };

        match fid {
            0x0007 => Self::Actuator,
            0x0012 => Self::DimmingActuator,
            0x0009 | 0x000A => Self::ShutterActuator,
            0x0023 | 0x0024 => Self::Thermostat,
            0x000F => Self::WindowSensor,
            0x001A => Self::DoorRingSensor,
            0x4800 => Self::Scene,
            0x4A00 => Self::Rule,
            _ => Self::Unknown,
        }
    }
}

/// A single datapoint slot on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatapointDescription {
    id: DatapointId,
    pairing_id: u32,
    value: Option<String>,
}

impl DatapointDescription {
    /// Returns the datapoint identifier.
    #[must_use]
    pub fn id(&self) -> &DatapointId {
        &self.id
    }

    /// Returns the declared pairing role of this datapoint.
    #[must_use]
    pub fn pairing_id(&self) -> u32 {
        self.pairing_id
    }

    /// Returns the last-known raw value reported by the SysAP, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// A sub-addressable function block of a device.
#[derive(Debug, Clone)]
pub struct ChannelDescription {
    id: ChannelId,
    thing_type: ThingType,
    display_name: Option<String>,
    inputs: Vec<DatapointDescription>,
    outputs: Vec<DatapointDescription>,
}

impl ChannelDescription {
    /// Returns the channel identifier.
    #[must_use]
    pub fn id(&self) -> &ChannelId {
        &self.id
    }

    /// Returns the channel classification.
    #[must_use]
    pub fn thing_type(&self) -> ThingType {
        self.thing_type
    }

    /// Returns the display name declared for the channel, if any.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the input datapoints (`idp…`) in identifier order.
    #[must_use]
    pub fn inputs(&self) -> &[DatapointDescription] {
        &self.inputs
    }

    /// Returns the output datapoints (`odp…`) in identifier order.
    #[must_use]
    pub fn outputs(&self) -> &[DatapointDescription] {
        &self.outputs
    }

    /// Looks up an output datapoint by its pairing role.
    #[must_use]
    pub fn output_by_pairing(&self, pairing_id: u32) -> Option<&DatapointDescription> {
        self.outputs.iter().find(|dp| dp.pairing_id == pairing_id)
    }
}

/// A device on the bus with its ordered list of channels.
#[derive(Debug, Clone)]
pub struct DeviceDescription {
    id: DeviceId,
    label: Option<String>,
    interface: Option<String>,
    channels: Vec<ChannelDescription>,
}

impl DeviceDescription {
    /// Returns the device identifier.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Returns the device label, falling back to the identifier.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| self.id.as_str())
    }

    /// Returns the interface/media type the device is attached through.
    #[must_use]
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    /// Returns `true` if the device exposes at least one channel.
    ///
    /// The SysAP lists devices that never completed commissioning; they
    /// carry no channels and are not bindable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.channels.is_empty()
    }

    /// Returns the channels in identifier order.
    #[must_use]
    pub fn channels(&self) -> &[ChannelDescription] {
        &self.channels
    }

    /// Looks up a channel by its identifier.
    #[must_use]
    pub fn channel(&self, id: &ChannelId) -> Option<&ChannelDescription> {
        self.channels.iter().find(|ch| ch.id == *id)
    }
}

/// The read-only list of devices known to the System Access Point.
#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    devices: Vec<DeviceDescription>,
}

impl DeviceCatalog {
    /// Parses a catalog from the SysAP configuration JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Json`] if the document is not valid JSON or
    /// does not match the expected structure.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;

        let devices = raw
            .devices
            .into_iter()
            .map(|(id, device)| build_device(&id, device))
            .collect();

        Ok(Self { devices })
    }

    /// Returns the number of devices in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` if the catalog contains no devices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Looks up a device by its identifier.
    #[must_use]
    pub fn device(&self, id: &DeviceId) -> Option<&DeviceDescription> {
        self.devices.iter().find(|dev| dev.id == *id)
    }

    /// Iterates over all devices in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceDescription> {
        self.devices.iter()
    }
}

fn build_device(id: &str, raw: RawDevice) -> DeviceDescription {
    let channels = raw
        .channels
        .into_iter()
        .map(|(channel_id, channel)| {
            let thing_type = channel
                .function_id
                .as_deref()
                .map_or(ThingType::Unknown, ThingType::from_function_id);

            ChannelDescription {
                id: ChannelId::new(channel_id),
                thing_type,
                display_name: channel.display_name,
                inputs: build_datapoints(channel.inputs),
                outputs: build_datapoints(channel.outputs),
            }
        })
        .collect();

    DeviceDescription {
        id: DeviceId::new(id),
        label: raw.display_name,
        interface: raw.interface,
        channels,
    }
}

fn build_datapoints(raw: BTreeMap<String, RawDatapoint>) -> Vec<DatapointDescription> {
    raw.into_iter()
        .map(|(id, dp)| DatapointDescription {
            id: DatapointId::new(id),
            pairing_id: dp.pairing_id,
            value: dp.value,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    devices: BTreeMap<String, RawDevice>,
}

#[derive(Debug, Deserialize)]
struct RawDevice {
    #[serde(default)]
    interface: Option<String>,
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
    #[serde(default)]
    channels: BTreeMap<String, RawChannel>,
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    #[serde(rename = "functionID", default)]
    function_id: Option<String>,
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
    #[serde(default)]
    inputs: BTreeMap<String, RawDatapoint>,
    #[serde(default)]
    outputs: BTreeMap<String, RawDatapoint>,
}

#[derive(Debug, Deserialize)]
struct RawDatapoint {
    #[serde(rename = "pairingID", default)]
    pairing_id: u32,
    #[serde(default)]
    value: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "devices": {
            "ABB700000001": {
                "interface": "TP",
                "displayName": "Living room dimmer",
                "channels": {
                    "ch0000": {
                        "functionID": "12",
                        "displayName": "Dimmer",
                        "inputs": {
                            "idp0000": { "pairingID": 1, "value": "0" },
                            "idp0002": { "pairingID": 17, "value": "0" }
                        },
                        "outputs": {
                            "odp0000": { "pairingID": 256, "value": "1" },
                            "odp0001": { "pairingID": 272, "value": "42" }
                        }
                    }
                }
            },
            "ABB700000002": {
                "interface": "TP",
                "displayName": "Bare device",
                "channels": {}
            }
        }
    }"#;

    #[test]
    fn parse_sample_catalog() {
        let catalog = DeviceCatalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 2);

        let device = catalog.device(&DeviceId::new("ABB700000001")).unwrap();
        assert_eq!(device.label(), "Living room dimmer");
        assert_eq!(device.interface(), Some("TP"));
        assert!(device.is_valid());

        let channel = device.channel(&ChannelId::new("ch0000")).unwrap();
        assert_eq!(channel.thing_type(), ThingType::DimmingActuator);
        assert_eq!(channel.inputs().len(), 2);
        assert_eq!(channel.outputs().len(), 2);
    }

    #[test]
    fn device_without_channels_is_invalid() {
        let catalog = DeviceCatalog::from_json(SAMPLE).unwrap();
        let device = catalog.device(&DeviceId::new("ABB700000002")).unwrap();
        assert!(!device.is_valid());
    }

    #[test]
    fn datapoint_values_and_roles() {
        let catalog = DeviceCatalog::from_json(SAMPLE).unwrap();
        let device = catalog.device(&DeviceId::new("ABB700000001")).unwrap();
        let channel = device.channel(&ChannelId::new("ch0000")).unwrap();

        let dim_state = channel.output_by_pairing(272).unwrap();
        assert_eq!(dim_state.id().as_str(), "odp0001");
        assert_eq!(dim_state.value(), Some("42"));
    }

    #[test]
    fn label_falls_back_to_id() {
        let catalog = DeviceCatalog::from_json(r#"{"devices":{"X1":{}}}"#).unwrap();
        let device = catalog.device(&DeviceId::new("X1")).unwrap();
        assert_eq!(device.label(), "X1");
    }

    #[test]
    fn function_id_classification() {
        assert_eq!(ThingType::from_function_id("7"), ThingType::Actuator);
        assert_eq!(
            ThingType::from_function_id("0012"),
            ThingType::DimmingActuator
        );
        assert_eq!(ThingType::from_function_id("9"), ThingType::ShutterActuator);
        assert_eq!(ThingType::from_function_id("23"), ThingType::Thermostat);
        assert_eq!(ThingType::from_function_id("f"), ThingType::WindowSensor);
        assert_eq!(ThingType::from_function_id("1a"), ThingType::DoorRingSensor);
        assert_eq!(ThingType::from_function_id("4800"), ThingType::Scene);
        assert_eq!(ThingType::from_function_id("4a00"), ThingType::Rule);
        assert_eq!(ThingType::from_function_id("ffff"), ThingType::Unknown);
        assert_eq!(ThingType::from_function_id("zz"), ThingType::Unknown);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let result = DeviceCatalog::from_json("{not json");
        assert!(matches!(result, Err(CatalogError::Json(_))));
    }
}
