// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Opaque bus identifiers and the composite subscription key.
//!
//! All identifiers on the bus are opaque strings assigned by the System
//! Access Point (e.g. device `"ABB700000001"`, channel `"ch0000"`,
//! datapoint `"odp0001"`). The newtypes here keep them from being mixed
//! up; none of them carries semantics beyond equality and hashing.

use std::fmt;

/// Unique identifier of a device on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a device identifier from its bus representation.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a channel within a device (e.g. `"ch0000"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(String);

impl ChannelId {
    /// Creates a channel identifier from its bus representation.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Direction of a datapoint, derived from its identifier prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// An input datapoint (`idp…`): commands are written to it.
    Input,
    /// An output datapoint (`odp…`): state updates are read from it.
    Output,
}

/// Identifier of a datapoint within a channel, namespaced by direction
/// (e.g. `"idp0000"`, `"odp0001"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatapointId(String);

impl DatapointId {
    /// Creates a datapoint identifier from its bus representation.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the direction encoded in the identifier prefix, or `None`
    /// for identifiers outside the `idp…`/`odp…` namespaces.
    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        if self.0.starts_with("idp") {
            Some(Direction::Input)
        } else if self.0.starts_with("odp") {
            Some(Direction::Output)
        } else {
            None
        }
    }
}

impl fmt::Display for DatapointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DatapointId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The composite (device, channel, datapoint) subscription key.
///
/// This is the address under which state-change subscriptions are
/// registered and inbound events are looked up. The key is opaque:
/// uniqueness of the triple is guaranteed by the bus model, not enforced
/// here.
///
/// # Examples
///
/// ```
/// use sysap_lib::catalog::DatapointKey;
///
/// let key = DatapointKey::new("ABCD1234", "ch0000", "odp0001");
/// assert_eq!(key.to_string(), "ABCD1234/ch0000/odp0001");
/// assert_eq!(DatapointKey::parse("ABCD1234/ch0000/odp0001"), Some(key));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatapointKey {
    device: DeviceId,
    channel: ChannelId,
    datapoint: DatapointId,
}

impl DatapointKey {
    /// Creates a subscription key from its three components.
    #[must_use]
    pub fn new(
        device: impl Into<DeviceId>,
        channel: impl Into<ChannelId>,
        datapoint: impl Into<DatapointId>,
    ) -> Self {
        Self {
            device: device.into(),
            channel: channel.into(),
            datapoint: datapoint.into(),
        }
    }

    /// Parses a key from its `device/channel/datapoint` wire form.
    ///
    /// Returns `None` if the string does not have exactly three
    /// non-empty, slash-separated components.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('/');
        let device = parts.next()?;
        let channel = parts.next()?;
        let datapoint = parts.next()?;
        if parts.next().is_some()
            || device.is_empty()
            || channel.is_empty()
            || datapoint.is_empty()
        {
            return None;
        }
        Some(Self::new(device, channel, datapoint))
    }

    /// Returns the device component.
    #[must_use]
    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    /// Returns the channel component.
    #[must_use]
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Returns the datapoint component.
    #[must_use]
    pub fn datapoint(&self) -> &DatapointId {
        &self.datapoint
    }
}

impl fmt::Display for DatapointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.device, self.channel, self.datapoint)
    }
}
