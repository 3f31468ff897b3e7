// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-native value types.
//!
//! Raw datapoint values are always transported as strings on the bus;
//! typed semantics exist only on the host side of the converter boundary.
//! This module provides those host-side types. Each constrained type
//! validates its range at construction time, preventing runtime errors.
//!
//! # Examples
//!
//! ```
//! use sysap_lib::types::{HostValue, OnOff, Percent};
//!
//! let switch = HostValue::OnOff(OnOff::On);
//! let position = HostValue::Percent(Percent::new(40).unwrap());
//! let brightness = HostValue::Decimal(42.0);
//! ```

mod motion;
mod on_off;
mod percent;

use std::fmt;

pub use motion::{StopMove, UpDown};
pub use on_off::OnOff;
pub use percent::Percent;

/// A typed, host-native datapoint value.
///
/// Values of this type are produced by decoding a raw bus string through a
/// [`ValueConverter`](crate::convert::ValueConverter) and consumed by
/// encoding back to the raw wire form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostValue {
    /// A binary on/off state.
    OnOff(OnOff),
    /// An unconstrained decimal value (dimming level, temperature).
    Decimal(f64),
    /// A percentage value (shutter position).
    Percent(Percent),
}

impl HostValue {
    /// Returns the on/off state if this is an `OnOff` value.
    #[must_use]
    pub fn as_on_off(&self) -> Option<OnOff> {
        match self {
            Self::OnOff(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the decimal value if this is a `Decimal` value.
    #[must_use]
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Self::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the percentage if this is a `Percent` value.
    #[must_use]
    pub fn as_percent(&self) -> Option<Percent> {
        match self {
            Self::Percent(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnOff(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Percent(v) => write!(f, "{v}"),
        }
    }
}

impl From<OnOff> for HostValue {
    fn from(value: OnOff) -> Self {
        Self::OnOff(value)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<Percent> for HostValue {
    fn from(value: Percent) -> Self {
        Self::Percent(value)
    }
}
