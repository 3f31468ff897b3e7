// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only device catalog.
//!
//! The System Access Point enumerates every device on the bus together
//! with its channels and datapoints. This module provides the typed,
//! read-only view of that enumeration:
//!
//! - [`DeviceId`], [`ChannelId`], [`DatapointId`] - opaque bus identifiers
//! - [`DatapointKey`] - the composite (device, channel, datapoint)
//!   subscription key
//! - [`DeviceCatalog`] - the parsed device list with [`DeviceDescription`]
//!   and [`ChannelDescription`] entries
//!
//! The catalog is built once from the SysAP configuration JSON and never
//! mutated afterwards; handlers and discovery only read from it.
//!
//! # Examples
//!
//! ```
//! use sysap_lib::catalog::DeviceCatalog;
//!
//! let json = r#"{
//!     "devices": {
//!         "ABB700000001": {
//!             "interface": "TP",
//!             "displayName": "Living room light",
//!             "channels": {
//!                 "ch0000": {
//!                     "functionID": "7",
//!                     "outputs": { "odp0000": { "pairingID": 256, "value": "0" } },
//!                     "inputs": { "idp0000": { "pairingID": 1, "value": "0" } }
//!                 }
//!             }
//!         }
//!     }
//! }"#;
//!
//! let catalog = DeviceCatalog::from_json(json).unwrap();
//! assert_eq!(catalog.len(), 1);
//! ```

mod device;
mod ids;

pub use device::{
    ChannelDescription, DatapointDescription, DeviceCatalog, DeviceDescription, ThingType,
};
pub use ids::{ChannelId, DatapointId, DatapointKey, DeviceId, Direction};
