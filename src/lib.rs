// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `SysAp` Lib - A Rust library to integrate free@home devices.
//!
//! This library connects the free@home bus (switch, dimming and shutter
//! actuators, thermostats, sensors, scenes and rules) to a generic
//! smart-home automation host via the System Access Point local API.
//!
//! # Architecture
//!
//! - A [`Bridge`] owns the [`GatewayClient`](gateway::GatewayClient) for
//!   outbound datapoint reads/writes and the
//!   [`DatapointRegistry`](registry::DatapointRegistry) mapping bus
//!   datapoints to host channels.
//! - The [`EventDispatcher`](dispatch::EventDispatcher) consumes the
//!   SysAP push stream and delivers converted values to the host through
//!   registered [`StateSink`](host::StateSink)s, preserving per-datapoint
//!   ordering.
//! - One generic [`DeviceHandler`](handler::DeviceHandler), parameterized
//!   by a per-type [`ThingDescriptor`](handler::ThingDescriptor),
//!   translates host commands into gateway writes and manages
//!   registration over its lifecycle.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use sysap_lib::{Bridge, DeviceHandler, DispatchConfig, GatewayClient, HostCommand};
//! use sysap_lib::catalog::DeviceCatalog;
//! use sysap_lib::gateway::HttpConfig;
//! use sysap_lib::host::{ChannelRef, HandlerStatus, StateSink};
//! use sysap_lib::types::{HostValue, OnOff};
//! use tokio::sync::mpsc;
//!
//! struct PrintSink;
//!
//! impl StateSink for PrintSink {
//!     fn update_state(&self, channel: &ChannelRef, value: HostValue) {
//!         println!("{channel} -> {value}");
//!     }
//!     fn update_status(&self, status: HandlerStatus) {
//!         println!("status: {status:?}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> sysap_lib::Result<()> {
//!     let transport = HttpConfig::new("192.168.1.2")
//!         .with_credentials("installer", "secret")
//!         .into_transport()?;
//!     let bridge = Bridge::new(GatewayClient::new(transport));
//!
//!     // The transport feeding this channel (e.g. the SysAP websocket)
//!     // is owned by the embedding application.
//!     let (events_tx, events_rx) = mpsc::channel(64);
//!     let dispatch = bridge.start_dispatch(events_rx, &DispatchConfig::default());
//!
//!     let catalog = DeviceCatalog::from_json("{\"devices\":{}}")?;
//!     for device in catalog.iter() {
//!         for channel in device.channels() {
//!             if let Some(handler) = DeviceHandler::from_catalog(
//!                 device,
//!                 channel,
//!                 bridge.clone(),
//!                 Arc::new(PrintSink),
//!             ) {
//!                 handler.initialize().await;
//!                 handler
//!                     .handle_command(&ChannelRef::new("Switch"), HostCommand::OnOff(OnOff::On))
//!                     .await?;
//!                 handler.dispose();
//!             }
//!         }
//!     }
//!
//!     # let _ = (events_tx, dispatch);
//!     Ok(())
//! }
//! ```
//!
//! # Raw values
//!
//! Datapoint values always cross the wire as strings; boolean and
//! numeric semantics exist only at the [`convert`] boundary. Decoding is
//! strict on the event path (a bad value drops that single delivery) and
//! falls back to a documented default when seeding or refreshing state.

pub mod bridge;
pub mod catalog;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod gateway;
pub mod handler;
pub mod host;
pub mod registry;
pub mod types;

pub use bridge::Bridge;
pub use catalog::{DatapointKey, DeviceCatalog};
pub use convert::{BooleanConverter, DecimalConverter, PercentConverter, ValueConverter};
pub use dispatch::{DispatchConfig, EventDispatcher};
pub use error::{
    CatalogError, ConversionError, DispatchError, Error, GatewayError, HandlerError, Result,
};
pub use event::{DatapointEvent, parse_event_frame};
pub use gateway::{DatapointTransport, GatewayClient, RetryPolicy};
pub use handler::{DeviceHandler, HostCommand, ThingDescriptor};
pub use host::{ChannelRef, HandlerStatus, StateSink};
pub use registry::{DatapointRegistry, SubscriberRecord};
pub use types::{HostValue, OnOff, Percent, StopMove, UpDown};
