// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Contract between this library and the automation host.
//!
//! The host sees devices as handlers exposing named channels. Converted
//! state updates and status transitions flow out through a [`StateSink`]
//! the host implements; everything else (commands, lifecycle) flows in
//! through [`DeviceHandler`](crate::handler::DeviceHandler) methods.

use std::fmt;

use crate::types::HostValue;

/// Identifier of a host-visible channel (e.g. `"DimValue"`).
///
/// This is the *host's* name for a channel, distinct from the bus-side
/// [`ChannelId`](crate::catalog::ChannelId).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelRef(String);

impl ChannelRef {
    /// Creates a host channel reference.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChannelRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Diagnostic reason for a handler being offline.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OfflineReason {
    /// The bridge has no running event dispatch, so state-change
    /// registration is impossible.
    RegistrationUnavailable,
}

impl fmt::Display for OfflineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistrationUnavailable => write!(f, "no online updates are possible"),
        }
    }
}

/// Lifecycle status of a device handler as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerStatus {
    /// The handler has been constructed but not initialized.
    Uninitialized,
    /// The handler is initialized and serving commands and updates.
    Online,
    /// The handler failed to initialize; the reason is diagnostic.
    Offline(OfflineReason),
}

impl HandlerStatus {
    /// Returns `true` if the handler is online.
    #[must_use]
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

/// Callback interface implemented by the host integration layer.
///
/// The dispatcher and the handlers push converted channel values and
/// status transitions through this trait. Implementations must be cheap
/// and non-blocking: they are invoked from dispatch workers, and a
/// subscriber that blocks delays every channel sharing its shard.
///
/// Sinks are registered with the
/// [`DatapointRegistry`](crate::registry::DatapointRegistry) as `Weak`
/// references; dropping the owning handler without unregistering does not
/// keep the sink alive.
pub trait StateSink: Send + Sync {
    /// Delivers a converted value for a host channel.
    fn update_state(&self, channel: &ChannelRef, value: HostValue);

    /// Reports a handler status transition.
    fn update_status(&self, status: HandlerStatus);
}
