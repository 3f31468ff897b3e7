// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared access to the gateway and the subscription registry.
//!
//! A [`Bridge`] owns the [`GatewayClient`] and, once dispatch is started,
//! the [`DatapointRegistry`]. It is cheaply cloneable (via `Arc`) and is
//! handed to every device handler at construction; there is no
//! process-global bridge lookup anywhere in this library.
//!
//! # Examples
//!
//! ```no_run
//! use sysap_lib::bridge::Bridge;
//! use sysap_lib::dispatch::DispatchConfig;
//! use sysap_lib::gateway::{GatewayClient, HttpConfig};
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> sysap_lib::Result<()> {
//! let transport = HttpConfig::new("192.168.1.2")
//!     .with_credentials("installer", "secret")
//!     .into_transport()?;
//! let bridge = Bridge::new(GatewayClient::new(transport));
//!
//! // Feed SysAP push events into the dispatcher.
//! let (events_tx, events_rx) = mpsc::channel(64);
//! let dispatch = bridge.start_dispatch(events_rx, &DispatchConfig::default());
//! # let _ = (events_tx, dispatch);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::dispatch::{DispatchConfig, EventDispatcher};
use crate::error::DispatchError;
use crate::event::DatapointEvent;
use crate::gateway::{DatapointTransport, GatewayClient};
use crate::registry::DatapointRegistry;

/// Shared owner of the gateway client and the datapoint registry.
pub struct Bridge<T> {
    inner: Arc<BridgeInner<T>>,
}

struct BridgeInner<T> {
    gateway: GatewayClient<T>,
    registry: RwLock<Option<Arc<DatapointRegistry>>>,
}

impl<T: DatapointTransport> Bridge<T> {
    /// Creates a bridge over the given gateway client.
    ///
    /// The registry does not exist until [`start_dispatch`](Self::start_dispatch)
    /// is called; handlers initialized before that go offline with a
    /// registration-unavailable diagnostic.
    #[must_use]
    pub fn new(gateway: GatewayClient<T>) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                gateway,
                registry: RwLock::new(None),
            }),
        }
    }

    /// Returns the shared gateway client.
    #[must_use]
    pub fn gateway(&self) -> &GatewayClient<T> {
        &self.inner.gateway
    }

    /// Returns the registry, if dispatch has been started.
    #[must_use]
    pub fn registry(&self) -> Option<Arc<DatapointRegistry>> {
        self.inner.registry.read().clone()
    }

    /// Creates the registry and spawns the event dispatcher over the
    /// given inbound stream.
    ///
    /// The returned handle resolves with
    /// [`DispatchError::ConnectionLost`] when the stream disconnects;
    /// reconnection supervision belongs to the caller. Starting dispatch
    /// again rebuilds the registry from scratch; subscriptions are not
    /// persisted and handlers must be re-initialized.
    pub fn start_dispatch(
        &self,
        events: mpsc::Receiver<DatapointEvent>,
        config: &DispatchConfig,
    ) -> JoinHandle<Result<(), DispatchError>> {
        let registry = Arc::new(DatapointRegistry::new());
        *self.inner.registry.write() = Some(Arc::clone(&registry));

        tracing::debug!("Starting event dispatch");
        let dispatcher = EventDispatcher::new(registry, config);
        tokio::spawn(dispatcher.run(events))
    }
}

impl<T> Clone for Bridge<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Bridge<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("dispatch_started", &self.inner.registry.read().is_some())
            .finish()
    }
}
