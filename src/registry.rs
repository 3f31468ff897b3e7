// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription registry mapping datapoints to host channels.
//!
//! The [`DatapointRegistry`] holds the live mapping from a
//! [`DatapointKey`] to the subscriber records interested in it. Handlers
//! register on initialization and unregister on disposal; the event
//! dispatcher looks keys up for every inbound state change.
//!
//! # Architecture
//!
//! ```text
//! Inbound event: ABCD1234/ch0000/odp0001 → "42"
//!                     ↓
//!            registry.lookup(key)
//!                     ↓
//!        snapshot of SubscriberRecords
//!                     ↓
//!     converter.decode("42") per record
//!                     ↓
//!     Weak<dyn StateSink>.upgrade()
//!                     ↓
//!     sink.update_state("DimValue", 42)
//! ```
//!
//! # Concurrency
//!
//! Register, unregister and lookup are O(1) map operations under a
//! [`parking_lot::RwLock`]. `lookup` returns a snapshot copy, so
//! subscriber callbacks always run after the lock is released; a slow
//! subscriber can never block registration for unrelated devices.
//!
//! Subscribers are held as `Weak` references: a handler dropped without
//! unregistering leaves a dead record that is skipped on dispatch and
//! removed by [`DatapointRegistry::cleanup`].

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::catalog::DatapointKey;
use crate::convert::ValueConverter;
use crate::host::{ChannelRef, StateSink};

/// One subscription of a host channel to a datapoint.
///
/// Multiple records may share the same [`DatapointKey`], e.g. one
/// datapoint feeding two host channels through different converters. The
/// sink reference is non-owning: it never extends the handler's lifetime.
#[derive(Clone)]
pub struct SubscriberRecord {
    key: DatapointKey,
    sink: Weak<dyn StateSink>,
    target: ChannelRef,
    converter: Arc<dyn ValueConverter>,
}

impl SubscriberRecord {
    /// Returns the subscription key.
    #[must_use]
    pub fn key(&self) -> &DatapointKey {
        &self.key
    }

    /// Returns the host channel this record feeds.
    #[must_use]
    pub fn target(&self) -> &ChannelRef {
        &self.target
    }

    /// Returns the bound value converter.
    #[must_use]
    pub fn converter(&self) -> &dyn ValueConverter {
        self.converter.as_ref()
    }

    /// Upgrades the sink reference, or `None` if the subscriber is gone.
    #[must_use]
    pub fn sink(&self) -> Option<Arc<dyn StateSink>> {
        self.sink.upgrade()
    }
}

impl std::fmt::Debug for SubscriberRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRecord")
            .field("key", &self.key)
            .field("target", &self.target)
            .field("alive", &(self.sink.strong_count() > 0))
            .finish_non_exhaustive()
    }
}

/// Registry of datapoint subscriptions.
///
/// Shared as `Arc` between handler lifecycle code (register/unregister)
/// and the event dispatcher (lookup). All mutation goes through this
/// API; no component reaches into the map directly.
#[derive(Default)]
pub struct DatapointRegistry {
    subscribers: RwLock<HashMap<DatapointKey, Vec<SubscriberRecord>>>,
}

impl DatapointRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a host channel for state changes of a datapoint.
    ///
    /// Re-registering the same (key, target) pair without an intervening
    /// unregister replaces the prior record (last-write-wins): the old
    /// converter and sink never see another event. Distinct targets under
    /// one key coexist.
    pub fn register_channel(
        &self,
        key: DatapointKey,
        sink: Weak<dyn StateSink>,
        target: ChannelRef,
        converter: Arc<dyn ValueConverter>,
    ) {
        tracing::debug!(key = %key, target = %target, "Registering channel subscription");

        let record = SubscriberRecord {
            key: key.clone(),
            sink,
            target,
            converter,
        };

        let mut subscribers = self.subscribers.write();
        let records = subscribers.entry(key).or_default();
        records.retain(|existing| existing.target != record.target);
        records.push(record);
    }

    /// Unregisters every subscription under the given key.
    ///
    /// Unregistration is keyed at datapoint granularity: all targets
    /// hanging off the datapoint are removed as a group. Removing an
    /// unknown key is a no-op.
    ///
    /// Returns `true` if any record was removed.
    pub fn unregister_channel(&self, key: &DatapointKey) -> bool {
        tracing::debug!(key = %key, "Unregistering channel subscription");
        self.subscribers.write().remove(key).is_some()
    }

    /// Returns a snapshot of the records registered for a key.
    ///
    /// Unknown keys yield an empty vector, never an error: inbound events
    /// for unregistered datapoints are bus noise and get dropped.
    #[must_use]
    pub fn lookup(&self, key: &DatapointKey) -> Vec<SubscriberRecord> {
        self.subscribers
            .read()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Removes records whose subscriber has been dropped.
    ///
    /// Dead records are also skipped during dispatch, so calling this is
    /// an optional memory-hygiene measure.
    pub fn cleanup(&self) {
        self.subscribers.write().retain(|key, records| {
            records.retain(|record| {
                let alive = record.sink.strong_count() > 0;
                if !alive {
                    tracing::debug!(key = %key, target = %record.target, "Pruning dead subscriber");
                }
                alive
            });
            !records.is_empty()
        });
    }

    /// Returns the number of registered keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Returns the total number of subscriber records.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }
}

impl std::fmt::Debug for DatapointRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatapointRegistry")
            .field("key_count", &self.key_count())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
