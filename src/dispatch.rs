// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dispatch of inbound state changes to registered subscribers.
//!
//! The [`EventDispatcher`] consumes the continuous stream of
//! [`DatapointEvent`]s pushed by the gateway and routes each one to the
//! subscribers registered in the
//! [`DatapointRegistry`](crate::registry::DatapointRegistry).
//!
//! # Worker sharding
//!
//! Delivery is handed off to a fixed pool of worker tasks instead of
//! running on the intake path, so one unresponsive subscriber cannot
//! stall delivery to all others. Events are sharded by hashing the
//! subscription key: the same key always lands on the same worker, which
//! preserves per-key ordering; ordering across different keys is not
//! guaranteed. Each shard queue is bounded, and the intake loop only
//! waits when the destination shard is full (bounded backlog, no drops).
//!
//! # Failure semantics
//!
//! A decode failure drops that single delivery and continues with the
//! remaining subscribers of the same event. A subscriber whose handler
//! was dropped without unregistering is skipped. When the inbound stream
//! itself closes, [`EventDispatcher::run`] drains the workers and returns
//! [`DispatchError::ConnectionLost`] for the supervising caller to act
//! on; the dispatcher never reconnects internally.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::catalog::DatapointKey;
use crate::error::DispatchError;
use crate::event::DatapointEvent;
use crate::registry::DatapointRegistry;

/// Default number of delivery workers.
const DEFAULT_WORKERS: usize = 4;

/// Default per-shard queue capacity.
const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Configuration for the dispatcher's worker pool.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Number of delivery worker tasks.
    pub workers: usize,
    /// Bounded queue capacity per worker.
    pub queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Routes inbound datapoint events to registered subscribers.
pub struct EventDispatcher {
    registry: Arc<DatapointRegistry>,
    shards: Vec<mpsc::Sender<DatapointEvent>>,
    workers: Vec<JoinHandle<()>>,
}

impl EventDispatcher {
    /// Creates a dispatcher and spawns its delivery workers.
    #[must_use]
    pub fn new(registry: Arc<DatapointRegistry>, config: &DispatchConfig) -> Self {
        let worker_count = config.workers.max(1);
        let capacity = config.queue_capacity.max(1);

        let mut shards = Vec::with_capacity(worker_count);
        let mut workers = Vec::with_capacity(worker_count);

        for index in 0..worker_count {
            let (tx, mut rx) = mpsc::channel::<DatapointEvent>(capacity);
            let registry = Arc::clone(&registry);

            workers.push(tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    deliver(&registry, &event);
                }
                tracing::debug!(worker = index, "Dispatch worker drained");
            }));
            shards.push(tx);
        }

        Self {
            registry,
            shards,
            workers,
        }
    }

    /// Returns the registry this dispatcher serves.
    #[must_use]
    pub fn registry(&self) -> &Arc<DatapointRegistry> {
        &self.registry
    }

    /// Consumes the inbound event stream until it disconnects.
    ///
    /// Every received event is handed to its shard worker; the call only
    /// waits when that worker's bounded queue is full. When the stream
    /// closes, the workers are drained and joined.
    ///
    /// # Errors
    ///
    /// Always finishes with [`DispatchError::ConnectionLost`] once the
    /// stream disconnects; the supervising caller owns reconnection.
    pub async fn run(
        self,
        mut events: mpsc::Receiver<DatapointEvent>,
    ) -> Result<(), DispatchError> {
        let Self {
            shards, workers, ..
        } = self;

        while let Some(event) = events.recv().await {
            let index = shard_index(event.key(), shards.len());
            if shards[index].send(event).await.is_err() {
                // A worker task died; nothing sensible left to route to.
                tracing::error!(worker = index, "Dispatch worker unavailable");
                break;
            }
        }

        // Close the shard queues so workers drain their backlog and exit.
        drop(shards);
        for worker in workers {
            let _ = worker.await;
        }

        tracing::warn!("Inbound event stream disconnected");
        Err(DispatchError::ConnectionLost)
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

/// Picks the shard for a key; stable for the dispatcher's lifetime.
fn shard_index(key: &DatapointKey, shard_count: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    #[allow(clippy::cast_possible_truncation)]
    let index = (hasher.finish() as usize) % shard_count;
    index
}

/// Delivers one event to every live subscriber of its key.
fn deliver(registry: &DatapointRegistry, event: &DatapointEvent) {
    let records = registry.lookup(event.key());
    if records.is_empty() {
        // Bus noise: events for unregistered datapoints are dropped.
        tracing::trace!(key = %event.key(), "No subscribers for event");
        return;
    }

    for record in records {
        let value = match record.converter().decode(event.raw_value()) {
            Ok(value) => value,
            Err(error) => {
                // Contained: one bad conversion never blocks the
                // remaining subscribers of the same event.
                tracing::warn!(
                    key = %event.key(),
                    target = %record.target(),
                    raw = %event.raw_value(),
                    %error,
                    "Dropping delivery after decode failure"
                );
                continue;
            }
        };

        let Some(sink) = record.sink() else {
            tracing::debug!(
                key = %event.key(),
                target = %record.target(),
                "Skipping dropped subscriber"
            );
            continue;
        };

        tracing::debug!(
            key = %event.key(),
            target = %record.target(),
            value = %value,
            "Dispatching state update"
        );
        sink.update_state(record.target(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{BooleanConverter, DecimalConverter, ValueConverter};
    use crate::error::ConversionError;
    use crate::host::{ChannelRef, HandlerStatus, StateSink};
    use crate::types::{HostValue, OnOff};
    use parking_lot::Mutex;
    use std::sync::Weak;

    struct RecordingSink {
        updates: Mutex<Vec<(ChannelRef, HostValue)>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                updates: Mutex::new(Vec::new()),
            })
        }

        fn updates(&self) -> Vec<(ChannelRef, HostValue)> {
            self.updates.lock().clone()
        }
    }

    impl StateSink for RecordingSink {
        fn update_state(&self, channel: &ChannelRef, value: HostValue) {
            self.updates.lock().push((channel.clone(), value));
        }

        fn update_status(&self, _status: HandlerStatus) {}
    }

    /// Converter that refuses every raw value.
    struct RefusingConverter;

    impl ValueConverter for RefusingConverter {
        fn decode(&self, raw: &str) -> Result<HostValue, ConversionError> {
            Err(ConversionError::InvalidInteger {
                raw: raw.to_string(),
            })
        }

        fn encode(&self, _value: &HostValue) -> Result<String, ConversionError> {
            Err(ConversionError::TypeMismatch { expected: "nothing" })
        }

        fn fallback(&self) -> HostValue {
            HostValue::Decimal(0.0)
        }
    }

    fn register(
        registry: &DatapointRegistry,
        key: &DatapointKey,
        sink: &Arc<RecordingSink>,
        target: &str,
        converter: Arc<dyn ValueConverter>,
    ) {
        registry.register_channel(
            key.clone(),
            Arc::downgrade(sink) as Weak<dyn StateSink>,
            ChannelRef::new(target),
            converter,
        );
    }

    /// Runs a dispatcher over the given events and waits for full drain.
    async fn dispatch_all(registry: Arc<DatapointRegistry>, events: Vec<DatapointEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let dispatcher = EventDispatcher::new(registry, &DispatchConfig::default());
        let run = tokio::spawn(dispatcher.run(rx));

        for event in events {
            tx.send(event).await.unwrap();
        }
        drop(tx);

        let result = run.await.unwrap();
        assert_eq!(result, Err(DispatchError::ConnectionLost));
    }

    #[tokio::test]
    async fn dispatches_to_registered_target() {
        let registry = Arc::new(DatapointRegistry::new());
        let sink = RecordingSink::new();
        let key = DatapointKey::new("ABCD1234", "ch0000", "odp0001");

        register(&registry, &key, &sink, "DimValue", Arc::new(DecimalConverter));

        dispatch_all(
            Arc::clone(&registry),
            vec![DatapointEvent::new(key, "42")],
        )
        .await;

        assert_eq!(
            sink.updates(),
            vec![(ChannelRef::new("DimValue"), HostValue::Decimal(42.0))]
        );
    }

    #[tokio::test]
    async fn unregistered_key_causes_zero_calls() {
        let registry = Arc::new(DatapointRegistry::new());
        let sink = RecordingSink::new();
        let key = DatapointKey::new("ABCD1234", "ch0000", "odp0001");

        register(&registry, &key, &sink, "DimValue", Arc::new(DecimalConverter));

        let other = DatapointKey::new("FFFF0000", "ch0000", "odp0000");
        dispatch_all(
            Arc::clone(&registry),
            vec![DatapointEvent::new(other, "1")],
        )
        .await;

        assert!(sink.updates().is_empty());
    }

    #[tokio::test]
    async fn unregistering_stops_delivery() {
        let registry = Arc::new(DatapointRegistry::new());
        let sink = RecordingSink::new();
        let key = DatapointKey::new("ABCD1234", "ch0000", "odp0000");

        register(&registry, &key, &sink, "Switch", Arc::new(BooleanConverter));
        registry.unregister_channel(&key);

        dispatch_all(
            Arc::clone(&registry),
            vec![DatapointEvent::new(key, "1")],
        )
        .await;

        assert!(sink.updates().is_empty());
    }

    #[tokio::test]
    async fn decode_failure_does_not_block_siblings() {
        let registry = Arc::new(DatapointRegistry::new());
        let good_a = RecordingSink::new();
        let bad = RecordingSink::new();
        let good_b = RecordingSink::new();
        let key = DatapointKey::new("ABCD1234", "ch0000", "odp0001");

        register(&registry, &key, &good_a, "First", Arc::new(DecimalConverter));
        register(&registry, &key, &bad, "Broken", Arc::new(RefusingConverter));
        register(&registry, &key, &good_b, "Second", Arc::new(DecimalConverter));

        dispatch_all(
            Arc::clone(&registry),
            vec![DatapointEvent::new(key, "42")],
        )
        .await;

        assert_eq!(good_a.updates().len(), 1);
        assert_eq!(good_b.updates().len(), 1);
        assert!(bad.updates().is_empty());
    }

    #[tokio::test]
    async fn replaced_converter_is_the_only_one_to_fire() {
        let registry = Arc::new(DatapointRegistry::new());
        let sink = RecordingSink::new();
        let key = DatapointKey::new("ABCD1234", "ch0000", "odp0001");

        // Same (key, target) registered twice: last write wins, the two
        // converters never both fire for one event.
        register(&registry, &key, &sink, "Value", Arc::new(BooleanConverter));
        register(&registry, &key, &sink, "Value", Arc::new(DecimalConverter));

        dispatch_all(
            Arc::clone(&registry),
            vec![DatapointEvent::new(key, "1")],
        )
        .await;

        assert_eq!(
            sink.updates(),
            vec![(ChannelRef::new("Value"), HostValue::Decimal(1.0))]
        );
    }

    #[tokio::test]
    async fn preserves_order_within_a_key() {
        let registry = Arc::new(DatapointRegistry::new());
        let sink = RecordingSink::new();
        let key = DatapointKey::new("ABCD1234", "ch0000", "odp0001");

        register(&registry, &key, &sink, "DimValue", Arc::new(DecimalConverter));

        let events = (0..50)
            .map(|i| DatapointEvent::new(key.clone(), i.to_string()))
            .collect();
        dispatch_all(Arc::clone(&registry), events).await;

        let values: Vec<f64> = sink
            .updates()
            .iter()
            .map(|(_, v)| v.as_decimal().unwrap())
            .collect();
        let expected: Vec<f64> = (0..50).map(f64::from).collect();
        assert_eq!(values, expected);
    }

    #[tokio::test]
    async fn dropped_sink_is_skipped() {
        let registry = Arc::new(DatapointRegistry::new());
        let live = RecordingSink::new();
        let key = DatapointKey::new("ABCD1234", "ch0000", "odp0000");

        {
            let dead = RecordingSink::new();
            register(&registry, &key, &dead, "Gone", Arc::new(BooleanConverter));
        }
        register(
            &registry,
            &DatapointKey::new("ABCD1234", "ch0001", "odp0000"),
            &live,
            "Alive",
            Arc::new(BooleanConverter),
        );

        dispatch_all(
            Arc::clone(&registry),
            vec![
                DatapointEvent::new(key, "1"),
                DatapointEvent::new(
                    DatapointKey::new("ABCD1234", "ch0001", "odp0000"),
                    "1",
                ),
            ],
        )
        .await;

        assert_eq!(
            live.updates(),
            vec![(ChannelRef::new("Alive"), HostValue::OnOff(OnOff::On))]
        );
    }

    #[tokio::test]
    async fn run_surfaces_connection_lost() {
        let registry = Arc::new(DatapointRegistry::new());
        let dispatcher = EventDispatcher::new(registry, &DispatchConfig::default());

        let (tx, rx) = mpsc::channel::<DatapointEvent>(1);
        drop(tx);

        let result = dispatcher.run(rx).await;
        assert_eq!(result, Err(DispatchError::ConnectionLost));
    }

    #[test]
    fn shard_index_is_stable_per_key() {
        let key = DatapointKey::new("ABCD1234", "ch0000", "odp0001");
        let first = shard_index(&key, 4);
        for _ in 0..10 {
            assert_eq!(shard_index(&key, 4), first);
        }
    }
}
