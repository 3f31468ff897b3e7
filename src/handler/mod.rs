// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generic device handler.
//!
//! One [`DeviceHandler`] serves every supported device type; the
//! per-type differences (channels, datapoints, converters, capabilities)
//! live in its [`ThingDescriptor`]. The handler walks a small lifecycle:
//!
//! - **Uninitialized** → [`initialize`](DeviceHandler::initialize) seeds
//!   host state from the gateway and registers its state datapoints with
//!   the bridge's registry. Success means **Online**; a bridge without
//!   running dispatch means **Offline** with a diagnostic reason, never a
//!   silent failure.
//! - **Online** → [`handle_command`](DeviceHandler::handle_command)
//!   validates the command against the descriptor, encodes it through the
//!   channel's converter and writes it to the gateway. A failed write is
//!   surfaced to the caller and never retried; the handler stays online.
//!   Dispatcher-delivered values do not pass through the handler at all:
//!   the registry feeds the host sink directly.
//! - Any state → [`dispose`](DeviceHandler::dispose) cancels the pending
//!   trigger reset and unregisters every datapoint, so late events cannot
//!   reach a disposed handler.
//!
//! # Trigger auto-reset
//!
//! Scene channels are momentary: after a trigger write the handler echoes
//! on, then resets the host state to off after [`TRIGGER_RESET_DELAY`]
//! without blocking command handling. A second trigger cancels the
//! pending reset and restarts the full delay.

mod descriptor;

pub use descriptor::{
    ChannelRole, CommandKind, DIM_SWITCH_CHANNEL, DIM_VALUE_CHANNEL, MEASURED_TEMPERATURE_CHANNEL,
    PointBinding, RING_STATE_CHANNEL, RULE_SWITCH_CHANNEL, SCENE_TRIGGER_CHANNEL, SHUTTER_MOVE_CHANNEL,
    SHUTTER_POS_CHANNEL, SWITCH_CHANNEL, TARGET_TEMPERATURE_CHANNEL, ThingDescriptor,
    WINDOW_STATE_CHANNEL,
};

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::bridge::Bridge;
use crate::catalog::{ChannelDescription, ChannelId, DatapointKey, DeviceDescription, DeviceId};
use crate::error::HandlerError;
use crate::gateway::DatapointTransport;
use crate::host::{ChannelRef, HandlerStatus, OfflineReason, StateSink};
use crate::types::{HostValue, OnOff, Percent, StopMove, UpDown};

/// Delay before a trigger channel resets to off.
pub const TRIGGER_RESET_DELAY: Duration = Duration::from_secs(3);

/// A command issued by the host against one of a handler's channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostCommand {
    /// Re-read the channel state from the gateway.
    Refresh,
    /// Switch on or off.
    OnOff(OnOff),
    /// Move a shutter up or down.
    UpDown(UpDown),
    /// Stop or resume shutter movement.
    StopMove(StopMove),
    /// Set a percentage position or level.
    Percent(Percent),
    /// Set a decimal setpoint.
    SetPoint(f64),
}

impl HostCommand {
    /// Returns the command's kind for capability checks.
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Refresh => CommandKind::Refresh,
            Self::OnOff(_) => CommandKind::OnOff,
            Self::UpDown(_) => CommandKind::UpDown,
            Self::StopMove(_) => CommandKind::StopMove,
            Self::Percent(_) => CommandKind::Percent,
            Self::SetPoint(_) => CommandKind::SetPoint,
        }
    }
}

/// Handler for one bus channel, driven by a [`ThingDescriptor`].
pub struct DeviceHandler<T> {
    device: DeviceId,
    channel: ChannelId,
    descriptor: ThingDescriptor,
    bridge: Bridge<T>,
    sink: Arc<dyn StateSink>,
    status: RwLock<HandlerStatus>,
    registered: Mutex<Vec<DatapointKey>>,
    reset_task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: DatapointTransport> DeviceHandler<T> {
    /// Creates a handler for a device channel with an explicit descriptor.
    #[must_use]
    pub fn new(
        device: DeviceId,
        channel: ChannelId,
        descriptor: ThingDescriptor,
        bridge: Bridge<T>,
        sink: Arc<dyn StateSink>,
    ) -> Self {
        Self {
            device,
            channel,
            descriptor,
            bridge,
            sink,
            status: RwLock::new(HandlerStatus::Uninitialized),
            registered: Mutex::new(Vec::new()),
            reset_task: Mutex::new(None),
        }
    }

    /// Creates a handler for a catalog channel, or `None` if the channel's
    /// thing type is not supported.
    #[must_use]
    pub fn from_catalog(
        device: &DeviceDescription,
        channel: &ChannelDescription,
        bridge: Bridge<T>,
        sink: Arc<dyn StateSink>,
    ) -> Option<Self> {
        let descriptor = ThingDescriptor::for_thing_type(channel.thing_type())?;
        Some(Self::new(
            device.id().clone(),
            channel.id().clone(),
            descriptor,
            bridge,
            sink,
        ))
    }

    /// Returns the bus device this handler serves.
    #[must_use]
    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    /// Returns the bus channel this handler serves.
    #[must_use]
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Returns the handler's descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &ThingDescriptor {
        &self.descriptor
    }

    /// Returns the current lifecycle status.
    #[must_use]
    pub fn status(&self) -> HandlerStatus {
        self.status.read().clone()
    }

    fn set_status(&self, status: HandlerStatus) {
        *self.status.write() = status.clone();
        self.sink.update_status(status);
    }

    /// Initializes the handler: seeds host state and registers for push
    /// updates.
    ///
    /// Without a running dispatcher on the bridge the handler goes
    /// offline with a registration-unavailable diagnostic. Seed reads are
    /// best effort; a gateway failure skips the seed but does not prevent
    /// the handler from going online.
    pub async fn initialize(&self) {
        let Some(registry) = self.bridge.registry() else {
            tracing::warn!(device = %self.device, "No event dispatch available");
            self.set_status(HandlerStatus::Offline(OfflineReason::RegistrationUnavailable));
            return;
        };

        for binding in self.descriptor.bindings() {
            if !binding.seeds_state() {
                continue;
            }
            let Some(datapoint) = binding.state_datapoint() else {
                continue;
            };

            match self
                .bridge
                .gateway()
                .read_datapoint(&self.device, &self.channel, datapoint)
                .await
            {
                Ok(raw) => {
                    // Unparseable seeds fall back to the converter default.
                    let value = binding.converter().decode_or_fallback(&raw);
                    self.sink.update_state(binding.target(), value);
                }
                Err(error) => {
                    tracing::warn!(
                        device = %self.device,
                        datapoint = %datapoint,
                        %error,
                        "Skipping state seed"
                    );
                }
            }
        }

        {
            let mut registered = self.registered.lock();
            for binding in self.descriptor.bindings() {
                let Some(datapoint) = binding.state_datapoint() else {
                    continue;
                };
                let key = DatapointKey::new(
                    self.device.clone(),
                    self.channel.clone(),
                    datapoint.clone(),
                );
                registry.register_channel(
                    key.clone(),
                    Arc::downgrade(&self.sink),
                    binding.target().clone(),
                    Arc::clone(binding.converter()),
                );
                registered.push(key);
            }
        }

        tracing::debug!(device = %self.device, channel = %self.channel, "Device online");
        self.set_status(HandlerStatus::Online);
    }

    /// Handles a host command against one of this handler's channels.
    ///
    /// The command kind is validated against the descriptor's declared
    /// capability for the channel. Value-carrying commands are encoded
    /// through the channel's converter; movement commands carry their
    /// fixed wire encoding. On a successful write the commanded value is
    /// echoed to the host sink; the authoritative value still arrives
    /// over the event path.
    ///
    /// # Errors
    ///
    /// - [`HandlerError::NoSuchChannel`] if no binding serves the channel.
    /// - [`HandlerError::UnsupportedCommand`] if the kind is outside the
    ///   channel's capability.
    /// - [`HandlerError::Gateway`] if the write fails. The commanded
    ///   value is *not* echoed, the write is *not* retried, and the
    ///   handler stays online; after a timeout the physical state is
    ///   unknown.
    pub async fn handle_command(
        &self,
        target: &ChannelRef,
        command: HostCommand,
    ) -> Result<(), HandlerError> {
        tracing::debug!(
            device = %self.device,
            channel = %target,
            ?command,
            "Handling command"
        );

        if command == HostCommand::Refresh {
            return self.refresh(target).await;
        }

        let kind = command.kind();
        let Some(binding) = self.descriptor.binding_for_command(target, kind) else {
            if self.descriptor.has_target(target) {
                return Err(HandlerError::UnsupportedCommand { kind: kind.name() });
            }
            return Err(HandlerError::NoSuchChannel {
                channel: target.to_string(),
            });
        };

        // Triggers are momentary: an off command only resets host state.
        if binding.role() == ChannelRole::Trigger && command == HostCommand::OnOff(OnOff::Off) {
            self.sink
                .update_state(binding.target(), HostValue::OnOff(OnOff::Off));
            return Ok(());
        }

        let Some(datapoint) = binding.command_datapoint() else {
            return Err(HandlerError::UnsupportedCommand { kind: kind.name() });
        };

        let (raw, echo) = encode_command(binding, command)?;

        self.bridge
            .gateway()
            .write_datapoint(&self.device, &self.channel, datapoint, &raw)
            .await?;

        if let Some(value) = echo {
            self.sink.update_state(binding.target(), value);
        }

        if self.descriptor.auto_reset() && binding.role() == ChannelRole::Trigger {
            self.schedule_reset(binding.target().clone());
        }

        Ok(())
    }

    /// Re-reads a channel's state datapoint and updates the host.
    async fn refresh(&self, target: &ChannelRef) -> Result<(), HandlerError> {
        let Some(binding) = self.descriptor.binding_for_refresh(target) else {
            if self.descriptor.has_target(target) {
                return Err(HandlerError::UnsupportedCommand {
                    kind: CommandKind::Refresh.name(),
                });
            }
            return Err(HandlerError::NoSuchChannel {
                channel: target.to_string(),
            });
        };

        // binding_for_refresh only returns bindings with a state datapoint
        let Some(datapoint) = binding.state_datapoint() else {
            return Err(HandlerError::UnsupportedCommand {
                kind: CommandKind::Refresh.name(),
            });
        };

        let raw = self
            .bridge
            .gateway()
            .read_datapoint(&self.device, &self.channel, datapoint)
            .await?;

        let value = binding.converter().decode_or_fallback(&raw);
        self.sink.update_state(binding.target(), value);
        Ok(())
    }

    /// Schedules the delayed trigger reset, cancelling a pending one.
    fn schedule_reset(&self, target: ChannelRef) {
        let sink = Arc::downgrade(&self.sink);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(TRIGGER_RESET_DELAY).await;
            if let Some(sink) = sink.upgrade() {
                sink.update_state(&target, HostValue::OnOff(OnOff::Off));
            }
        });

        if let Some(previous) = self.reset_task.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Disposes the handler: cancels the pending trigger reset and
    /// unregisters every datapoint this handler registered.
    ///
    /// Must be called before dropping the handler; afterwards late
    /// events no longer reach it and it can be re-initialized or
    /// discarded.
    pub fn dispose(&self) {
        if let Some(task) = self.reset_task.lock().take() {
            task.abort();
        }

        if let Some(registry) = self.bridge.registry() {
            for key in self.registered.lock().drain(..) {
                registry.unregister_channel(&key);
            }
        }

        *self.status.write() = HandlerStatus::Uninitialized;
        tracing::debug!(device = %self.device, "Device handler removed");
    }
}

impl<T> std::fmt::Debug for DeviceHandler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandler")
            .field("device", &self.device)
            .field("channel", &self.channel)
            .field("thing_type", &self.descriptor.thing_type())
            .field("status", &*self.status.read())
            .finish_non_exhaustive()
    }
}

/// Encodes a value-carrying command for the wire.
///
/// Returns the raw string to write and the host value to echo on
/// success. Movement commands have no host-value representation; their
/// echo is `None` and the position arrives via the event path.
fn encode_command(
    binding: &PointBinding,
    command: HostCommand,
) -> Result<(String, Option<HostValue>), HandlerError> {
    match command {
        HostCommand::OnOff(state) => {
            let value = HostValue::OnOff(state);
            let raw = binding.converter().encode(&value)?;
            Ok((raw, Some(value)))
        }
        HostCommand::Percent(percent) => {
            // Brightness channels carry their level as a plain decimal.
            let value = match binding.role() {
                ChannelRole::Brightness => HostValue::Decimal(f64::from(percent.value())),
                _ => HostValue::Percent(percent),
            };
            let raw = binding.converter().encode(&value)?;
            Ok((raw, Some(value)))
        }
        HostCommand::SetPoint(setpoint) => {
            let value = HostValue::Decimal(setpoint);
            let raw = binding.converter().encode(&value)?;
            Ok((raw, Some(value)))
        }
        HostCommand::UpDown(direction) => Ok((direction.raw_value().to_string(), None)),
        HostCommand::StopMove(motion) => Ok((motion.raw_value().to_string(), None)),
        HostCommand::Refresh => Err(HandlerError::UnsupportedCommand {
            kind: CommandKind::Refresh.name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DatapointId;
    use crate::dispatch::DispatchConfig;
    use crate::error::GatewayError;
    use crate::event::DatapointEvent;
    use crate::gateway::{GatewayClient, RetryPolicy};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::mpsc;

    struct MockTransport {
        reads: Mutex<HashMap<String, String>>,
        writes: Mutex<Vec<(String, String)>>,
        write_error: Mutex<Option<GatewayError>>,
        write_calls: AtomicU32,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                reads: Mutex::new(HashMap::new()),
                writes: Mutex::new(Vec::new()),
                write_error: Mutex::new(None),
                write_calls: AtomicU32::new(0),
            }
        }

        fn with_read(self, address: &str, raw: &str) -> Self {
            self.reads
                .lock()
                .insert(address.to_string(), raw.to_string());
            self
        }

        fn with_write_error(self, error: GatewayError) -> Self {
            *self.write_error.lock() = Some(error);
            self
        }
    }

    impl DatapointTransport for MockTransport {
        async fn read_datapoint(
            &self,
            device: &DeviceId,
            channel: &ChannelId,
            datapoint: &DatapointId,
        ) -> Result<String, GatewayError> {
            let address = format!("{device}/{channel}/{datapoint}");
            self.reads
                .lock()
                .get(&address)
                .cloned()
                .ok_or_else(|| GatewayError::Unavailable("no value".to_string()))
        }

        async fn write_datapoint(
            &self,
            device: &DeviceId,
            channel: &ChannelId,
            datapoint: &DatapointId,
            value: &str,
        ) -> Result<(), GatewayError> {
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(error) = self.write_error.lock().clone() {
                return Err(error);
            }
            self.writes
                .lock()
                .push((format!("{device}/{channel}/{datapoint}"), value.to_string()));
            Ok(())
        }
    }

    struct RecordingSink {
        updates: Mutex<Vec<(ChannelRef, HostValue)>>,
        statuses: Mutex<Vec<HandlerStatus>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                updates: Mutex::new(Vec::new()),
                statuses: Mutex::new(Vec::new()),
            })
        }

        fn updates(&self) -> Vec<(ChannelRef, HostValue)> {
            self.updates.lock().clone()
        }

        fn statuses(&self) -> Vec<HandlerStatus> {
            self.statuses.lock().clone()
        }
    }

    impl StateSink for RecordingSink {
        fn update_state(&self, channel: &ChannelRef, value: HostValue) {
            self.updates.lock().push((channel.clone(), value));
        }

        fn update_status(&self, status: HandlerStatus) {
            self.statuses.lock().push(status);
        }
    }

    fn bridge(transport: MockTransport) -> Bridge<MockTransport> {
        Bridge::new(GatewayClient::new(transport).with_read_retry(RetryPolicy::no_retry()))
    }

    fn started_bridge(
        transport: MockTransport,
    ) -> (Bridge<MockTransport>, mpsc::Sender<DatapointEvent>) {
        let bridge = bridge(transport);
        let (tx, rx) = mpsc::channel(16);
        let _handle = bridge.start_dispatch(rx, &DispatchConfig::default());
        (bridge, tx)
    }

    fn handler(
        bridge: &Bridge<MockTransport>,
        descriptor: ThingDescriptor,
        sink: &Arc<RecordingSink>,
    ) -> DeviceHandler<MockTransport> {
        DeviceHandler::new(
            DeviceId::new("ABCD1234"),
            ChannelId::new("ch0000"),
            descriptor,
            bridge.clone(),
            Arc::clone(sink) as Arc<dyn StateSink>,
        )
    }

    #[tokio::test]
    async fn initialize_without_dispatch_goes_offline() {
        let bridge = bridge(MockTransport::new());
        let sink = RecordingSink::new();
        let handler = handler(&bridge, ThingDescriptor::switch_actuator(), &sink);

        handler.initialize().await;

        assert_eq!(
            handler.status(),
            HandlerStatus::Offline(OfflineReason::RegistrationUnavailable)
        );
        assert_eq!(
            sink.statuses(),
            vec![HandlerStatus::Offline(OfflineReason::RegistrationUnavailable)]
        );
    }

    #[tokio::test]
    async fn initialize_seeds_state_and_registers() {
        let transport = MockTransport::new().with_read("ABCD1234/ch0000/odp0001", "42");
        let (bridge, _tx) = started_bridge(transport);
        let sink = RecordingSink::new();
        let handler = handler(&bridge, ThingDescriptor::dimming_actuator(), &sink);

        handler.initialize().await;

        assert_eq!(handler.status(), HandlerStatus::Online);
        assert_eq!(
            sink.updates(),
            vec![(ChannelRef::new(DIM_VALUE_CHANNEL), HostValue::Decimal(42.0))]
        );
        // Both state datapoints (odp0000, odp0001) are subscribed.
        assert_eq!(bridge.registry().unwrap().key_count(), 2);
    }

    #[tokio::test]
    async fn failed_seed_read_is_not_fatal() {
        let (bridge, _tx) = started_bridge(MockTransport::new());
        let sink = RecordingSink::new();
        let handler = handler(&bridge, ThingDescriptor::switch_actuator(), &sink);

        handler.initialize().await;

        assert_eq!(handler.status(), HandlerStatus::Online);
        assert!(sink.updates().is_empty());
    }

    #[tokio::test]
    async fn on_command_writes_and_echoes() {
        let (bridge, _tx) = started_bridge(MockTransport::new());
        let sink = RecordingSink::new();
        let handler = handler(&bridge, ThingDescriptor::switch_actuator(), &sink);
        handler.initialize().await;

        handler
            .handle_command(&ChannelRef::new(SWITCH_CHANNEL), HostCommand::OnOff(OnOff::On))
            .await
            .unwrap();

        assert_eq!(
            *bridge.gateway().transport().writes.lock(),
            vec![("ABCD1234/ch0000/idp0000".to_string(), "1".to_string())]
        );
        assert_eq!(
            sink.updates(),
            vec![(ChannelRef::new(SWITCH_CHANNEL), HostValue::OnOff(OnOff::On))]
        );
    }

    #[tokio::test]
    async fn write_failure_surfaces_without_echo_or_retry() {
        let transport =
            MockTransport::new().with_write_error(GatewayError::Unavailable("down".to_string()));
        let (bridge, _tx) = started_bridge(transport);
        let sink = RecordingSink::new();
        let handler = handler(&bridge, ThingDescriptor::switch_actuator(), &sink);
        handler.initialize().await;
        let updates_before = sink.updates().len();

        let error = handler
            .handle_command(&ChannelRef::new(SWITCH_CHANNEL), HostCommand::OnOff(OnOff::On))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            HandlerError::Gateway(GatewayError::Unavailable(_))
        ));
        // No state echo, exactly one attempt, handler stays online.
        assert_eq!(sink.updates().len(), updates_before);
        assert_eq!(
            bridge
                .gateway()
                .transport()
                .write_calls
                .load(Ordering::SeqCst),
            1
        );
        assert_eq!(handler.status(), HandlerStatus::Online);
    }

    #[tokio::test]
    async fn percentage_on_switch_is_unsupported() {
        let (bridge, _tx) = started_bridge(MockTransport::new());
        let sink = RecordingSink::new();
        let handler = handler(&bridge, ThingDescriptor::switch_actuator(), &sink);
        handler.initialize().await;

        let error = handler
            .handle_command(
                &ChannelRef::new(SWITCH_CHANNEL),
                HostCommand::Percent(Percent::new(50).unwrap()),
            )
            .await
            .unwrap_err();

        assert!(matches!(error, HandlerError::UnsupportedCommand { .. }));
    }

    #[tokio::test]
    async fn unknown_channel_is_rejected() {
        let (bridge, _tx) = started_bridge(MockTransport::new());
        let sink = RecordingSink::new();
        let handler = handler(&bridge, ThingDescriptor::switch_actuator(), &sink);
        handler.initialize().await;

        let error = handler
            .handle_command(&ChannelRef::new("Bogus"), HostCommand::OnOff(OnOff::On))
            .await
            .unwrap_err();

        assert!(matches!(error, HandlerError::NoSuchChannel { .. }));
    }

    #[tokio::test]
    async fn refresh_reads_current_state() {
        let transport = MockTransport::new().with_read("ABCD1234/ch0000/odp0000", "1");
        let (bridge, _tx) = started_bridge(transport);
        let sink = RecordingSink::new();
        let handler = handler(&bridge, ThingDescriptor::switch_actuator(), &sink);
        handler.initialize().await;
        let updates_before = sink.updates().len();

        handler
            .handle_command(&ChannelRef::new(SWITCH_CHANNEL), HostCommand::Refresh)
            .await
            .unwrap();

        assert_eq!(
            sink.updates()[updates_before..],
            [(ChannelRef::new(SWITCH_CHANNEL), HostValue::OnOff(OnOff::On))]
        );
    }

    #[tokio::test]
    async fn refresh_falls_back_on_unparseable_value() {
        let transport = MockTransport::new().with_read("ABCD1234/ch0000/odp0001", "garbage");
        let (bridge, _tx) = started_bridge(transport);
        let sink = RecordingSink::new();
        let handler = handler(&bridge, ThingDescriptor::dimming_actuator(), &sink);

        handler
            .handle_command(&ChannelRef::new(DIM_VALUE_CHANNEL), HostCommand::Refresh)
            .await
            .unwrap();

        // Unparseable integers default to zero by documented policy.
        assert_eq!(
            sink.updates(),
            vec![(ChannelRef::new(DIM_VALUE_CHANNEL), HostValue::Decimal(0.0))]
        );
    }

    #[tokio::test]
    async fn shutter_commands_use_fixed_encodings() {
        let (bridge, _tx) = started_bridge(MockTransport::new());
        let sink = RecordingSink::new();
        let handler = handler(&bridge, ThingDescriptor::shutter_actuator(), &sink);
        handler.initialize().await;

        let target = ChannelRef::new(SHUTTER_MOVE_CHANNEL);
        handler
            .handle_command(&target, HostCommand::UpDown(UpDown::Down))
            .await
            .unwrap();
        handler
            .handle_command(&target, HostCommand::StopMove(StopMove::Stop))
            .await
            .unwrap();
        handler
            .handle_command(
                &ChannelRef::new(SHUTTER_POS_CHANNEL),
                HostCommand::Percent(Percent::new(40).unwrap()),
            )
            .await
            .unwrap();

        assert_eq!(
            *bridge.gateway().transport().writes.lock(),
            vec![
                ("ABCD1234/ch0000/idp0000".to_string(), "1".to_string()),
                ("ABCD1234/ch0000/idp0001".to_string(), "0".to_string()),
                ("ABCD1234/ch0000/idp0002".to_string(), "40".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn scene_trigger_resets_after_delay() {
        let (bridge, _tx) = started_bridge(MockTransport::new());
        let sink = RecordingSink::new();
        let handler = handler(&bridge, ThingDescriptor::scene(), &sink);
        handler.initialize().await;

        let target = ChannelRef::new(SCENE_TRIGGER_CHANNEL);
        handler
            .handle_command(&target, HostCommand::OnOff(OnOff::On))
            .await
            .unwrap();

        assert_eq!(
            *bridge.gateway().transport().writes.lock(),
            vec![("ABCD1234/ch0000/odp0000".to_string(), "1".to_string())]
        );
        assert_eq!(
            sink.updates(),
            vec![(target.clone(), HostValue::OnOff(OnOff::On))]
        );

        tokio::time::sleep(TRIGGER_RESET_DELAY + Duration::from_millis(100)).await;

        assert_eq!(
            sink.updates(),
            vec![
                (target.clone(), HostValue::OnOff(OnOff::On)),
                (target, HostValue::OnOff(OnOff::Off)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn second_trigger_restarts_the_reset_delay() {
        let (bridge, _tx) = started_bridge(MockTransport::new());
        let sink = RecordingSink::new();
        let handler = handler(&bridge, ThingDescriptor::scene(), &sink);
        handler.initialize().await;

        let target = ChannelRef::new(SCENE_TRIGGER_CHANNEL);
        handler
            .handle_command(&target, HostCommand::OnOff(OnOff::On))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        handler
            .handle_command(&target, HostCommand::OnOff(OnOff::On))
            .await
            .unwrap();

        // Four seconds after the first trigger, only two seconds have
        // elapsed since the second one: no reset yet.
        tokio::time::sleep(Duration::from_secs(2)).await;
        let resets = sink
            .updates()
            .iter()
            .filter(|(_, v)| *v == HostValue::OnOff(OnOff::Off))
            .count();
        assert_eq!(resets, 0);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let resets = sink
            .updates()
            .iter()
            .filter(|(_, v)| *v == HostValue::OnOff(OnOff::Off))
            .count();
        assert_eq!(resets, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_cancels_pending_reset() {
        let (bridge, _tx) = started_bridge(MockTransport::new());
        let sink = RecordingSink::new();
        let handler = handler(&bridge, ThingDescriptor::scene(), &sink);
        handler.initialize().await;

        let target = ChannelRef::new(SCENE_TRIGGER_CHANNEL);
        handler
            .handle_command(&target, HostCommand::OnOff(OnOff::On))
            .await
            .unwrap();
        handler.dispose();

        tokio::time::sleep(TRIGGER_RESET_DELAY + Duration::from_secs(1)).await;

        // Only the trigger echo; the reset never fired.
        assert_eq!(
            sink.updates(),
            vec![(target, HostValue::OnOff(OnOff::On))]
        );
    }

    #[tokio::test]
    async fn dispose_unregisters_all_datapoints() {
        let (bridge, _tx) = started_bridge(MockTransport::new());
        let sink = RecordingSink::new();
        let handler = handler(&bridge, ThingDescriptor::dimming_actuator(), &sink);
        handler.initialize().await;
        assert_eq!(bridge.registry().unwrap().key_count(), 2);

        handler.dispose();

        assert!(bridge.registry().unwrap().is_empty());
        assert_eq!(handler.status(), HandlerStatus::Uninitialized);
    }

    #[tokio::test]
    async fn from_catalog_builds_supported_types_only() {
        use crate::catalog::DeviceCatalog;

        let catalog = DeviceCatalog::from_json(
            r#"{"devices": {
                "ABCD1234": {
                    "channels": {
                        "ch0000": { "functionID": "7" },
                        "ch0001": { "functionID": "ffff" }
                    }
                }
            }}"#,
        )
        .unwrap();
        let device = catalog.device(&DeviceId::new("ABCD1234")).unwrap();
        let (bridge, _tx) = started_bridge(MockTransport::new());
        let sink = RecordingSink::new();

        let supported = DeviceHandler::from_catalog(
            device,
            device.channel(&ChannelId::new("ch0000")).unwrap(),
            bridge.clone(),
            Arc::clone(&sink) as Arc<dyn StateSink>,
        );
        assert!(supported.is_some());

        let unsupported = DeviceHandler::from_catalog(
            device,
            device.channel(&ChannelId::new("ch0001")).unwrap(),
            bridge,
            Arc::clone(&sink) as Arc<dyn StateSink>,
        );
        assert!(unsupported.is_none());
    }

    #[test]
    fn command_kinds() {
        assert_eq!(HostCommand::Refresh.kind(), CommandKind::Refresh);
        assert_eq!(HostCommand::OnOff(OnOff::On).kind(), CommandKind::OnOff);
        assert_eq!(HostCommand::UpDown(UpDown::Up).kind(), CommandKind::UpDown);
        assert_eq!(
            HostCommand::StopMove(StopMove::Stop).kind(),
            CommandKind::StopMove
        );
        assert_eq!(HostCommand::SetPoint(21.5).kind(), CommandKind::SetPoint);
    }
}
