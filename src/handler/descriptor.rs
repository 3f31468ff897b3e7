// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data-driven descriptors for the supported device types.
//!
//! Instead of one handler struct per device type, a single
//! [`DeviceHandler`](super::DeviceHandler) is parameterized by a
//! [`ThingDescriptor`]: the set of host channels the type exposes, which
//! datapoint each channel commands and subscribes to, and which converter
//! translates its values. The tables in this module encode the free@home
//! datapoint layout per device type.

use std::sync::Arc;

use crate::catalog::{DatapointId, ThingType};
use crate::convert::{BooleanConverter, DecimalConverter, PercentConverter, ValueConverter};
use crate::host::ChannelRef;

/// Host channel name for a switch actuator's on/off state.
pub const SWITCH_CHANNEL: &str = "Switch";
/// Host channel name for a dimmer's on/off state.
pub const DIM_SWITCH_CHANNEL: &str = "DimSwitch";
/// Host channel name for a dimmer's brightness value.
pub const DIM_VALUE_CHANNEL: &str = "DimValue";
/// Host channel name for shutter movement commands.
pub const SHUTTER_MOVE_CHANNEL: &str = "ShutterMove";
/// Host channel name for the shutter position.
pub const SHUTTER_POS_CHANNEL: &str = "ShutterPos";
/// Host channel name for the thermostat setpoint.
pub const TARGET_TEMPERATURE_CHANNEL: &str = "TargetTemperature";
/// Host channel name for the measured room temperature.
pub const MEASURED_TEMPERATURE_CHANNEL: &str = "MeasuredTemperature";
/// Host channel name for a window/door contact.
pub const WINDOW_STATE_CHANNEL: &str = "WindowState";
/// Host channel name for a scene trigger.
pub const SCENE_TRIGGER_CHANNEL: &str = "SceneTrigger";
/// Host channel name for a rule toggle.
pub const RULE_SWITCH_CHANNEL: &str = "RuleSwitch";
/// Host channel name for a door ring sensor.
pub const RING_STATE_CHANNEL: &str = "RingState";

/// The closed set of command kinds a host can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Re-read current state from the gateway.
    Refresh,
    /// Switch on or off.
    OnOff,
    /// Move a shutter up or down.
    UpDown,
    /// Stop or resume shutter movement.
    StopMove,
    /// Set a percentage (position, level).
    Percent,
    /// Set a decimal setpoint (target temperature).
    SetPoint,
}

impl CommandKind {
    /// Returns the kind's name for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Refresh => "refresh",
            Self::OnOff => "on/off",
            Self::UpDown => "up/down",
            Self::StopMove => "stop/move",
            Self::Percent => "percentage",
            Self::SetPoint => "setpoint",
        }
    }
}

/// The functional role a binding plays on its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelRole {
    /// Binary on/off switching.
    Switch,
    /// Dimming level.
    Brightness,
    /// Shutter position.
    Position,
    /// Shutter movement (command only).
    Step,
    /// Shutter stop (command only).
    StopStep,
    /// Temperature setpoint.
    SetPoint,
    /// Measured temperature (state only).
    MeasuredTemperature,
    /// Window/door contact state (state only).
    ContactState,
    /// Momentary trigger (scene, rule).
    Trigger,
    /// Door ring state (state only).
    RingState,
}

impl ChannelRole {
    /// Returns `true` if the role accepts the given command kind.
    #[must_use]
    pub fn accepts(&self, kind: CommandKind) -> bool {
        match self {
            Self::Switch | Self::Trigger => kind == CommandKind::OnOff,
            Self::Brightness | Self::Position => kind == CommandKind::Percent,
            Self::Step => kind == CommandKind::UpDown,
            Self::StopStep => kind == CommandKind::StopMove,
            Self::SetPoint => kind == CommandKind::SetPoint,
            Self::MeasuredTemperature | Self::ContactState | Self::RingState => false,
        }
    }
}

/// Binding of one host channel to its bus datapoints.
///
/// The command datapoint (an input, `idp…`) receives writes; the state
/// datapoint (an output, `odp…`) is subscribed for updates and seeds the
/// initial host state when flagged. Either side may be absent: sensors
/// have no command datapoint, movement commands have no state datapoint.
#[derive(Clone)]
pub struct PointBinding {
    role: ChannelRole,
    target: ChannelRef,
    command_datapoint: Option<DatapointId>,
    state_datapoint: Option<DatapointId>,
    converter: Arc<dyn ValueConverter>,
    seed_state: bool,
}

impl PointBinding {
    /// Returns the binding's role.
    #[must_use]
    pub fn role(&self) -> ChannelRole {
        self.role
    }

    /// Returns the host channel this binding serves.
    #[must_use]
    pub fn target(&self) -> &ChannelRef {
        &self.target
    }

    /// Returns the datapoint commands are written to.
    #[must_use]
    pub fn command_datapoint(&self) -> Option<&DatapointId> {
        self.command_datapoint.as_ref()
    }

    /// Returns the datapoint state updates arrive on.
    #[must_use]
    pub fn state_datapoint(&self) -> Option<&DatapointId> {
        self.state_datapoint.as_ref()
    }

    /// Returns the converter bound to this channel.
    #[must_use]
    pub fn converter(&self) -> &Arc<dyn ValueConverter> {
        &self.converter
    }

    /// Returns `true` if the state datapoint seeds initial host state.
    #[must_use]
    pub fn seeds_state(&self) -> bool {
        self.seed_state
    }
}

impl std::fmt::Debug for PointBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointBinding")
            .field("role", &self.role)
            .field("target", &self.target)
            .field("command_datapoint", &self.command_datapoint)
            .field("state_datapoint", &self.state_datapoint)
            .field("seed_state", &self.seed_state)
            .finish_non_exhaustive()
    }
}

/// Per-device-type descriptor driving the generic handler.
#[derive(Debug, Clone)]
pub struct ThingDescriptor {
    thing_type: ThingType,
    bindings: Vec<PointBinding>,
    auto_reset: bool,
}

impl ThingDescriptor {
    /// Returns the descriptor for a thing type, or `None` for types this
    /// library does not bind.
    #[must_use]
    pub fn for_thing_type(thing_type: ThingType) -> Option<Self> {
        match thing_type {
            ThingType::Actuator => Some(Self::switch_actuator()),
            ThingType::DimmingActuator => Some(Self::dimming_actuator()),
            ThingType::ShutterActuator => Some(Self::shutter_actuator()),
            ThingType::Thermostat => Some(Self::thermostat()),
            ThingType::WindowSensor => Some(Self::window_sensor()),
            ThingType::Scene => Some(Self::scene()),
            ThingType::Rule => Some(Self::rule()),
            ThingType::DoorRingSensor => Some(Self::door_ring_sensor()),
            ThingType::Unknown => None,
        }
    }

    /// Binary switch actuator: one on/off channel.
    #[must_use]
    pub fn switch_actuator() -> Self {
        Self {
            thing_type: ThingType::Actuator,
            bindings: vec![PointBinding {
                role: ChannelRole::Switch,
                target: ChannelRef::new(SWITCH_CHANNEL),
                command_datapoint: Some(DatapointId::new("idp0000")),
                state_datapoint: Some(DatapointId::new("odp0000")),
                converter: Arc::new(BooleanConverter),
                seed_state: true,
            }],
            auto_reset: false,
        }
    }

    /// Dimming actuator: on/off switch plus brightness value.
    #[must_use]
    pub fn dimming_actuator() -> Self {
        Self {
            thing_type: ThingType::DimmingActuator,
            bindings: vec![
                PointBinding {
                    role: ChannelRole::Switch,
                    target: ChannelRef::new(DIM_SWITCH_CHANNEL),
                    command_datapoint: Some(DatapointId::new("idp0000")),
                    state_datapoint: Some(DatapointId::new("odp0000")),
                    converter: Arc::new(BooleanConverter),
                    seed_state: false,
                },
                PointBinding {
                    role: ChannelRole::Brightness,
                    target: ChannelRef::new(DIM_VALUE_CHANNEL),
                    command_datapoint: Some(DatapointId::new("idp0002")),
                    state_datapoint: Some(DatapointId::new("odp0001")),
                    converter: Arc::new(DecimalConverter),
                    seed_state: true,
                },
            ],
            auto_reset: false,
        }
    }

    /// Shutter actuator: movement, stop and position channels.
    #[must_use]
    pub fn shutter_actuator() -> Self {
        Self {
            thing_type: ThingType::ShutterActuator,
            bindings: vec![
                PointBinding {
                    role: ChannelRole::Step,
                    target: ChannelRef::new(SHUTTER_MOVE_CHANNEL),
                    command_datapoint: Some(DatapointId::new("idp0000")),
                    state_datapoint: None,
                    converter: Arc::new(BooleanConverter),
                    seed_state: false,
                },
                PointBinding {
                    role: ChannelRole::StopStep,
                    target: ChannelRef::new(SHUTTER_MOVE_CHANNEL),
                    command_datapoint: Some(DatapointId::new("idp0001")),
                    state_datapoint: None,
                    converter: Arc::new(BooleanConverter),
                    seed_state: false,
                },
                PointBinding {
                    role: ChannelRole::Position,
                    target: ChannelRef::new(SHUTTER_POS_CHANNEL),
                    command_datapoint: Some(DatapointId::new("idp0002")),
                    state_datapoint: Some(DatapointId::new("odp0001")),
                    converter: Arc::new(PercentConverter),
                    seed_state: true,
                },
            ],
            auto_reset: false,
        }
    }

    /// Room temperature controller: setpoint plus measured temperature.
    #[must_use]
    pub fn thermostat() -> Self {
        Self {
            thing_type: ThingType::Thermostat,
            bindings: vec![
                PointBinding {
                    role: ChannelRole::SetPoint,
                    target: ChannelRef::new(TARGET_TEMPERATURE_CHANNEL),
                    command_datapoint: Some(DatapointId::new("idp0002")),
                    state_datapoint: Some(DatapointId::new("odp0006")),
                    converter: Arc::new(DecimalConverter),
                    seed_state: true,
                },
                PointBinding {
                    role: ChannelRole::MeasuredTemperature,
                    target: ChannelRef::new(MEASURED_TEMPERATURE_CHANNEL),
                    command_datapoint: None,
                    state_datapoint: Some(DatapointId::new("odp0010")),
                    converter: Arc::new(DecimalConverter),
                    seed_state: true,
                },
            ],
            auto_reset: false,
        }
    }

    /// Window/door contact sensor: state only.
    #[must_use]
    pub fn window_sensor() -> Self {
        Self {
            thing_type: ThingType::WindowSensor,
            bindings: vec![PointBinding {
                role: ChannelRole::ContactState,
                target: ChannelRef::new(WINDOW_STATE_CHANNEL),
                command_datapoint: None,
                state_datapoint: Some(DatapointId::new("odp0000")),
                converter: Arc::new(BooleanConverter),
                seed_state: true,
            }],
            auto_reset: false,
        }
    }

    /// Scene: trigger-only channel with delayed auto-reset.
    ///
    /// Scenes are virtual devices; the trigger is written to the scene's
    /// own output datapoint, which the bus broadcasts to its members.
    #[must_use]
    pub fn scene() -> Self {
        Self {
            thing_type: ThingType::Scene,
            bindings: vec![PointBinding {
                role: ChannelRole::Trigger,
                target: ChannelRef::new(SCENE_TRIGGER_CHANNEL),
                command_datapoint: Some(DatapointId::new("odp0000")),
                state_datapoint: None,
                converter: Arc::new(BooleanConverter),
                seed_state: false,
            }],
            auto_reset: true,
        }
    }

    /// Automation rule: on trigger plus activation state.
    #[must_use]
    pub fn rule() -> Self {
        Self {
            thing_type: ThingType::Rule,
            bindings: vec![PointBinding {
                role: ChannelRole::Trigger,
                target: ChannelRef::new(RULE_SWITCH_CHANNEL),
                command_datapoint: Some(DatapointId::new("idp0000")),
                state_datapoint: Some(DatapointId::new("odp0000")),
                converter: Arc::new(BooleanConverter),
                seed_state: false,
            }],
            auto_reset: false,
        }
    }

    /// Door ring sensor: state only, updated via push events.
    #[must_use]
    pub fn door_ring_sensor() -> Self {
        Self {
            thing_type: ThingType::DoorRingSensor,
            bindings: vec![PointBinding {
                role: ChannelRole::RingState,
                target: ChannelRef::new(RING_STATE_CHANNEL),
                command_datapoint: None,
                state_datapoint: Some(DatapointId::new("odp0000")),
                converter: Arc::new(BooleanConverter),
                seed_state: false,
            }],
            auto_reset: false,
        }
    }

    /// Returns the described thing type.
    #[must_use]
    pub fn thing_type(&self) -> ThingType {
        self.thing_type
    }

    /// Returns all bindings of this descriptor.
    #[must_use]
    pub fn bindings(&self) -> &[PointBinding] {
        &self.bindings
    }

    /// Returns `true` if triggers reset to off after a delay.
    #[must_use]
    pub fn auto_reset(&self) -> bool {
        self.auto_reset
    }

    /// Returns the command kinds this descriptor accepts.
    #[must_use]
    pub fn capabilities(&self) -> Vec<CommandKind> {
        let mut kinds = Vec::new();
        for binding in &self.bindings {
            for kind in [
                CommandKind::OnOff,
                CommandKind::UpDown,
                CommandKind::StopMove,
                CommandKind::Percent,
                CommandKind::SetPoint,
            ] {
                if binding.role.accepts(kind)
                    && binding.command_datapoint.is_some()
                    && !kinds.contains(&kind)
                {
                    kinds.push(kind);
                }
            }
            if binding.state_datapoint.is_some() && !kinds.contains(&CommandKind::Refresh) {
                kinds.push(CommandKind::Refresh);
            }
        }
        kinds
    }

    /// Finds the binding serving a host channel for a command kind.
    #[must_use]
    pub fn binding_for_command(
        &self,
        target: &ChannelRef,
        kind: CommandKind,
    ) -> Option<&PointBinding> {
        self.bindings
            .iter()
            .find(|b| b.target == *target && b.role.accepts(kind) && b.command_datapoint.is_some())
    }

    /// Finds the refreshable binding of a host channel.
    #[must_use]
    pub fn binding_for_refresh(&self, target: &ChannelRef) -> Option<&PointBinding> {
        self.bindings
            .iter()
            .find(|b| b.target == *target && b.state_datapoint.is_some())
    }

    /// Returns `true` if any binding serves the host channel.
    #[must_use]
    pub fn has_target(&self, target: &ChannelRef) -> bool {
        self.bindings.iter().any(|b| b.target == *target)
    }
}
