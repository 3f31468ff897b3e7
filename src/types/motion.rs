// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Movement command types for shutter-style channels.

use std::fmt;

/// Direction for a shutter movement command.
///
/// The bus encodes up as `"0"` and down as `"1"` on the movement
/// datapoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpDown {
    /// Move the shutter up (open).
    Up,
    /// Move the shutter down (close).
    Down,
}

impl UpDown {
    /// Returns the raw bus encoding of this direction.
    #[must_use]
    pub fn raw_value(&self) -> &'static str {
        match self {
            Self::Up => "0",
            Self::Down => "1",
        }
    }
}

impl fmt::Display for UpDown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
        }
    }
}

/// Stop or resume command for a moving shutter.
///
/// The bus encodes stop as `"0"` and move as `"1"` on the step
/// datapoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopMove {
    /// Halt the current movement.
    Stop,
    /// Resume movement.
    Move,
}

impl StopMove {
    /// Returns the raw bus encoding of this command.
    #[must_use]
    pub fn raw_value(&self) -> &'static str {
        match self {
            Self::Stop => "0",
            Self::Move => "1",
        }
    }
}

impl fmt::Display for StopMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => write!(f, "STOP"),
            Self::Move => write!(f, "MOVE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_down_raw_values() {
        assert_eq!(UpDown::Up.raw_value(), "0");
        assert_eq!(UpDown::Down.raw_value(), "1");
    }

    #[test]
    fn stop_move_raw_values() {
        assert_eq!(StopMove::Stop.raw_value(), "0");
        assert_eq!(StopMove::Move.raw_value(), "1");
    }

    #[test]
    fn display() {
        assert_eq!(UpDown::Up.to_string(), "UP");
        assert_eq!(StopMove::Stop.to_string(), "STOP");
    }
}
