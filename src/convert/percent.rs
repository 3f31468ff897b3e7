// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integer percentage converter.

use crate::error::ConversionError;
use crate::types::{HostValue, Percent};

use super::ValueConverter;

/// Converter between an integer percent string and [`HostValue::Percent`].
///
/// Used for shutter positions. Values outside 0-100 are rejected rather
/// than clamped; the bus never legitimately reports them.
///
/// # Examples
///
/// ```
/// use sysap_lib::convert::{PercentConverter, ValueConverter};
/// use sysap_lib::types::{HostValue, Percent};
///
/// let decoded = PercentConverter.decode("40").unwrap();
/// assert_eq!(decoded, HostValue::Percent(Percent::new(40).unwrap()));
/// assert_eq!(PercentConverter.encode(&decoded).unwrap(), "40");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentConverter;

impl ValueConverter for PercentConverter {
    fn decode(&self, raw: &str) -> Result<HostValue, ConversionError> {
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|_| ConversionError::InvalidInteger {
                raw: raw.to_string(),
            })?;

        if !(0..=100).contains(&value) {
            return Err(ConversionError::OutOfRange {
                min: 0,
                max: 100,
                actual: value,
            });
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = Percent::new(value as u8)?;
        Ok(HostValue::Percent(percent))
    }

    fn encode(&self, value: &HostValue) -> Result<String, ConversionError> {
        match value {
            HostValue::Percent(v) => Ok(v.value().to_string()),
            _ => Err(ConversionError::TypeMismatch { expected: "percent" }),
        }
    }

    fn fallback(&self) -> HostValue {
        HostValue::Percent(Percent::MIN)
    }
}
