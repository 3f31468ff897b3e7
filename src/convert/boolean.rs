// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boolean on/off converter.

use crate::error::ConversionError;
use crate::types::{HostValue, OnOff};

use super::ValueConverter;

/// Converter between the bus integer encoding and [`OnOff`].
///
/// The bus reports binary state as an integer string; `"0"` is off and
/// any non-zero integer is on. Encoding always produces `"0"` or `"1"`.
///
/// # Examples
///
/// ```
/// use sysap_lib::convert::{BooleanConverter, ValueConverter};
/// use sysap_lib::types::{HostValue, OnOff};
///
/// let decoded = BooleanConverter.decode("1").unwrap();
/// assert_eq!(decoded, HostValue::OnOff(OnOff::On));
/// assert_eq!(BooleanConverter.encode(&decoded).unwrap(), "1");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanConverter;

impl ValueConverter for BooleanConverter {
    fn decode(&self, raw: &str) -> Result<HostValue, ConversionError> {
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|_| ConversionError::InvalidInteger {
                raw: raw.to_string(),
            })?;

        Ok(HostValue::OnOff(OnOff::from(value != 0)))
    }

    fn encode(&self, value: &HostValue) -> Result<String, ConversionError> {
        match value {
            HostValue::OnOff(OnOff::On) => Ok("1".to_string()),
            HostValue::OnOff(OnOff::Off) => Ok("0".to_string()),
            _ => Err(ConversionError::TypeMismatch { expected: "on/off" }),
        }
    }

    fn fallback(&self) -> HostValue {
        HostValue::OnOff(OnOff::Off)
    }
}
