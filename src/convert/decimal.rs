// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decimal number converter.

use crate::error::ConversionError;
use crate::types::HostValue;

use super::ValueConverter;

/// Converter between a decimal string and [`HostValue::Decimal`].
///
/// Used for dimming levels and temperatures. Non-finite values (NaN,
/// infinities) are rejected in both directions.
///
/// # Examples
///
/// ```
/// use sysap_lib::convert::{DecimalConverter, ValueConverter};
/// use sysap_lib::types::HostValue;
///
/// let decoded = DecimalConverter.decode("42").unwrap();
/// assert_eq!(decoded, HostValue::Decimal(42.0));
/// assert_eq!(DecimalConverter.encode(&decoded).unwrap(), "42");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalConverter;

impl ValueConverter for DecimalConverter {
    fn decode(&self, raw: &str) -> Result<HostValue, ConversionError> {
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| ConversionError::InvalidDecimal {
                raw: raw.to_string(),
            })?;

        if !value.is_finite() {
            return Err(ConversionError::InvalidDecimal {
                raw: raw.to_string(),
            });
        }

        Ok(HostValue::Decimal(value))
    }

    fn encode(&self, value: &HostValue) -> Result<String, ConversionError> {
        match value {
            HostValue::Decimal(v) if v.is_finite() => Ok(v.to_string()),
            HostValue::Decimal(_) => Err(ConversionError::InvalidDecimal {
                raw: value.to_string(),
            }),
            _ => Err(ConversionError::TypeMismatch { expected: "decimal" }),
        }
    }

    fn fallback(&self) -> HostValue {
        HostValue::Decimal(0.0)
    }
}
