// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Converters between raw bus strings and host-native values.
//!
//! Raw datapoint values cross the wire as strings; their numeric or
//! boolean meaning exists only at this boundary. A [`ValueConverter`]
//! is pure and stateless, so a single instance can be shared (as
//! `Arc<dyn ValueConverter>`) across concurrent dispatch calls.
//!
//! # Provided converters
//!
//! | Converter | Raw form | Host form |
//! |-----------|----------|-----------|
//! | [`BooleanConverter`] | `"0"` / `"1"` (any integer) | [`HostValue::OnOff`] |
//! | [`DecimalConverter`] | decimal string | [`HostValue::Decimal`] |
//! | [`PercentConverter`] | integer `0`-`100` | [`HostValue::Percent`] |
//!
//! The set is open for extension: anything implementing [`ValueConverter`]
//! can be bound to a subscription.
//!
//! # Failure policy
//!
//! `decode` is strict and reports [`ConversionError`] for unparseable
//! input. Callers that must not fail (state seeding, refresh) use
//! [`ValueConverter::decode_or_fallback`], which substitutes the
//! converter's documented [`fallback`](ValueConverter::fallback) value
//! (off / `0.0` / `0%`) instead of propagating the error.

mod boolean;
mod decimal;
mod percent;

pub use boolean::BooleanConverter;
pub use decimal::DecimalConverter;
pub use percent::PercentConverter;

use crate::error::ConversionError;
use crate::types::HostValue;

/// Pure transformation between a raw bus string and a host-native value.
///
/// Both directions are total over the declared input domain and report
/// [`ConversionError`] outside it. Implementations must be stateless;
/// they are shared across threads without synchronization.
pub trait ValueConverter: Send + Sync {
    /// Decodes a raw bus value into a host-native value.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] if the raw value is not parseable as
    /// the expected primitive.
    fn decode(&self, raw: &str) -> Result<HostValue, ConversionError>;

    /// Encodes a host-native value into its raw bus form.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::TypeMismatch`] if the value has the
    /// wrong variant for this converter.
    fn encode(&self, value: &HostValue) -> Result<String, ConversionError>;

    /// The value substituted when a caller absorbs a decode failure.
    fn fallback(&self) -> HostValue;

    /// Decodes a raw value, substituting [`fallback`](Self::fallback) on
    /// failure.
    ///
    /// Used on the seeding and refresh paths, where an unparseable value
    /// must not take the handler down. The substitution is logged.
    fn decode_or_fallback(&self, raw: &str) -> HostValue {
        match self.decode(raw) {
            Ok(value) => value,
            Err(error) => {
                let fallback = self.fallback();
                tracing::warn!(raw = %raw, %error, %fallback, "Unparseable raw value, using fallback");
                fallback
            }
        }
    }
}
