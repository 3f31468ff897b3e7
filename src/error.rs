// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `SysAp` library.
//!
//! This module provides the error hierarchy for handling failures across
//! the library: value conversion, gateway communication, event dispatch,
//! handler lifecycle, and device catalog parsing.

use thiserror::Error;

/// The main error type for this library.
///
/// This enum encompasses all possible errors that can occur when
/// integrating free@home devices through a System Access Point.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred while converting a raw datapoint value.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Error occurred while communicating with the gateway.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Error occurred in the event dispatch loop.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Error occurred during handler lifecycle or command handling.
    #[error("handler error: {0}")]
    Handler(#[from] HandlerError),

    /// Error occurred while parsing the device catalog.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Errors related to decoding or encoding raw datapoint values.
///
/// Conversion failures are non-fatal by contract: callers either drop the
/// single affected delivery or substitute the converter's fallback value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The raw value is not parseable as an integer.
    #[error("raw value {raw:?} is not a valid integer")]
    InvalidInteger {
        /// The raw value that failed to parse.
        raw: String,
    },

    /// The raw value is not parseable as a decimal number.
    #[error("raw value {raw:?} is not a valid decimal")]
    InvalidDecimal {
        /// The raw value that failed to parse.
        raw: String,
    },

    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The actual value that was provided.
        actual: i64,
    },

    /// The host value has the wrong variant for this converter.
    #[error("converter expected a {expected} value")]
    TypeMismatch {
        /// The variant the converter operates on.
        expected: &'static str,
    },
}

/// Errors reported by the command gateway.
///
/// `Unavailable` covers transient transport failures including timeouts;
/// reads may be retried on it, writes never are. `Rejected` means the
/// gateway explicitly refused the request and retrying cannot help.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway could not be reached or did not answer in time.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    /// The gateway refused the request (bad address or malformed value).
    #[error("gateway rejected the request: {0}")]
    Rejected(String),
}

impl GatewayError {
    /// Returns `true` if the failure is transient and a read may retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors surfaced by the event dispatcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The inbound event stream disconnected.
    ///
    /// The dispatcher never reconnects on its own; this is surfaced to the
    /// supervising caller of [`EventDispatcher::run`](crate::dispatch::EventDispatcher::run).
    #[error("inbound event stream disconnected")]
    ConnectionLost,
}

/// Errors related to device handler lifecycle and command handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The bridge has no running dispatcher, so state updates cannot be
    /// registered. The handler goes offline instead of crashing.
    #[error("no event dispatch available for state update registration")]
    RegistrationUnavailable,

    /// The command kind is not within the channel's declared capability.
    #[error("command kind {kind:?} is not supported by this channel")]
    UnsupportedCommand {
        /// Name of the rejected command kind.
        kind: &'static str,
    },

    /// No binding exists for the addressed host channel.
    #[error("no binding for host channel {channel:?}")]
    NoSuchChannel {
        /// The host channel reference that failed to resolve.
        channel: String,
    },

    /// The underlying gateway call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Encoding a command value for the wire failed.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Errors related to parsing the device catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the catalog document.
    #[error("missing field in catalog: {0}")]
    MissingField(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
