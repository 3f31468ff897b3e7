// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command gateway access.
//!
//! Outbound datapoint reads and writes go through the
//! [`GatewayClient`], a synchronous-looking façade over a
//! [`DatapointTransport`] that adds bounded timeouts and, for reads only,
//! a bounded retry with exponential backoff.
//!
//! # Retry discipline
//!
//! Reads are idempotent and retry on transient
//! [`GatewayError::Unavailable`](crate::error::GatewayError) failures.
//! Writes are **never** retried: a replayed write can double-trigger a
//! physical actuation such as a shutter step. A timed-out write leaves
//! physical state indeterminate; the caller must not assume it either
//! succeeded or failed.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpTransport};

use std::time::Duration;

use crate::catalog::{ChannelId, DatapointId, DeviceId};
use crate::error::GatewayError;

/// Default per-call gateway timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Abstract read/write access to the remote gateway.
///
/// Implementations must accept concurrent calls through `&self`; the
/// underlying connection serializes or multiplexes them safely.
#[allow(async_fn_in_trait)]
pub trait DatapointTransport {
    /// Reads the current raw value of a datapoint.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the gateway cannot be reached or
    /// refuses the request.
    async fn read_datapoint(
        &self,
        device: &DeviceId,
        channel: &ChannelId,
        datapoint: &DatapointId,
    ) -> Result<String, GatewayError>;

    /// Writes a raw value to a datapoint.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the gateway cannot be reached or
    /// refuses the write.
    async fn write_datapoint(
        &self,
        device: &DeviceId,
        channel: &ChannelId,
        datapoint: &DatapointId,
        value: &str,
    ) -> Result<(), GatewayError>;
}

/// Retry policy for idempotent gateway reads.
///
/// `max_attempts` counts the initial try; backoff grows by `multiplier`
/// per retry, capped at `max_interval`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Upper bound on the retry delay.
    pub max_interval: Duration,
    /// Multiplicative backoff factor per retry.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_secs(2),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that fails on the first error.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Returns the backoff delay before the given retry (1-based).
    #[must_use]
    fn backoff(&self, retry: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(retry.saturating_sub(1));
        self.initial_interval
            .saturating_mul(factor)
            .min(self.max_interval)
    }
}

/// Timeout- and retry-bounded façade over a [`DatapointTransport`].
///
/// Calls are independent; any number of device handlers may issue reads
/// and writes concurrently through one shared client.
#[derive(Debug, Clone)]
pub struct GatewayClient<T> {
    transport: T,
    timeout: Duration,
    read_retry: RetryPolicy,
}

impl<T: DatapointTransport> GatewayClient<T> {
    /// Creates a client with default timeout and read retry policy.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            timeout: DEFAULT_TIMEOUT,
            read_retry: RetryPolicy::default(),
        }
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry policy applied to reads.
    #[must_use]
    pub fn with_read_retry(mut self, policy: RetryPolicy) -> Self {
        self.read_retry = policy;
        self
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Reads the current raw value of a datapoint.
    ///
    /// Transient failures (including timeouts) are retried per the
    /// configured [`RetryPolicy`]; a rejection is returned immediately.
    ///
    /// # Errors
    ///
    /// Returns the last [`GatewayError`] once the policy is exhausted.
    pub async fn read_datapoint(
        &self,
        device: &DeviceId,
        channel: &ChannelId,
        datapoint: &DatapointId,
    ) -> Result<String, GatewayError> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let error = match tokio::time::timeout(
                self.timeout,
                self.transport.read_datapoint(device, channel, datapoint),
            )
            .await
            {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(error)) if error.is_transient() => error,
                Ok(Err(error)) => return Err(error),
                Err(_) => timeout_error(self.timeout),
            };

            if attempt >= self.read_retry.max_attempts {
                return Err(error);
            }

            let delay = self.read_retry.backoff(attempt);
            tracing::warn!(
                device = %device,
                datapoint = %datapoint,
                attempt,
                ?delay,
                %error,
                "Read failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Writes a raw value to a datapoint.
    ///
    /// Never retried. On timeout the physical state is indeterminate and
    /// [`GatewayError::Unavailable`] is returned; the caller must not
    /// assume the write succeeded or failed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on any transport failure or rejection.
    pub async fn write_datapoint(
        &self,
        device: &DeviceId,
        channel: &ChannelId,
        datapoint: &DatapointId,
        value: &str,
    ) -> Result<(), GatewayError> {
        tracing::debug!(
            device = %device,
            channel = %channel,
            datapoint = %datapoint,
            value = %value,
            "Writing datapoint"
        );

        match tokio::time::timeout(
            self.timeout,
            self.transport
                .write_datapoint(device, channel, datapoint, value),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(timeout_error(self.timeout)),
        }
    }
}

fn timeout_error(timeout: Duration) -> GatewayError {
    GatewayError::Unavailable(format!(
        "request timed out after {} ms",
        timeout.as_millis()
    ))
}
