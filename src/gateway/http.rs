// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport against the System Access Point local REST API.
//!
//! Datapoints are addressed as
//! `/fhapi/v1/api/rest/datapoint/{sysap}/{device}.{channel}.{datapoint}`;
//! a `GET` returns the current raw value, a `PUT` of the raw value
//! performs a write. All calls share one [`reqwest::Client`], which
//! multiplexes concurrent requests over its connection pool.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::catalog::{ChannelId, DatapointId, DeviceId};
use crate::error::GatewayError;

use super::DatapointTransport;

/// The default access point identifier of a standalone SysAP.
const DEFAULT_SYSAP: &str = "00000000-0000-0000-0000-000000000000";

/// Configuration for the SysAP HTTP transport.
///
/// # Examples
///
/// ```
/// use sysap_lib::gateway::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("192.168.1.2")
///     .with_credentials("installer", "secret")
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: u16,
    use_https: bool,
    sysap: String,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl HttpConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default HTTPS port.
    pub const DEFAULT_HTTPS_PORT: u16 = 443;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new configuration for the specified SysAP host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            use_https: false,
            sysap: DEFAULT_SYSAP.to_string(),
            credentials: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables HTTPS.
    ///
    /// If port hasn't been explicitly set, it will be changed to 443.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        if self.port == Self::DEFAULT_PORT {
            self.port = Self::DEFAULT_HTTPS_PORT;
        }
        self
    }

    /// Sets the access point identifier used in datapoint paths.
    #[must_use]
    pub fn with_sysap(mut self, sysap: impl Into<String>) -> Self {
        self.sysap = sysap.into();
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the access point identifier.
    #[must_use]
    pub fn sysap(&self) -> &str {
        &self.sysap
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        let port_suffix =
            if (self.use_https && self.port == 443) || (!self.use_https && self.port == 80) {
                String::new()
            } else {
                format!(":{}", self.port)
            };
        format!("{scheme}://{}{port_suffix}", self.host)
    }

    /// Creates an [`HttpTransport`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unavailable`] if the HTTP client cannot be
    /// created.
    pub fn into_transport(self) -> Result<HttpTransport, GatewayError> {
        let base_url = self.base_url();

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpTransport {
            base_url,
            sysap: self.sysap,
            credentials: self.credentials,
            client,
        })
    }
}

/// HTTP implementation of [`DatapointTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    sysap: String,
    credentials: Option<(String, String)>,
    client: Client,
}

impl HttpTransport {
    /// Returns the base URL of the access point.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the REST path for a datapoint.
    fn datapoint_url(
        &self,
        device: &DeviceId,
        channel: &ChannelId,
        datapoint: &DatapointId,
    ) -> String {
        format!(
            "{}/fhapi/v1/api/rest/datapoint/{}/{}.{}.{}",
            self.base_url,
            urlencoding::encode(&self.sysap),
            urlencoding::encode(device.as_str()),
            urlencoding::encode(channel.as_str()),
            urlencoding::encode(datapoint.as_str()),
        )
    }

    fn request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some((username, password)) => request.basic_auth(username, Some(password)),
            None => request,
        }
    }
}

impl DatapointTransport for HttpTransport {
    async fn read_datapoint(
        &self,
        device: &DeviceId,
        channel: &ChannelId,
        datapoint: &DatapointId,
    ) -> Result<String, GatewayError> {
        let url = self.datapoint_url(device, channel, datapoint);
        tracing::debug!(url = %url, "Reading datapoint");

        let response = self
            .request(self.client.get(&url))
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        check_status(response.status())?;

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        let parsed: BTreeMap<String, ReadResponse> = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Unavailable(format!("malformed gateway response: {e}")))?;

        parsed
            .into_values()
            .next()
            .and_then(|entry| entry.values.into_iter().next())
            .ok_or_else(|| GatewayError::Rejected("no value in gateway response".to_string()))
    }

    async fn write_datapoint(
        &self,
        device: &DeviceId,
        channel: &ChannelId,
        datapoint: &DatapointId,
        value: &str,
    ) -> Result<(), GatewayError> {
        let url = self.datapoint_url(device, channel, datapoint);
        tracing::debug!(url = %url, value = %value, "Writing datapoint");

        let response = self
            .request(self.client.put(&url).body(value.to_string()))
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        check_status(response.status())
    }
}

/// Maps an HTTP status to the gateway error taxonomy.
fn check_status(status: StatusCode) -> Result<(), GatewayError> {
    if status.is_success() {
        return Ok(());
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(GatewayError::Rejected("authentication failed".to_string()));
    }

    let description = format!(
        "HTTP {} - {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    );

    if status.is_client_error() {
        Err(GatewayError::Rejected(description))
    } else {
        Err(GatewayError::Unavailable(description))
    }
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    #[serde(default)]
    values: Vec<String>,
}
