//! REST API channel.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use secrecy::ExposeSecret;

use super::{Channel, ChannelKind, RawResponse};
use crate::error::ChannelError;
use crate::target::DeviceTarget;

/// RESTCONF path exposing the system version container.
const VERSION_PATH: &str = "/restconf/data/openconfig-system:system/f5-system-version:version";

/// YANG-data media type required by the API gateway.
const YANG_JSON: &str = "application/yang-data+json";

/// Retrieves version facts with one HTTPS GET against the RESTCONF API.
///
/// Non-success statuses map to errors by class: 401/403 are
/// authentication failures, everything else non-200 is a transport
/// error. A body that is not JSON is an unexpected-format failure.
pub struct RestChannel {
    name: String,
    path: String,
    request_timeout: Duration,
}

impl RestChannel {
    pub fn new() -> Self {
        Self {
            name: ChannelKind::Rest.as_str().to_string(),
            path: VERSION_PATH.to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }

    /// Override the channel name used to tag results.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the RESTCONF path (for API version drift).
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Bound the HTTP request (default: 15s).
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn url(&self, target: &DeviceTarget) -> String {
        format!("https://{}:{}{}", target.host, target.rest.port, self.path)
    }
}

/// Map a response status onto the channel error kinds: 401/403 are
/// authentication failures, any other non-200 is a transport error.
fn classify_status(status: StatusCode, user: &str) -> Option<ChannelError> {
    match status {
        StatusCode::OK => None,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Some(ChannelError::AuthFailure {
            user: user.to_string(),
        }),
        _ => Some(ChannelError::transport(format!(
            "unexpected HTTP status {status}"
        ))),
    }
}

/// Tag reqwest failures with the bound that applied, so client-side
/// timeouts report the configured duration instead of an unknown one.
fn classify_request_error(err: reqwest::Error, timeout: Duration) -> ChannelError {
    if err.is_timeout() {
        ChannelError::Timeout(timeout)
    } else {
        err.into()
    }
}

impl Default for RestChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for RestChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Rest
    }

    async fn fetch(&self, target: &DeviceTarget) -> Result<RawResponse, ChannelError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(target.rest.accept_invalid_certs)
            .timeout(self.request_timeout)
            .build()?;

        let url = self.url(target);
        debug!("GET {}", url);

        let response = client
            .get(&url)
            .basic_auth(
                &target.rest.username,
                Some(target.rest.password.expose_secret()),
            )
            .header(ACCEPT, YANG_JSON)
            .header(CONTENT_TYPE, YANG_JSON)
            .send()
            .await
            .map_err(|e| classify_request_error(e, self.request_timeout))?;

        if let Some(err) = classify_status(response.status(), &target.rest.username) {
            return Err(err);
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_request_error(e, self.request_timeout))?;
        let json: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            ChannelError::unexpected_format(format!("response body is not JSON: {e}"))
        })?;

        Ok(RawResponse::json(&self.name, json))
    }
}
