//! Fetch channels: the independent ways of reaching the device.
//!
//! Every channel retrieves the same logical facts over a different
//! management surface. Channels share nothing at runtime; each owns its
//! own connection and fails (or succeeds) on its own.

mod cli;
mod rest;
mod script;

pub use cli::CliSshChannel;
pub use rest::RestChannel;
pub use script::ShellScriptChannel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;
use crate::target::DeviceTarget;

/// Which management surface a channel speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelKind {
    /// HTTPS RESTCONF API.
    Rest,
    /// Vendor CLI over an interactive SSH session.
    CliSsh,
    /// Uploaded shell script executed over SSH.
    ShellScript,
}

impl ChannelKind {
    /// Default channel name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rest => "rest",
            Self::CliSsh => "cli-ssh",
            Self::ShellScript => "shell-script",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One independent way of retrieving device facts.
///
/// `fetch` must be self-contained: open whatever connection the channel
/// needs, retrieve the raw payload, and release the connection. The
/// collector adds the per-channel timeout and catches every error at
/// this boundary.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Name of this channel instance, used to tag results.
    fn name(&self) -> &str;

    /// The management surface this channel speaks.
    fn kind(&self) -> ChannelKind;

    /// Retrieve the raw version payload from the device.
    async fn fetch(&self, target: &DeviceTarget) -> Result<RawResponse, ChannelError>;
}

/// Raw payload from one channel invocation, tagged with its origin.
///
/// Transient: handed straight to [`crate::facts::normalize`].
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Name of the channel that produced this payload.
    pub channel: String,

    /// The payload itself.
    pub payload: Payload,
}

impl RawResponse {
    /// Tag a JSON body with its originating channel.
    pub fn json(channel: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            channel: channel.into(),
            payload: Payload::Json(body),
        }
    }

    /// Tag raw output text with its originating channel.
    pub fn text(channel: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            payload: Payload::Text(output.into()),
        }
    }
}

/// The shape of a channel's raw payload.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Parsed JSON body (REST channel).
    Json(serde_json::Value),

    /// Raw stdout/session text (CLI and script channels).
    Text(String),
}
