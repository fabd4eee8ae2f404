//! Shell-script-over-SSH channel.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use super::{Channel, ChannelKind, RawResponse};
use crate::error::ChannelError;
use crate::target::DeviceTarget;
use crate::transport::{SshTransport, shell_quote};

/// Script payload pushed to the device. Emits `key value` lines in the
/// same order the CLI reports them, so both feed the same extraction.
const VERSION_SCRIPT: &str = "#!/bin/sh\n\
set -e\n\
. /usr/lib/os-release\n\
printf 'os-version %s\\n' \"${VERSION_ID}\"\n\
printf 'service-version %s\\n' \"${BUILD_ID:-${VERSION_ID}}\"\n\
printf 'product %s\\n' \"${NAME}\"\n";

const DEFAULT_REMOTE_PATH: &str = "/tmp/factfetch-version.sh";

/// Retrieves version facts from the appliance's Linux shell.
///
/// Two steps over one SSH connection: upload the fixed script payload,
/// then execute it. A failure at either step short-circuits with that
/// step's error; nothing is retried.
pub struct ShellScriptChannel {
    name: String,
    script: String,
    remote_path: String,
    step_timeout: Duration,
}

impl ShellScriptChannel {
    pub fn new() -> Self {
        Self {
            name: ChannelKind::ShellScript.as_str().to_string(),
            script: VERSION_SCRIPT.to_string(),
            remote_path: DEFAULT_REMOTE_PATH.to_string(),
            step_timeout: Duration::from_secs(15),
        }
    }

    /// Override the channel name used to tag results.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the script payload.
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    /// Override where the script lands on the device.
    pub fn with_remote_path(mut self, path: impl Into<String>) -> Self {
        self.remote_path = path.into();
        self
    }

    /// Bound each of the two steps (default: 15s).
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }
}

impl Default for ShellScriptChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for ShellScriptChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::ShellScript
    }

    async fn fetch(&self, target: &DeviceTarget) -> Result<RawResponse, ChannelError> {
        let transport = SshTransport::connect(&target.host, &target.ssh).await?;

        debug!("uploading version script to {}", self.remote_path);
        transport
            .upload(&self.remote_path, self.script.as_bytes(), self.step_timeout)
            .await?;

        let output = transport
            .exec(
                &format!("sh {}", shell_quote(&self.remote_path)),
                self.step_timeout,
            )
            .await?;

        let _ = transport.close().await;

        if let Some(code) = output.exit_status
            && code != 0
        {
            return Err(ChannelError::transport(format!(
                "version script exited with status {code}"
            )));
        }

        Ok(RawResponse::text(&self.name, output.stdout_lossy()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_emits_expected_keys() {
        // The script body is the contract the normalizer's fixed-line
        // extraction depends on; keep the emit order stable.
        let lines: Vec<&str> = VERSION_SCRIPT
            .lines()
            .filter(|l| l.starts_with("printf"))
            .collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("os-version"));
        assert!(lines[1].contains("service-version"));
        assert!(lines[2].contains("product"));
    }

    #[test]
    fn test_defaults() {
        let channel = ShellScriptChannel::new();
        assert_eq!(channel.name(), "shell-script");
        assert_eq!(channel.remote_path, DEFAULT_REMOTE_PATH);
    }
}
