//! CLI-over-SSH channel.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use regex::bytes::Regex;

use super::{Channel, ChannelKind, RawResponse};
use crate::error::ChannelError;
use crate::target::DeviceTarget;
use crate::transport::SshTransport;

/// Prompt marker for the appliance CLI (confd-style `#`/`>` prompts).
const DEFAULT_PROMPT: &str = r"[$#>]\s*$";

const DEFAULT_COMMAND: &str = "show system version";

/// Retrieves version facts by driving the vendor CLI over an
/// interactive SSH session.
///
/// One command is sent and output is read until the prompt marker
/// reappears or the session reaches EOF; no marker within the read
/// timeout is a [`ChannelError::Timeout`].
pub struct CliSshChannel {
    name: String,
    command: String,
    prompt: Regex,
    read_timeout: Duration,
}

impl CliSshChannel {
    pub fn new() -> Self {
        Self {
            name: ChannelKind::CliSsh.as_str().to_string(),
            command: DEFAULT_COMMAND.to_string(),
            // The default pattern is a compile-time constant.
            prompt: Regex::new(DEFAULT_PROMPT).unwrap(),
            read_timeout: Duration::from_secs(15),
        }
    }

    /// Override the channel name used to tag results.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the command sent to the CLI.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Override the prompt pattern.
    pub fn with_prompt(mut self, pattern: &str) -> Result<Self, ChannelError> {
        self.prompt = Regex::new(pattern)
            .map_err(|e| ChannelError::transport(format!("invalid prompt pattern: {e}")))?;
        Ok(self)
    }

    /// Bound each prompt wait (default: 15s).
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

impl Default for CliSshChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for CliSshChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::CliSsh
    }

    async fn fetch(&self, target: &DeviceTarget) -> Result<RawResponse, ChannelError> {
        let transport = SshTransport::connect(&target.host, &target.ssh).await?;
        let mut shell = transport.shell().await?;

        // Banner and initial prompt.
        shell.read_until(&self.prompt, self.read_timeout).await?;

        debug!("cli: {}", self.command);
        shell.send_line(&self.command).await?;
        let raw = shell.read_until(&self.prompt, self.read_timeout).await?;

        // Best-effort teardown; the payload is already in hand.
        let _ = transport.close().await;

        let text = String::from_utf8_lossy(&raw);
        let output = strip_echo_and_prompt(&text, &self.command, &self.prompt);
        Ok(RawResponse::text(&self.name, output))
    }
}

/// Drop the echoed command line and the trailing prompt from raw
/// session output, leaving only what the command printed.
fn strip_echo_and_prompt(raw: &str, command: &str, prompt: &Regex) -> String {
    let mut lines: Vec<&str> = raw.lines().map(|l| l.trim_end_matches('\r')).collect();

    if lines.first().is_some_and(|l| l.contains(command)) {
        lines.remove(0);
    }

    while lines
        .last()
        .is_some_and(|l| l.trim().is_empty() || prompt.is_match(l.as_bytes()))
    {
        lines.pop();
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_echo_and_prompt() {
        let prompt = Regex::new(DEFAULT_PROMPT).unwrap();
        let raw = "show system version\r\n\
                   system version os-version 1.8.0-16036\r\n\
                   system version service-version 1.8.0-16036\r\n\
                   system version product F5OS-A\r\n\
                   appliance-1# ";

        let output = strip_echo_and_prompt(raw, "show system version", &prompt);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "system version os-version 1.8.0-16036");
        assert_eq!(lines[2], "system version product F5OS-A");
    }

    #[test]
    fn test_strip_handles_output_without_echo() {
        let prompt = Regex::new(DEFAULT_PROMPT).unwrap();
        let raw = "os-version 1.8.0-16036\nproduct F5OS-A\n$ ";

        let output = strip_echo_and_prompt(raw, "show system version", &prompt);
        assert_eq!(output, "os-version 1.8.0-16036\nproduct F5OS-A");
    }

    #[test]
    fn test_invalid_prompt_pattern_rejected() {
        assert!(CliSshChannel::new().with_prompt("[").is_err());
    }
}
