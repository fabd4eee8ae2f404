//! SSH transport layer wrapping russh.
//!
//! This module provides the low-level SSH connection management shared by
//! the CLI and shell-script channels: connection setup, authentication,
//! one-shot command execution, and interactive shell sessions with
//! prompt-pattern reads.

mod buffer;
pub mod config;
mod ssh;

pub use buffer::PromptBuffer;
pub use config::{AuthMethod, SshConfig};
pub(crate) use ssh::shell_quote;
pub use ssh::{ExecOutput, ShellSession, SshTransport};
