//! SSH transport implementation using russh.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use regex::bytes::Regex;
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;

use super::buffer::PromptBuffer;
use super::config::{AuthMethod, SshConfig};
use crate::error::ChannelError;

/// SSH transport wrapping a russh client session.
///
/// One transport equals one authenticated connection to the device. The
/// CLI channel opens an interactive [`ShellSession`] on it; the script
/// channel uses one-shot [`exec`](Self::exec) calls.
pub struct SshTransport {
    session: Handle<ClientHandler>,
}

impl SshTransport {
    /// Connect to `host` and authenticate.
    ///
    /// Connection establishment and handshake are bounded by
    /// `config.connect_timeout`; a rejected credential surfaces as
    /// [`ChannelError::AuthFailure`].
    pub async fn connect(host: &str, config: &SshConfig) -> Result<Self, ChannelError> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.connect_timeout),
            ..Default::default()
        });

        let handler = ClientHandler {
            host: host.to_string(),
            port: config.port,
            verify_host_key: config.verify_host_key,
        };

        debug!("connecting to {}:{} over ssh", host, config.port);
        let mut session = tokio::time::timeout(
            config.connect_timeout,
            client::connect(ssh_config, (host, config.port), handler),
        )
        .await
        .map_err(|_| ChannelError::Timeout(config.connect_timeout))??;

        let success = match &config.auth {
            AuthMethod::None => session
                .authenticate_none(&config.username)
                .await?
                .success(),
            AuthMethod::Password(password) => session
                .authenticate_password(&config.username, password.expose_secret())
                .await?
                .success(),
            AuthMethod::PrivateKey { path, passphrase } => {
                let key = load_secret_key(path, passphrase.as_deref()).map_err(|e| {
                    ChannelError::Transport {
                        message: format!("failed to load private key: {e}"),
                        source: None,
                    }
                })?;

                let hash_alg = session.best_supported_rsa_hash().await?.flatten();

                session
                    .authenticate_publickey(
                        &config.username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await?
                    .success()
            }
        };

        if !success {
            return Err(ChannelError::AuthFailure {
                user: config.username.clone(),
            });
        }

        Ok(Self { session })
    }

    /// Open an interactive shell session (PTY + shell request).
    pub async fn shell(&self) -> Result<ShellSession, ChannelError> {
        let channel = self.session.channel_open_session().await?;

        channel.request_pty(true, "xterm", 511, 24, 0, 0, &[]).await?;
        channel.request_shell(true).await?;

        Ok(ShellSession {
            channel,
            buffer: PromptBuffer::default(),
        })
    }

    /// Run a single command on a fresh session channel and capture its output.
    pub async fn exec(&self, command: &str, timeout: Duration) -> Result<ExecOutput, ChannelError> {
        self.run(command, None, timeout).await
    }

    /// Write `contents` to `path` on the device.
    ///
    /// Streams the payload into `cat > path` over a session channel. A
    /// non-zero exit status fails the upload.
    pub async fn upload(
        &self,
        path: &str,
        contents: &[u8],
        timeout: Duration,
    ) -> Result<(), ChannelError> {
        let output = self
            .run(
                &format!("cat > {}", shell_quote(path)),
                Some(contents),
                timeout,
            )
            .await?;

        match output.exit_status {
            Some(0) | None => Ok(()),
            Some(code) => Err(ChannelError::transport(format!(
                "upload to {path} exited with status {code}"
            ))),
        }
    }

    async fn run(
        &self,
        command: &str,
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<ExecOutput, ChannelError> {
        let deadline = Instant::now() + timeout;
        let mut channel = self.session.channel_open_session().await?;

        debug!("exec: {}", command);
        channel.exec(true, command).await?;

        if let Some(data) = stdin {
            channel.data(data).await?;
        }
        // Always signal EOF so commands reading stdin terminate.
        channel.eof().await?;

        let mut stdout = Vec::new();
        let mut exit_status = None;

        loop {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .ok_or(ChannelError::Timeout(timeout))?;

            let msg = match tokio::time::timeout(remaining, channel.wait()).await {
                Err(_) => return Err(ChannelError::Timeout(timeout)),
                Ok(None) => break,
                Ok(Some(msg)) => msg,
            };

            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext: 1 } => {
                    debug!("stderr: {}", String::from_utf8_lossy(data));
                }
                ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code),
                ChannelMsg::Close => break,
                _ => {}
            }
        }

        Ok(ExecOutput {
            stdout,
            exit_status,
        })
    }

    /// Close the connection.
    pub async fn close(self) -> Result<(), ChannelError> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await?;
        Ok(())
    }
}

/// Captured output of a one-shot remote command.
#[derive(Debug)]
pub struct ExecOutput {
    /// Everything the command wrote to stdout.
    pub stdout: Vec<u8>,

    /// Exit status, if the server reported one before closing.
    pub exit_status: Option<u32>,
}

impl ExecOutput {
    /// Stdout as a string (lossy UTF-8).
    pub fn stdout_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }
}

/// Interactive shell session with prompt-pattern reads.
pub struct ShellSession {
    channel: Channel<Msg>,
    buffer: PromptBuffer,
}

impl ShellSession {
    /// Send one line of input, appending the newline.
    pub async fn send_line(&mut self, line: &str) -> Result<(), ChannelError> {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(b'\n');
        self.channel.data(&bytes[..]).await?;
        Ok(())
    }

    /// Read until `pattern` matches the buffer tail, EOF, or the deadline.
    ///
    /// Returns the accumulated output (prompt included) on a match or on
    /// EOF; no terminal marker within `timeout` is a
    /// [`ChannelError::Timeout`].
    pub async fn read_until(
        &mut self,
        pattern: &Regex,
        timeout: Duration,
    ) -> Result<Vec<u8>, ChannelError> {
        let deadline = Instant::now() + timeout;

        loop {
            if self.buffer.tail_matches(pattern) {
                return Ok(self.buffer.take());
            }

            let remaining = deadline
                .checked_duration_since(Instant::now())
                .ok_or(ChannelError::Timeout(timeout))?;

            match tokio::time::timeout(remaining, self.channel.wait()).await {
                Err(_) => return Err(ChannelError::Timeout(timeout)),
                Ok(None) | Ok(Some(ChannelMsg::Eof)) | Ok(Some(ChannelMsg::Close)) => {
                    return Ok(self.buffer.take());
                }
                Ok(Some(ChannelMsg::Data { ref data })) => self.buffer.extend(data),
                Ok(Some(_)) => {}
            }
        }
    }
}

/// Single-quote `s` for interpolation into a remote shell command line,
/// so paths with spaces or metacharacters pass through literally.
pub(crate) fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// russh client handler controlling host key acceptance.
struct ClientHandler {
    host: String,
    port: u16,
    verify_host_key: bool,
}

impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        if !self.verify_host_key {
            debug!("host key verification disabled for {}", self.host);
            return Ok(true);
        }

        match russh::keys::check_known_hosts(&self.host, self.port, server_public_key) {
            Ok(true) => Ok(true),
            Ok(false) => {
                warn!("host {}:{} not present in known_hosts", self.host, self.port);
                Ok(false)
            }
            Err(e) => {
                warn!("known_hosts check failed for {}: {}", self.host, e);
                Ok(false)
            }
        }
    }
}
