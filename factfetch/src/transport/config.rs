//! SSH connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// SSH connection parameters for one device.
///
/// The target hostname lives on [`crate::DeviceTarget`]; this struct only
/// carries the transport-level knobs.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// SSH port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Connection + handshake timeout.
    pub connect_timeout: Duration,

    /// Verify the server host key against known_hosts. Appliance lab
    /// setups typically run with this off.
    pub verify_host_key: bool,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            port: 22,
            username: String::new(),
            auth: AuthMethod::None,
            connect_timeout: Duration::from_secs(30),
            verify_host_key: false,
        }
    }
}

/// Authentication method for SSH connections.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// No authentication (for testing only).
    None,

    /// Password authentication.
    Password(SecretString),

    /// Private key authentication.
    PrivateKey {
        /// Path to the private key file.
        path: PathBuf,
        /// Optional passphrase for encrypted keys.
        passphrase: Option<String>,
    },
}
