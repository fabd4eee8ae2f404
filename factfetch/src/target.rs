//! Device target description.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::{Error, Result};
use crate::transport::config::{AuthMethod, SshConfig};

/// One physical appliance and the per-channel parameters to reach it.
///
/// Immutable once built; the collector borrows it for the duration of a
/// run and channels never mutate it.
#[derive(Debug, Clone)]
pub struct DeviceTarget {
    /// Hostname or IP address of the appliance.
    pub host: String,

    /// REST API parameters.
    pub rest: RestConfig,

    /// SSH parameters shared by the CLI and script channels.
    pub ssh: SshConfig,
}

impl DeviceTarget {
    /// Start building a target for `host`.
    pub fn builder(host: impl Into<String>) -> DeviceTargetBuilder {
        DeviceTargetBuilder::new(host)
    }
}

/// REST API connection parameters.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// HTTPS port (default: 8888, the F5OS-style API gateway port).
    pub port: u16,

    /// Basic-auth username.
    pub username: String,

    /// Basic-auth password.
    pub password: SecretString,

    /// Skip TLS certificate verification. Appliances commonly present
    /// self-signed certificates; default is to verify.
    pub accept_invalid_certs: bool,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            port: 8888,
            username: String::new(),
            password: SecretString::from(String::new()),
            accept_invalid_certs: false,
        }
    }
}

/// Builder for [`DeviceTarget`].
///
/// # Example
///
/// ```rust
/// use factfetch::DeviceTarget;
///
/// # fn example() -> factfetch::Result<()> {
/// let target = DeviceTarget::builder("198.51.100.10")
///     .rest_credentials("admin", "secret")
///     .ssh_credentials("admin", "secret")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct DeviceTargetBuilder {
    host: String,
    rest: RestConfig,
    ssh: SshConfig,
}

impl DeviceTargetBuilder {
    /// Create a builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            rest: RestConfig::default(),
            ssh: SshConfig::default(),
        }
    }

    /// Set the REST API port (default: 8888).
    pub fn rest_port(mut self, port: u16) -> Self {
        self.rest.port = port;
        self
    }

    /// Set basic-auth credentials for the REST channel.
    pub fn rest_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.rest.username = username.into();
        self.rest.password = SecretString::from(password.into());
        self
    }

    /// Skip TLS certificate verification on the REST channel.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.rest.accept_invalid_certs = accept;
        self
    }

    /// Set the SSH port (default: 22).
    pub fn ssh_port(mut self, port: u16) -> Self {
        self.ssh.port = port;
        self
    }

    /// Set password authentication for the SSH channels.
    pub fn ssh_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.ssh.username = username.into();
        self.ssh.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    /// Set private-key authentication for the SSH channels.
    pub fn ssh_private_key(
        mut self,
        username: impl Into<String>,
        key_path: impl Into<std::path::PathBuf>,
    ) -> Self {
        self.ssh.username = username.into();
        self.ssh.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        };
        self
    }

    /// Set the SSH connection timeout.
    pub fn ssh_connect_timeout(mut self, timeout: Duration) -> Self {
        self.ssh.connect_timeout = timeout;
        self
    }

    /// Verify SSH host keys against known_hosts (default: off).
    pub fn verify_host_key(mut self, verify: bool) -> Self {
        self.ssh.verify_host_key = verify;
        self
    }

    /// Build the immutable target.
    pub fn build(self) -> Result<DeviceTarget> {
        if self.host.is_empty() {
            return Err(Error::InvalidConfig {
                message: "Target host is required".to_string(),
            });
        }

        Ok(DeviceTarget {
            host: self.host,
            rest: self.rest,
            ssh: self.ssh,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let target = DeviceTarget::builder("appliance-1").build().unwrap();
        assert_eq!(target.host, "appliance-1");
        assert_eq!(target.rest.port, 8888);
        assert_eq!(target.ssh.port, 22);
        assert!(!target.rest.accept_invalid_certs);
        assert!(!target.ssh.verify_host_key);
    }

    #[test]
    fn test_empty_host_rejected() {
        let result = DeviceTarget::builder("").build();
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_credentials_are_set() {
        let target = DeviceTarget::builder("appliance-1")
            .rest_credentials("admin", "secret")
            .ssh_credentials("root", "other")
            .build()
            .unwrap();

        assert_eq!(target.rest.username, "admin");
        assert_eq!(target.ssh.username, "root");
        assert!(matches!(target.ssh.auth, AuthMethod::Password(_)));
    }
}
