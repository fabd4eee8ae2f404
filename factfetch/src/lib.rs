//! # Factfetch
//!
//! Async multi-channel device fact collector for network appliance
//! automation.
//!
//! Factfetch retrieves the same logical facts (OS version, service
//! version, product identity) from one appliance over several
//! independent management surfaces — the RESTCONF API, the vendor CLI
//! over SSH, and a shell script pushed over SSH — normalizes the
//! heterogeneous responses into one [`VersionFact`] schema, and reports
//! per-channel success or failure. One broken channel never blocks the
//! others.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use factfetch::{
//!     CliSshChannel, Collector, DeviceTarget, Reporter, RestChannel, ShellScriptChannel,
//! };
//!
//! #[tokio::main]
//! async fn main() -> factfetch::Result<()> {
//!     let target = DeviceTarget::builder("198.51.100.10")
//!         .rest_credentials("admin", "secret")
//!         .accept_invalid_certs(true)
//!         .ssh_credentials("admin", "secret")
//!         .build()?;
//!
//!     let collector = Collector::builder(target)
//!         .with_channel(RestChannel::new())
//!         .with_channel(CliSshChannel::new())
//!         .with_channel(ShellScriptChannel::new())
//!         .build()?;
//!
//!     let results = collector.collect().await;
//!     print!("{}", Reporter::new().render(&results));
//!
//!     std::process::exit(if Reporter::all_ok(&results) { 0 } else { 1 });
//! }
//! ```

pub mod channel;
pub mod collector;
pub mod error;
pub mod facts;
pub mod report;
pub mod target;
pub mod transport;

// Re-export main types for convenience
pub use channel::{
    Channel, ChannelKind, CliSshChannel, Payload, RawResponse, RestChannel, ShellScriptChannel,
};
pub use collector::{ChannelResult, Collector, CollectorBuilder, Outcome};
pub use error::{ChannelError, Error, Result};
pub use facts::{VersionFact, normalize};
pub use report::Reporter;
pub use target::{DeviceTarget, DeviceTargetBuilder, RestConfig};
pub use transport::{AuthMethod, SshConfig};
