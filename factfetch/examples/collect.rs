//! Collect version facts from one appliance over all three channels.
//!
//! Usage:
//!   cargo run --example collect -- <host> <username> <password>
//!
//! Set RUST_LOG=debug to watch the per-channel transport activity.

use std::time::Duration;

use factfetch::{
    CliSshChannel, Collector, DeviceTarget, Reporter, RestChannel, ShellScriptChannel,
};

#[tokio::main]
async fn main() -> factfetch::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (Some(host), Some(username), Some(password)) = (args.next(), args.next(), args.next())
    else {
        eprintln!("usage: collect <host> <username> <password>");
        std::process::exit(2);
    };

    let target = DeviceTarget::builder(host)
        .rest_credentials(&username, &password)
        .accept_invalid_certs(true)
        .ssh_credentials(&username, &password)
        .build()?;

    let collector = Collector::builder(target)
        .with_channel(RestChannel::new())
        .with_channel(CliSshChannel::new())
        .with_channel(ShellScriptChannel::new())
        .channel_timeout(Duration::from_secs(20))
        .build()?;

    let results = collector.collect().await;
    print!("{}", Reporter::new().render(&results));

    std::process::exit(if Reporter::all_ok(&results) { 0 } else { 1 });
}
