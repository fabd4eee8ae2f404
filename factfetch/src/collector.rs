//! Collector: runs every configured channel against one target.

use std::time::{Duration, Instant};

use futures_util::future::join_all;
use log::{debug, warn};

use crate::channel::{Channel, ChannelKind};
use crate::error::{ChannelError, Error, Result};
use crate::facts::{VersionFact, normalize};
use crate::target::DeviceTarget;

const DEFAULT_CHANNEL_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one channel invocation.
#[derive(Debug)]
pub enum Outcome {
    /// The channel produced a normalized fact.
    Success(VersionFact),

    /// The channel failed; the error never left the channel boundary.
    Failure(ChannelError),
}

/// Tagged result of one channel invocation.
///
/// The collector produces exactly one of these per configured channel
/// per run, in configured order, whatever each channel did.
#[derive(Debug)]
pub struct ChannelResult {
    /// Name of the channel that ran.
    pub channel: String,

    /// Which management surface it spoke.
    pub kind: ChannelKind,

    /// Wall-clock time the invocation took.
    pub elapsed: Duration,

    /// What came of it.
    pub outcome: Outcome,
}

impl ChannelResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    /// The normalized fact, if this channel succeeded.
    pub fn fact(&self) -> Option<&VersionFact> {
        match &self.outcome {
            Outcome::Success(fact) => Some(fact),
            Outcome::Failure(_) => None,
        }
    }

    /// The failure, if this channel failed.
    pub fn error(&self) -> Option<&ChannelError> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure(err) => Some(err),
        }
    }
}

impl std::fmt::Display for ChannelResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            Outcome::Success(fact) => write!(
                f,
                "{}: ok os={} service={} product={}",
                self.channel, fact.os_version, fact.service_version, fact.product
            ),
            Outcome::Failure(err) => {
                write!(f, "{}: failed ({}) {}", self.channel, err.kind(), err)
            }
        }
    }
}

/// Runs all configured channels against one device target.
///
/// Channels are independent, so they run concurrently; each invocation
/// is bounded by the per-channel timeout and every failure is converted
/// into a `Failure` result at the channel boundary. One broken channel
/// never suppresses the others. Dropping the `collect` future cancels
/// all in-flight channel I/O.
pub struct Collector {
    target: DeviceTarget,
    channels: Vec<Box<dyn Channel>>,
    channel_timeout: Duration,
}

impl Collector {
    /// Start building a collector for `target`.
    pub fn builder(target: DeviceTarget) -> CollectorBuilder {
        CollectorBuilder::new(target)
    }

    /// Run every channel and return one result per channel, in
    /// configured order.
    pub async fn collect(&self) -> Vec<ChannelResult> {
        self.collect_bounded(self.channel_timeout).await
    }

    /// Like [`collect`](Self::collect), but additionally bound the whole
    /// run. Channels still in flight at the overall deadline report a
    /// `Timeout` failure; completed results are retained, so the run
    /// degrades to a partial report instead of losing everything.
    pub async fn collect_within(&self, overall: Duration) -> Vec<ChannelResult> {
        // All channels start together, so the overall deadline is just a
        // tighter per-channel bound.
        self.collect_bounded(self.channel_timeout.min(overall)).await
    }

    async fn collect_bounded(&self, bound: Duration) -> Vec<ChannelResult> {
        debug!(
            "collecting from {} over {} channel(s)",
            self.target.host,
            self.channels.len()
        );

        let runs = self
            .channels
            .iter()
            .map(|channel| self.run_channel(channel.as_ref(), bound));

        // join_all preserves input order regardless of completion order.
        join_all(runs).await
    }

    async fn run_channel(&self, channel: &dyn Channel, bound: Duration) -> ChannelResult {
        let start = Instant::now();

        let outcome = match tokio::time::timeout(bound, channel.fetch(&self.target)).await {
            Err(_) => {
                warn!("channel {} exceeded {:?}", channel.name(), bound);
                Outcome::Failure(ChannelError::Timeout(bound))
            }
            Ok(Err(err)) => {
                warn!("channel {} failed: {}", channel.name(), err);
                Outcome::Failure(err)
            }
            Ok(Ok(raw)) => match normalize(&raw) {
                Ok(fact) => Outcome::Success(fact),
                Err(err) => {
                    warn!("channel {} returned unusable payload: {}", channel.name(), err);
                    Outcome::Failure(err)
                }
            },
        };

        ChannelResult {
            channel: channel.name().to_string(),
            kind: channel.kind(),
            elapsed: start.elapsed(),
            outcome,
        }
    }
}

/// Builder for [`Collector`].
pub struct CollectorBuilder {
    target: DeviceTarget,
    channels: Vec<Box<dyn Channel>>,
    channel_timeout: Duration,
}

impl CollectorBuilder {
    /// Create a builder for the specified target.
    pub fn new(target: DeviceTarget) -> Self {
        Self {
            target,
            channels: Vec::new(),
            channel_timeout: DEFAULT_CHANNEL_TIMEOUT,
        }
    }

    /// Append a channel. Report order follows insertion order.
    pub fn with_channel(mut self, channel: impl Channel + 'static) -> Self {
        self.channels.push(Box::new(channel));
        self
    }

    /// Append an already-boxed channel.
    pub fn with_boxed_channel(mut self, channel: Box<dyn Channel>) -> Self {
        self.channels.push(channel);
        self
    }

    /// Set the per-channel timeout (default: 30s).
    pub fn channel_timeout(mut self, timeout: Duration) -> Self {
        self.channel_timeout = timeout;
        self
    }

    /// Build the collector. At least one channel is required.
    pub fn build(self) -> Result<Collector> {
        if self.channels.is_empty() {
            return Err(Error::InvalidConfig {
                message: "At least one channel must be configured".to_string(),
            });
        }

        Ok(Collector {
            target: self.target,
            channels: self.channels,
            channel_timeout: self.channel_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::RawResponse;
    use async_trait::async_trait;

    type Responder =
        Box<dyn Fn(&str) -> std::result::Result<RawResponse, ChannelError> + Send + Sync>;

    /// Deterministic stand-in for a real channel.
    struct MockChannel {
        name: &'static str,
        delay: Duration,
        respond: Responder,
    }

    impl MockChannel {
        fn ok(name: &'static str, delay_ms: u64) -> Self {
            Self {
                name,
                delay: Duration::from_millis(delay_ms),
                respond: Box::new(|channel| {
                    Ok(RawResponse::json(
                        channel,
                        serde_json::json!({
                            "os-version": "1.8.0-16036",
                            "service-version": "1.8.0-16036",
                            "product": "F5OS-A",
                        }),
                    ))
                }),
            }
        }

        fn auth_failure(name: &'static str) -> Self {
            Self {
                name,
                delay: Duration::ZERO,
                respond: Box::new(|_| {
                    Err(ChannelError::AuthFailure {
                        user: "admin".into(),
                    })
                }),
            }
        }

        fn malformed(name: &'static str) -> Self {
            Self {
                name,
                delay: Duration::ZERO,
                respond: Box::new(|channel| Ok(RawResponse::text(channel, "truncated"))),
            }
        }

        fn hanging(name: &'static str) -> Self {
            Self {
                name,
                delay: Duration::from_secs(3600),
                respond: Box::new(|channel| Ok(RawResponse::text(channel, ""))),
            }
        }
    }

    #[async_trait]
    impl Channel for MockChannel {
        fn name(&self) -> &str {
            self.name
        }

        fn kind(&self) -> ChannelKind {
            ChannelKind::Rest
        }

        async fn fetch(&self, _target: &DeviceTarget) -> std::result::Result<RawResponse, ChannelError> {
            tokio::time::sleep(self.delay).await;
            (self.respond)(self.name)
        }
    }

    fn target() -> DeviceTarget {
        DeviceTarget::builder("appliance-1").build().unwrap()
    }

    #[tokio::test]
    async fn test_one_result_per_channel_in_configured_order() {
        // Slowest channel first: configured order must survive
        // out-of-order completion.
        let collector = Collector::builder(target())
            .with_channel(MockChannel::ok("slow", 50))
            .with_channel(MockChannel::ok("medium", 20))
            .with_channel(MockChannel::ok("fast", 0))
            .build()
            .unwrap();

        let results = collector.collect().await;
        assert_eq!(results.len(), 3);
        let names: Vec<&str> = results.iter().map(|r| r.channel.as_str()).collect();
        assert_eq!(names, ["slow", "medium", "fast"]);
        assert!(results.iter().all(ChannelResult::is_success));
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let collector = Collector::builder(target())
            .with_channel(MockChannel::ok("first", 0))
            .with_channel(MockChannel::auth_failure("broken"))
            .with_channel(MockChannel::ok("last", 10))
            .build()
            .unwrap();

        let results = collector.collect().await;
        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert_eq!(results[1].error().unwrap().kind(), "auth-failure");
        assert!(results[2].is_success());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_isolated() {
        let collector = Collector::builder(target())
            .with_channel(MockChannel::malformed("bad"))
            .with_channel(MockChannel::ok("good", 0))
            .build()
            .unwrap();

        let results = collector.collect().await;
        assert_eq!(results[0].error().unwrap().kind(), "unexpected-format");
        assert!(results[1].is_success());
    }

    #[tokio::test]
    async fn test_slow_channel_times_out() {
        let collector = Collector::builder(target())
            .with_channel(MockChannel::hanging("stuck"))
            .with_channel(MockChannel::ok("quick", 0))
            .channel_timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        let results = collector.collect().await;
        assert_eq!(results[0].error().unwrap().kind(), "timeout");
        assert!(results[1].is_success());
    }

    #[tokio::test]
    async fn test_collect_within_keeps_completed_results() {
        let collector = Collector::builder(target())
            .with_channel(MockChannel::ok("quick", 0))
            .with_channel(MockChannel::hanging("stuck"))
            .build()
            .unwrap();

        let results = collector.collect_within(Duration::from_millis(50)).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_success());
        assert_eq!(results[1].error().unwrap().kind(), "timeout");
    }

    #[tokio::test]
    async fn test_identical_inputs_identical_outcomes() {
        let collector = Collector::builder(target())
            .with_channel(MockChannel::ok("rest", 0))
            .with_channel(MockChannel::auth_failure("cli-ssh"))
            .build()
            .unwrap();

        let first = collector.collect().await;
        let second = collector.collect().await;

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.channel, b.channel);
            assert_eq!(a.fact(), b.fact());
            assert_eq!(
                a.error().map(ChannelError::kind),
                b.error().map(ChannelError::kind)
            );
        }
    }

    #[test]
    fn test_zero_channels_rejected() {
        let result = Collector::builder(target()).build();
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_result_display() {
        let success = ChannelResult {
            channel: "rest".into(),
            kind: ChannelKind::Rest,
            elapsed: Duration::from_millis(12),
            outcome: Outcome::Success(VersionFact {
                os_version: "1.8.0-16036".into(),
                service_version: "1.8.0-16036".into(),
                product: "F5OS-A".into(),
                source_channel: "rest".into(),
            }),
        };
        assert_eq!(
            success.to_string(),
            "rest: ok os=1.8.0-16036 service=1.8.0-16036 product=F5OS-A"
        );

        let failure = ChannelResult {
            channel: "cli-ssh".into(),
            kind: ChannelKind::CliSsh,
            elapsed: Duration::from_millis(5),
            outcome: Outcome::Failure(ChannelError::Timeout(Duration::from_secs(30))),
        };
        assert!(failure.to_string().contains("failed (timeout)"));
    }
}
