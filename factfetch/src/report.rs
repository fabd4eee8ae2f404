//! Human-readable rendering of collection results.

use crate::collector::{ChannelResult, Outcome};

/// Renders an ordered set of channel results.
///
/// Every configured channel gets exactly one line, failures inline;
/// a failure entry never aborts rendering of the remaining entries.
pub struct Reporter {
    show_elapsed: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Self { show_elapsed: true }
    }

    /// Include or suppress per-channel elapsed times (default: shown).
    /// Suppressing them makes reports byte-identical across runs with
    /// identical inputs.
    pub fn with_elapsed(mut self, show: bool) -> Self {
        self.show_elapsed = show;
        self
    }

    /// Render one line per result plus a summary footer.
    pub fn render(&self, results: &[ChannelResult]) -> String {
        let width = results
            .iter()
            .map(|r| r.channel.len())
            .max()
            .unwrap_or(0)
            .max(7);

        let mut out = String::new();

        for result in results {
            match &result.outcome {
                Outcome::Success(fact) => {
                    out.push_str(&format!(
                        "{:<width$}  ok      os={} service={} product={}",
                        result.channel, fact.os_version, fact.service_version, fact.product,
                    ));
                }
                Outcome::Failure(err) => {
                    out.push_str(&format!(
                        "{:<width$}  FAILED  {}: {}",
                        result.channel,
                        err.kind(),
                        err,
                    ));
                }
            }

            if self.show_elapsed {
                out.push_str(&format!("  ({:.2}s)", result.elapsed.as_secs_f64()));
            }
            out.push('\n');
        }

        out.push_str(&self.summary(results));
        out
    }

    fn summary(&self, results: &[ChannelResult]) -> String {
        let ok = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - ok;

        let mut line = format!("{} channel(s): {} ok, {} failed", results.len(), ok, failed);

        // Reconciliation note: flag when succeeding channels disagree on
        // what the device is running.
        let successes: Vec<&ChannelResult> = results.iter().filter(|r| r.is_success()).collect();
        if let [first, rest @ ..] = successes.as_slice()
            && !rest.is_empty()
            && let Some(reference) = first.fact()
        {
            let disagreeing: Vec<&str> = rest
                .iter()
                .filter(|r| r.fact().is_some_and(|f| !f.same_values(reference)))
                .map(|r| r.channel.as_str())
                .collect();

            if disagreeing.is_empty() {
                line.push_str(&format!("; facts agree across {} channels", successes.len()));
            } else {
                line.push_str(&format!(
                    "; FACT MISMATCH: {} disagree(s) with {}",
                    disagreeing.join(", "),
                    first.channel
                ));
            }
        }

        line.push('\n');
        line
    }

    /// True when every channel in the run succeeded. Collaborator CLIs
    /// map this to their exit code.
    pub fn all_ok(results: &[ChannelResult]) -> bool {
        results.iter().all(ChannelResult::is_success)
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}
