//! Progress reporting for the long-running phases.
//!
//! The CLI hands an `IndicatifReporter` to the inserter; library callers
//! default to `NoopReporter` or bring their own implementation.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Trait for reporting progress of one engine phase.
pub trait ProgressReporter: Send + Sync {
    /// Begin a new phase with an optional total count.
    fn start(&self, phase: &str, total: Option<u64>);

    /// Advance progress by the given amount.
    fn advance(&self, amount: u64);

    /// Mark the current phase as finished.
    fn finish(&self);

    /// Display an informational message.
    fn message(&self, msg: &str);
}

/// No-op reporter for library callers that don't need progress output.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn start(&self, _phase: &str, _total: Option<u64>) {}
    fn advance(&self, _amount: u64) {}
    fn finish(&self) {}
    fn message(&self, _msg: &str) {}
}

/// Reporter backed by an `indicatif` progress bar for CLI use.
///
/// The bar starts hidden and attaches to stderr on the first phase, so
/// constructing the reporter has no visible effect.
#[derive(Debug)]
pub struct IndicatifReporter {
    bar: ProgressBar,
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifReporter {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn start(&self, phase: &str, total: Option<u64>) {
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
        match total {
            Some(total) => {
                self.bar.set_length(total);
                self.bar.set_style(
                    ProgressStyle::with_template(
                        "{msg:16} {wide_bar:.cyan/blue} {pos}/{len} ({per_sec})",
                    )
                    .unwrap()
                    .progress_chars("## "),
                );
            }
            None => {
                self.bar.set_style(
                    ProgressStyle::with_template("{spinner:.green} {msg:16} {pos} ({per_sec})")
                        .unwrap(),
                );
            }
        }
        self.bar.set_message(phase.to_string());
        self.bar.reset();
    }

    fn advance(&self, amount: u64) {
        self.bar.inc(amount);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn message(&self, msg: &str) {
        self.bar.println(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_reporter_is_silent() {
        let reporter = NoopReporter;
        reporter.start("inserting", Some(100));
        reporter.advance(50);
        reporter.message("hello");
        reporter.finish();
    }

    #[test]
    fn indicatif_reporter_lifecycle() {
        let reporter = IndicatifReporter::new();
        reporter.start("inserting", Some(10));
        reporter.advance(5);
        reporter.advance(5);
        reporter.finish();
    }
}
