//! Core formatting traits and the plain text implementation
//!
//! Line formats match classic ping output so existing scripts keep parsing:
//!
//! ```text
//! Destination is http://localhost
//! 2 bytes from http://localhost: Sequence: 1, StatusCode: 200, RTT: 12ms
//! From http://localhost: Sequence: 2, ErrReason: connection refused
//! --- http://localhost httping statistics ---
//! 2 packet transmitted, 1 received, 50% success rate
//! rtt: min/avg/max = 12/12/12 ms
//! ```

use crate::{
    models::metrics::{AttemptOutcome, AttemptTiming},
    stats::ProbeSummary,
};

/// Main trait for output formatting
pub trait OutputFormatter: Send {
    /// Line printed before the first attempt
    fn format_banner(&self, destination: &str) -> String;

    /// One line per attempt
    fn format_attempt(&self, destination: &str, sequence: u32, outcome: &AttemptOutcome) -> String;

    /// Final statistics block
    fn format_summary(&self, summary: &ProbeSummary) -> String;

    /// Printed instead of the summary when no attempt was made
    fn format_no_attempts(&self, destination: &str) -> String;
}

/// Configuration options for formatting
#[derive(Debug, Clone, Default)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Append connection/request split to success lines and the stop reason
    /// to the summary
    pub verbose_mode: bool,
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormattingOptions {
        &self.options
    }
}

/// ` (connect: 12ms, request: 30ms)`, or the dial count when the split is
/// not meaningful
pub(crate) fn timing_breakdown(timing: &AttemptTiming) -> String {
    if timing.is_decomposable() {
        format!(" (connect: {}ms, request: {}ms)", timing.connection_ms(), timing.request_ms())
    } else {
        format!(" (connect: {}ms over {} dials)", timing.connection_ms(), timing.dial_count)
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_banner(&self, destination: &str) -> String {
        format!("Destination is {}", destination)
    }

    fn format_attempt(&self, destination: &str, sequence: u32, outcome: &AttemptOutcome) -> String {
        match outcome {
            AttemptOutcome::Success { status_code, body_bytes, timing, .. } => {
                let mut line = format!(
                    "{} bytes from {}: Sequence: {}, StatusCode: {}, RTT: {}ms",
                    body_bytes, destination, sequence, status_code, timing.rtt_ms()
                );
                if self.options.verbose_mode {
                    line.push_str(&timing_breakdown(timing));
                }
                line
            }
            AttemptOutcome::Failure { error, .. } => {
                format!("From {}: Sequence: {}, ErrReason: {}", destination, sequence, error.reason())
            }
        }
    }

    fn format_summary(&self, summary: &ProbeSummary) -> String {
        let mut output = format!(
            "--- {} httping statistics ---\n{} packet transmitted, {} received, {}% success rate\nrtt: min/avg/max = {}/{}/{} ms",
            summary.destination,
            summary.transmitted,
            summary.received,
            summary.success_rate_percent,
            summary.rtt.min_ms,
            summary.rtt.avg_display(),
            summary.rtt.max_ms,
        );

        if self.options.verbose_mode {
            output.push_str(&format!(
                "\nstopped: {}, aggregation: {}",
                summary.termination, summary.aggregation
            ));
        }

        output
    }

    fn format_no_attempts(&self, destination: &str) -> String {
        format!("--- {} httping statistics ---\nno probes were sent", destination)
    }
}
