//! Colored formatter implementation with terminal color support

use super::formatter::{timing_breakdown, FormattingOptions, OutputFormatter, PlainFormatter};
use crate::{models::metrics::AttemptOutcome, stats::ProbeSummary};
use colored::*;

/// Latency band used to color RTT values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerformanceLevel {
    Excellent,  // < 50ms
    Good,       // 50-100ms
    Fair,       // 100-300ms
    Poor,       // 300-1000ms
    VeryPoor,   // > 1000ms
}

impl PerformanceLevel {
    /// Determine performance level from response time in milliseconds
    pub fn from_response_time(time_ms: f64) -> Self {
        if time_ms < 50.0 {
            Self::Excellent
        } else if time_ms < 100.0 {
            Self::Good
        } else if time_ms < 300.0 {
            Self::Fair
        } else if time_ms < 1000.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Magenta,
            Self::VeryPoor => Color::Red,
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::BrightBlack,
        }
    }
}

/// Colored formatter; falls back to the plain rendering when colors are off
pub struct ColoredFormatter {
    plain_formatter: PlainFormatter,
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        let plain_formatter = PlainFormatter::new(options.clone());
        Self {
            plain_formatter,
            options,
            color_scheme,
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn status_color(&self, status_code: u16) -> Color {
        match status_code {
            200..=299 => self.color_scheme.success,
            300..=399 => Color::Cyan,
            400..=499 => self.color_scheme.warning,
            _ => self.color_scheme.error,
        }
    }

    fn rate_color(&self, success_rate_percent: u32) -> Color {
        match success_rate_percent {
            100 => self.color_scheme.success,
            50..=99 => self.color_scheme.warning,
            _ => self.color_scheme.error,
        }
    }

    fn rtt(&self, rtt_ms: u64) -> ColoredString {
        let level = PerformanceLevel::from_response_time(rtt_ms as f64);
        self.colorize(&format!("{}ms", rtt_ms), level.color())
    }

    /// Check if terminal supports colors
    pub fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err()
            && std::env::var("TERM").map(|term| term != "dumb").unwrap_or(true)
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_banner(&self, destination: &str) -> String {
        if !self.options.enable_color {
            return self.plain_formatter.format_banner(destination);
        }
        format!("Destination is {}", destination.bold())
    }

    fn format_attempt(&self, destination: &str, sequence: u32, outcome: &AttemptOutcome) -> String {
        if !self.options.enable_color {
            return self.plain_formatter.format_attempt(destination, sequence, outcome);
        }

        match outcome {
            AttemptOutcome::Success { status_code, body_bytes, timing, .. } => {
                let status = status_code.to_string();
                let mut line = format!(
                    "{} bytes from {}: Sequence: {}, StatusCode: {}, RTT: {}",
                    body_bytes,
                    destination,
                    sequence,
                    self.colorize(&status, self.status_color(*status_code)),
                    self.rtt(timing.rtt_ms()),
                );
                if self.options.verbose_mode {
                    line.push_str(&self.colorize(&timing_breakdown(timing), self.color_scheme.muted).to_string());
                }
                line
            }
            AttemptOutcome::Failure { error, .. } => format!(
                "From {}: Sequence: {}, ErrReason: {}",
                destination,
                sequence,
                self.colorize(error.reason(), self.color_scheme.error),
            ),
        }
    }

    fn format_summary(&self, summary: &ProbeSummary) -> String {
        if !self.options.enable_color {
            return self.plain_formatter.format_summary(summary);
        }

        let header = format!("--- {} httping statistics ---", summary.destination);
        let rate = format!("{}%", summary.success_rate_percent);
        let mut output = format!(
            "{}\n{} packet transmitted, {} received, {} success rate\nrtt: min/avg/max = {}/{}/{} ms",
            self.colorize(&header, self.color_scheme.header).bold(),
            summary.transmitted,
            summary.received,
            self.colorize(&rate, self.rate_color(summary.success_rate_percent)),
            summary.rtt.min_ms,
            summary.rtt.avg_display(),
            summary.rtt.max_ms,
        );

        if self.options.verbose_mode {
            let note = format!("stopped: {}, aggregation: {}", summary.termination, summary.aggregation);
            output.push('\n');
            output.push_str(&self.colorize(&note, self.color_scheme.muted).to_string());
        }

        output
    }

    fn format_no_attempts(&self, destination: &str) -> String {
        let text = self.plain_formatter.format_no_attempts(destination);
        self.colorize(&text, self.color_scheme.warning).to_string()
    }
}
