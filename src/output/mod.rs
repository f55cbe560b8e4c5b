//! Output formatting and display
//!
//! Ping lines and the summary go to stdout through an [`OutputFormatter`];
//! the JSON summary is rendered with serde_json.

mod colored;
mod formatter;

pub use self::colored::{ColorScheme, ColoredFormatter, PerformanceLevel};
pub use self::formatter::{FormattingOptions, OutputFormatter, PlainFormatter};

use crate::{
    error::Result,
    executor::AttemptReporter,
    models::metrics::AttemptOutcome,
    stats::ProbeSummary,
};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false, false)
    }
}

/// Prints the banner and one line per attempt to stdout
pub struct ConsoleReporter {
    formatter: Box<dyn OutputFormatter>,
    destination: String,
    /// Suppresses per-attempt lines (JSON mode)
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(formatter: Box<dyn OutputFormatter>) -> Self {
        Self {
            formatter,
            destination: String::new(),
            quiet: false,
        }
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn formatter(&self) -> &dyn OutputFormatter {
        self.formatter.as_ref()
    }
}

impl AttemptReporter for ConsoleReporter {
    fn on_start(&mut self, destination: &str) {
        self.destination = destination.to_string();
        if !self.quiet {
            println!("{}", self.formatter.format_banner(destination));
        }
    }

    fn on_attempt(&mut self, sequence: u32, outcome: &AttemptOutcome) {
        if !self.quiet {
            println!("{}", self.formatter.format_attempt(&self.destination, sequence, outcome));
        }
    }
}

/// Pretty-printed JSON rendering of the summary
pub fn summary_to_json(summary: &ProbeSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
