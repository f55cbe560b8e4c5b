//! Configuration data model and validation

use crate::client::TransportOptions;
use crate::types::{AggregationMode, AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Destination URL to probe
    #[serde(default)]
    pub destination: String,

    /// HTTP method used for every attempt
    #[serde(default = "default_method")]
    pub method: String,

    /// Number of attempts, also the sizing basis of the time budget
    #[serde(default = "default_count")]
    pub count: u32,

    /// Pacing delay between attempts, in seconds
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: f64,

    /// Per-attempt timeout, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// Follow redirects instead of reporting the first 3xx response
    #[serde(default = "default_true")]
    pub follow_redirects: bool,

    /// Validate TLS certificates
    #[serde(default = "default_true")]
    pub verify_tls: bool,

    /// Aggregate rtt min/avg/max over the zero-filled per-attempt table
    #[serde(default)]
    pub zero_fill_stats: bool,

    /// Print the final summary as JSON
    #[serde(default)]
    pub json_output: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            destination: String::new(),
            method: default_method(),
            count: default_count(),
            interval_seconds: default_interval_seconds(),
            timeout_seconds: default_timeout_secs(),
            follow_redirects: true,
            verify_tls: true,
            zero_fill_stats: false,
            json_output: false,
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Pacing interval, truncated to whole milliseconds
    pub fn interval(&self) -> Duration {
        interval_from_seconds(self.interval_seconds)
    }

    pub fn aggregation_mode(&self) -> AggregationMode {
        AggregationMode::from_zero_fill(self.zero_fill_stats)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.destination.trim().is_empty() {
            return Err(AppError::config("Destination URL is required (use -d or HTTPING_DESTINATION)"));
        }

        match url::Url::parse(&self.destination) {
            Ok(parsed) => {
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!(
                        "Destination must use http or https, got '{}'", parsed.scheme()
                    )));
                }
                if parsed.host_str().map_or(true, str::is_empty) {
                    return Err(AppError::config(format!("Destination '{}' has no host", self.destination)));
                }
            }
            Err(e) => {
                return Err(AppError::config(format!("Invalid destination URL '{}': {}", self.destination, e)));
            }
        }

        if self.count == 0 {
            return Err(AppError::config("Count must be greater than 0"));
        }

        if self.count > crate::defaults::MAX_COUNT {
            return Err(AppError::config(format!(
                "Count cannot exceed {}",
                crate::defaults::MAX_COUNT
            )));
        }

        if !self.interval_seconds.is_finite() || self.interval_seconds < 0.0 {
            return Err(AppError::config(format!(
                "Interval must be a non-negative number of seconds, got {}", self.interval_seconds
            )));
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.timeout_seconds > 300 {
            return Err(AppError::config("Timeout cannot exceed 300 seconds"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(destination) = std::env::var("HTTPING_DESTINATION") {
            let destination = destination.trim();
            if !destination.is_empty() {
                self.destination = destination.to_string();
            }
        }

        if let Ok(method) = std::env::var("HTTPING_METHOD") {
            let method = method.trim();
            if !method.is_empty() {
                self.method = method.to_string();
            }
        }

        if let Ok(count) = std::env::var("HTTPING_COUNT") {
            self.count = count.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid HTTPING_COUNT value '{}': {}", count, e)))?;
        }

        if let Ok(interval) = std::env::var("HTTPING_INTERVAL") {
            self.interval_seconds = interval.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid HTTPING_INTERVAL value '{}': {}", interval, e)))?;
        }

        if let Ok(timeout) = std::env::var("HTTPING_TIMEOUT") {
            self.timeout_seconds = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid HTTPING_TIMEOUT value '{}': {}", timeout, e)))?;
        }

        if let Ok(disable_redirect) = std::env::var("HTTPING_DISABLE_REDIRECT") {
            let disabled: bool = disable_redirect.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid HTTPING_DISABLE_REDIRECT value '{}': {}", disable_redirect, e)))?;
            self.follow_redirects = !disabled;
        }

        if let Ok(insecure) = std::env::var("HTTPING_INSECURE") {
            let insecure: bool = insecure.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid HTTPING_INSECURE value '{}': {}", insecure, e)))?;
            self.verify_tls = !insecure;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

/// Everything the probe loop needs for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    pub destination: String,
    pub method: String,
    pub count: u32,
    pub interval: Duration,
    pub transport: TransportOptions,
}

impl ProbeConfig {
    pub fn new(destination: impl Into<String>, method: impl Into<String>, count: u32) -> Self {
        Self {
            destination: destination.into(),
            method: method.into(),
            count,
            interval: interval_from_seconds(default_interval_seconds()),
            transport: TransportOptions::default(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }

    /// Wall-clock ceiling for the run: `count × interval`.
    ///
    /// `None` when the interval is zero, in which case only the attempt count
    /// bounds the loop.
    pub fn time_budget(&self) -> Option<Duration> {
        self.interval
            .checked_mul(self.count)
            .filter(|budget| !budget.is_zero())
    }
}

impl From<&Config> for ProbeConfig {
    fn from(config: &Config) -> Self {
        let transport = TransportOptions::default()
            .with_redirects(config.follow_redirects)
            .with_tls_verification(config.verify_tls)
            .with_timeout(config.timeout());

        Self {
            destination: config.destination.clone(),
            method: config.method.clone(),
            count: config.count,
            interval: config.interval(),
            transport,
        }
    }
}

/// Seconds to a Duration, truncated to whole milliseconds
pub fn interval_from_seconds(seconds: f64) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_millis((seconds * 1000.0) as u64)
}

// Default value functions for serde
fn default_method() -> String {
    crate::defaults::DEFAULT_METHOD.to_string()
}

fn default_count() -> u32 {
    crate::defaults::DEFAULT_COUNT
}

fn default_interval_seconds() -> f64 {
    crate::defaults::DEFAULT_INTERVAL_SECONDS
}

fn default_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TIMEOUT.as_secs()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

fn default_true() -> bool {
    true
}
