//! httping
//!
//! An HTTP latency probe. It sends sequential requests to one destination,
//! each over a freshly dialed connection, splits every round trip into
//! connection time and request time, and reports ping-style statistics.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use client::{TimedTransport, TransportError, TransportOptions, TransportTimings};
pub use error::{AppError, Result};
pub use executor::{cancellation_pair, AttemptReporter, CancellationHandle, CancellationToken, ProbeLoop};
pub use models::{AttemptOutcome, Config, ProbeConfig};
pub use stats::{ProbeStatistics, ProbeSummary};
pub use types::{AggregationMode, Termination};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_METHOD: &str = "GET";
    pub const DEFAULT_COUNT: u32 = 5;
    pub const DEFAULT_INTERVAL_SECONDS: f64 = 1.0;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_MAX_REDIRECTS: usize = 10;
    /// Upper bound for `count`; the RTT table holds one slot per attempt
    pub const MAX_COUNT: u32 = 1_000_000;
    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
