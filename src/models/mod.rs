//! Data models and structures for the probe

pub mod config;
pub mod metrics;

// Re-export main model types
pub use config::{Config, ProbeConfig};
pub use metrics::{AttemptOutcome, AttemptTiming};
