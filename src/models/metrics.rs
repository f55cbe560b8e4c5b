//! Per-attempt timing and outcome data models

use crate::client::TransportTimings;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing breakdown of a single probe attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttemptTiming {
    /// Exchange start to response headers
    pub total: Duration,

    /// TCP dial time of the last dial; a TLS handshake is not part of it
    pub connection: Duration,

    /// `total - connection`, saturating at zero
    pub request_only: Duration,

    /// Number of dials the exchange needed (more than one when redirects
    /// cross to another host)
    pub dial_count: u32,
}

impl AttemptTiming {
    pub fn from_transport(timings: &TransportTimings) -> Self {
        Self {
            total: timings.total_duration(),
            connection: timings.connection_duration(),
            request_only: timings.request_only_duration(),
            dial_count: timings.dial_count(),
        }
    }

    /// Round-trip time in whole milliseconds, truncated
    pub fn rtt_ms(&self) -> u64 {
        duration_to_ms(self.total)
    }

    pub fn connection_ms(&self) -> u64 {
        duration_to_ms(self.connection)
    }

    pub fn request_ms(&self) -> u64 {
        duration_to_ms(self.request_only)
    }

    /// Whether connection/request can be attributed to a single dial
    pub fn is_decomposable(&self) -> bool {
        self.dial_count == 1
    }
}

/// Result of one probe attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    /// A response arrived and its body was fully read
    Success {
        status_code: u16,
        body_bytes: usize,
        timing: AttemptTiming,
        timestamp: DateTime<Utc>,
    },
    /// Request construction, dial, exchange or body read failed
    Failure {
        error: AppError,
        timestamp: DateTime<Utc>,
    },
}

impl AttemptOutcome {
    /// Create a successful outcome
    pub fn success(status_code: u16, body_bytes: usize, timing: AttemptTiming) -> Self {
        Self::Success {
            status_code,
            body_bytes,
            timing,
            timestamp: Utc::now(),
        }
    }

    /// Create a failed outcome
    pub fn failure(error: AppError) -> Self {
        Self::Failure {
            error,
            timestamp: Utc::now(),
        }
    }

    /// RTT in milliseconds, only for successful attempts
    pub fn rtt_ms(&self) -> Option<u64> {
        match self {
            Self::Success { timing, .. } => Some(timing.rtt_ms()),
            Self::Failure { .. } => None,
        }
    }

    /// When the attempt finished
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Success { timestamp, .. } | Self::Failure { timestamp, .. } => *timestamp,
        }
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(total_ms: u64, conn_ms: u64) -> AttemptTiming {
        AttemptTiming {
            total: Duration::from_millis(total_ms),
            connection: Duration::from_millis(conn_ms),
            request_only: Duration::from_millis(total_ms).saturating_sub(Duration::from_millis(conn_ms)),
            dial_count: 1,
        }
    }

    #[test]
    fn test_rtt_truncates_to_millis() {
        let timing = AttemptTiming {
            total: Duration::from_micros(42_999),
            ..Default::default()
        };
        assert_eq!(timing.rtt_ms(), 42);
    }

    #[test]
    fn test_success_outcome() {
        let outcome = AttemptOutcome::success(200, 512, timing(42, 12));
        assert_eq!(outcome.rtt_ms(), Some(42));

        let AttemptOutcome::Success { status_code, body_bytes, timing, .. } = &outcome else {
            panic!("expected a success");
        };
        assert_eq!(*status_code, 200);
        assert_eq!(*body_bytes, 512);
        assert_eq!(timing.connection_ms(), 12);
        assert_eq!(timing.request_ms(), 30);
        assert!(timing.is_decomposable());
    }

    #[test]
    fn test_failure_outcome() {
        let before = Utc::now();
        let outcome = AttemptOutcome::failure(AppError::network("connection refused"));
        assert_eq!(outcome.rtt_ms(), None);
        assert!(outcome.timestamp() >= before);

        let AttemptOutcome::Failure { error, .. } = &outcome else {
            panic!("expected a failure");
        };
        assert!(error.to_string().contains("connection refused"));
    }

    #[test]
    fn test_multiple_dials_not_decomposable() {
        let mut timing = timing(80, 20);
        timing.dial_count = 2;
        assert!(!timing.is_decomposable());
    }
}
