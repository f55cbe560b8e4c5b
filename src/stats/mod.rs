//! Probe statistics accumulator and summary calculation


use crate::{
    error::{AppError, Result},
    models::metrics::AttemptOutcome,
    types::{AggregationMode, Termination},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters and RTT samples for one probe run.
///
/// Owned by the probing task and handed back to the caller when the loop
/// finishes; it is never shared while attempts are running.
#[derive(Debug, Clone)]
pub struct ProbeStatistics {
    destination: String,
    /// 1-based number of the next attempt
    sequence_number: u32,
    success_count: u32,
    failure_count: u32,
    /// One slot per configured attempt; failed and unattempted slots stay zero
    rtt_samples: Vec<u64>,
    /// RTTs of successful attempts only, in attempt order
    successful_rtts: Vec<u64>,
    started_at: DateTime<Utc>,
}

impl ProbeStatistics {
    pub fn new(destination: impl Into<String>, count: u32) -> Self {
        Self {
            destination: destination.into(),
            sequence_number: 1,
            success_count: 0,
            failure_count: 0,
            rtt_samples: vec![0; count as usize],
            successful_rtts: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Record one attempt and advance the sequence number.
    ///
    /// Returns the sequence number the attempt was recorded under.
    pub fn record(&mut self, outcome: &AttemptOutcome) -> u32 {
        let sequence = self.sequence_number;

        match outcome.rtt_ms() {
            Some(rtt_ms) => {
                self.success_count += 1;
                if let Some(slot) = self.rtt_samples.get_mut(sequence as usize - 1) {
                    *slot = rtt_ms;
                }
                self.successful_rtts.push(rtt_ms);
            }
            None => self.failure_count += 1,
        }

        self.sequence_number = self.sequence_number.saturating_add(1);
        sequence
    }

    /// Whether another attempt still has a slot
    pub fn has_capacity(&self) -> bool {
        (self.sequence_number as usize) <= self.rtt_samples.len()
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Attempts made so far
    pub fn attempts(&self) -> u32 {
        self.sequence_number - 1
    }

    pub fn rtt_samples(&self) -> &[u64] {
        &self.rtt_samples
    }

    pub fn successful_rtts(&self) -> &[u64] {
        &self.successful_rtts
    }

    /// Integer success percentage, `None` before the first attempt
    pub fn success_rate_percent(&self) -> Option<u32> {
        let attempts = u64::from(self.success_count) + u64::from(self.failure_count);
        if attempts == 0 {
            return None;
        }
        Some((u64::from(self.success_count) * 100 / attempts) as u32)
    }

    /// RTT min/avg/max under the given aggregation mode
    pub fn rtt_summary(&self, mode: AggregationMode) -> RttSummary {
        match mode {
            AggregationMode::SuccessfulOnly => RttSummary::from_samples(&self.successful_rtts),
            AggregationMode::ZeroFilled => RttSummary::from_samples(&self.rtt_samples),
        }
    }

    /// Build the final summary. Fails when no attempt was made.
    pub fn summarize(&self, mode: AggregationMode, termination: Termination) -> Result<ProbeSummary> {
        let success_rate_percent = self.success_rate_percent().ok_or_else(|| {
            AppError::statistics(format!("no probe was sent to {}", self.destination))
        })?;

        Ok(ProbeSummary {
            destination: self.destination.clone(),
            transmitted: self.attempts(),
            received: self.success_count,
            failed: self.failure_count,
            success_rate_percent,
            rtt: self.rtt_summary(mode),
            aggregation: mode,
            termination,
            started_at: self.started_at,
            finished_at: Utc::now(),
        })
    }
}

/// Round-trip time aggregates in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RttSummary {
    pub min_ms: u64,
    pub avg_ms: f64,
    pub max_ms: u64,
}

impl RttSummary {
    /// All zeros for an empty sample set
    pub fn from_samples(samples: &[u64]) -> Self {
        let (Some(&min_ms), Some(&max_ms)) = (samples.iter().min(), samples.iter().max()) else {
            return Self::default();
        };

        let sum: u128 = samples.iter().map(|&rtt| u128::from(rtt)).sum();
        let avg_ms = sum as f64 / samples.len() as f64;

        Self { min_ms, avg_ms, max_ms }
    }

    /// Average in its shortest form, rounded to three decimals (`120`, `101.5`)
    pub fn avg_display(&self) -> String {
        format_avg(self.avg_ms)
    }
}

pub fn format_avg(avg_ms: f64) -> String {
    let rounded = (avg_ms * 1000.0).round() / 1000.0;
    format!("{}", rounded)
}

/// Final result of a probe run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSummary {
    pub destination: String,
    pub transmitted: u32,
    pub received: u32,
    pub failed: u32,
    pub success_rate_percent: u32,
    pub rtt: RttSummary,
    pub aggregation: AggregationMode,
    pub termination: Termination,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
