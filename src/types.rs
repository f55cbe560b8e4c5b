//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// How rtt min/avg/max are aggregated in the final summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Only RTTs of successful attempts count
    #[default]
    SuccessfulOnly,
    /// Every slot of the fixed per-attempt table counts, zeros included.
    /// Failed and unattempted slots pull the minimum and average down.
    ZeroFilled,
}

impl AggregationMode {
    pub fn from_zero_fill(zero_fill: bool) -> Self {
        if zero_fill {
            Self::ZeroFilled
        } else {
            Self::SuccessfulOnly
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SuccessfulOnly => write!(f, "successful-only"),
            Self::ZeroFilled => write!(f, "zero-filled"),
        }
    }
}

/// Why the probe loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// All configured attempts were made
    CountExhausted,
    /// The `count × interval` time budget ran out first
    BudgetExhausted,
    /// An external cancellation signal stopped the loop
    Cancelled,
}

impl Termination {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountExhausted => write!(f, "count exhausted"),
            Self::BudgetExhausted => write!(f, "time budget exhausted"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}
