//! Trading signals emitted by strategies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Desired exposure after a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Hold a long position
    Long,
    /// Hold a short position
    Short,
    /// Close any open position
    Flat,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
            Direction::Flat => write!(f, "FLAT"),
        }
    }
}

/// A strategy's decision for one bar.
///
/// Strategies return `Option<Signal>`; `None` means hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Timestamp of the bar the signal was produced on (Unix milliseconds)
    pub timestamp: i64,
    /// Target direction
    pub direction: Direction,
    /// Conviction in [0, 1]
    pub strength: f64,
    /// Human readable reason
    pub reason: String,
}

impl Signal {
    /// Create a full-strength signal.
    pub fn new(timestamp: i64, direction: Direction) -> Self {
        Self {
            timestamp,
            direction,
            strength: 1.0,
            reason: String::new(),
        }
    }

    /// Shorthand for a long signal.
    pub fn long(timestamp: i64) -> Self {
        Self::new(timestamp, Direction::Long)
    }

    /// Shorthand for a short signal.
    pub fn short(timestamp: i64) -> Self {
        Self::new(timestamp, Direction::Short)
    }

    /// Shorthand for an exit signal.
    pub fn flat(timestamp: i64) -> Self {
        Self::new(timestamp, Direction::Flat)
    }

    /// Set the strength, clamped to [0, 1]. NaN becomes 0.
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = if strength.is_nan() {
            0.0
        } else {
            strength.clamp(0.0, 1.0)
        };
        self
    }

    /// Attach a reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}
