//! Priority matrix
//!
//! Maps (task type, hypothesis confidence) to a priority tier. Validation work
//! is most urgent while belief is still weak, refutation work only matters
//! once there is an established belief to stress-test, and exploration is
//! urgent only in the early, low-confidence band.

use crate::hypothesis::Confidence;
use crate::task::{Priority, TaskType};

/// Upper bound (inclusive) of the low-confidence band, in percent
pub const LOW_BAND_CEILING: f64 = 40.0;

/// Upper bound (inclusive) of the mid-confidence band, in percent
pub const MID_BAND_CEILING: f64 = 75.0;

/// Confidence band used to partition the rule table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfidenceBand {
    /// `pct <= 40`
    Low,
    /// `40 < pct <= 75`
    Mid,
    /// `pct > 75`
    High,
}

impl ConfidenceBand {
    pub fn of(confidence: Confidence) -> Self {
        Self::from_percent(confidence.percent())
    }

    /// Band for a percentage. NaN fails both comparisons and lands in `High`.
    pub fn from_percent(pct: f64) -> Self {
        if pct <= LOW_BAND_CEILING {
            ConfidenceBand::Low
        } else if pct <= MID_BAND_CEILING {
            ConfidenceBand::Mid
        } else {
            ConfidenceBand::High
        }
    }
}

/// Pure priority derivation. Identical inputs always yield the same tier.
pub struct PriorityMatrix;

impl PriorityMatrix {
    pub fn derive(task_type: TaskType, confidence: Confidence) -> Priority {
        Self::lookup(task_type, ConfidenceBand::of(confidence))
    }

    /// Derive from an unvalidated task type string and raw reading.
    ///
    /// Readings above 1 are taken as percentages, anything else is scaled by
    /// 100, so `1.0` means 100%. Never fails: unknown task types behave like
    /// `explore` and out-of-range readings fall into whichever band their
    /// percentage lands in.
    pub fn derive_raw(task_type: Option<&str>, raw: f64) -> Priority {
        let pct = if raw > 1.0 { raw } else { raw * 100.0 };
        Self::lookup(
            TaskType::parse_lenient(task_type),
            ConfidenceBand::from_percent(pct),
        )
    }

    pub fn lookup(task_type: TaskType, band: ConfidenceBand) -> Priority {
        match (band, task_type) {
            (ConfidenceBand::Low, TaskType::Validate) => Priority::Critical,
            (ConfidenceBand::Low, TaskType::Refute) => Priority::Low,
            (ConfidenceBand::Low, TaskType::Explore) => Priority::High,

            (ConfidenceBand::Mid, TaskType::Validate) => Priority::High,
            (ConfidenceBand::Mid, TaskType::Refute) => Priority::Medium,
            (ConfidenceBand::Mid, TaskType::Explore) => Priority::Low,

            (ConfidenceBand::High, TaskType::Refute) => Priority::Medium,
            (ConfidenceBand::High, TaskType::Validate | TaskType::Explore) => Priority::Low,
        }
    }
}
