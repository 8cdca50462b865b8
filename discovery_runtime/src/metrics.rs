//! Synchronization metrics for observations and writes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Kind of event being counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// First observation of a hypothesis
    Baseline,
    /// Confidence actually moved
    ConfidenceChange,
    /// Same confidence observed again
    DuplicateObservation,
    /// Priority write reached storage
    PriorityWrite,
    /// Re-derived priority matched the stored one, no write
    SkippedWrite,
    /// Write dropped after retries
    WriteFailure,
}

impl MetricKind {
    const COUNT: usize = 6;
}

/// Counters shared between a session and anyone holding a clone.
#[derive(Clone, Debug, Default)]
pub struct SyncMetrics {
    inner: Arc<[AtomicU64; MetricKind::COUNT]>,
}

/// Point-in-time copy of the counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub baselines: u64,
    pub confidence_changes: u64,
    pub duplicate_observations: u64,
    pub priority_writes: u64,
    pub skipped_writes: u64,
    pub write_failures: u64,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: MetricKind) {
        self.add(kind, 1);
    }

    pub fn add(&self, kind: MetricKind, amount: u64) {
        self.inner[kind as usize].fetch_add(amount, Ordering::Relaxed);
    }

    pub fn count(&self, kind: MetricKind) -> u64 {
        self.inner[kind as usize].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            baselines: self.count(MetricKind::Baseline),
            confidence_changes: self.count(MetricKind::ConfidenceChange),
            duplicate_observations: self.count(MetricKind::DuplicateObservation),
            priority_writes: self.count(MetricKind::PriorityWrite),
            skipped_writes: self.count(MetricKind::SkippedWrite),
            write_failures: self.count(MetricKind::WriteFailure),
        }
    }

    pub fn reset(&self) {
        for counter in self.inner.iter() {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
