//! DiscoveryKit core - task prioritization rules.
//!
//! Pure, deterministic building blocks for hypothesis-driven discovery work:
//!
//! - [`Confidence`]: bounded belief value with explicit scale normalization
//! - [`Task`]: an actionable item optionally linked to a [`Hypothesis`]
//! - [`PriorityMatrix`]: (task type, confidence) -> priority tier
//! - [`PriorityGroups`]: bucketing of active tasks by stored priority
//! - [`evaluate_readiness`]: the "ready to graduate" rule
//!
//! Nothing in this crate performs I/O. Synchronization against a document
//! store lives in `discovery_runtime`.

pub mod grouping;
pub mod hypothesis;
pub mod matrix;
pub mod readiness;
pub mod task;

pub use grouping::PriorityGroups;
pub use hypothesis::{Confidence, ConfidenceError, ConfidenceScale, Hypothesis, HypothesisId};
pub use matrix::{ConfidenceBand, PriorityMatrix};
pub use readiness::{
    evaluate_readiness, is_ready_to_graduate, ReadinessReport, DEFAULT_READINESS_THRESHOLD,
};
pub use task::{
    normalize_assignees, NewTask, Priority, PriorityOrigin, Task, TaskId, TaskStatus, TaskType,
};

/// Version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
