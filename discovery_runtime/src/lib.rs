//! DiscoveryKit runtime layer - confidence watching and priority sync.
//!
//! This crate wires the pure rules of `discovery_core` to a task store:
//!
//! - [`DiscoverySession`]: local task cache, confidence watcher, readiness
//! - [`TaskStorage`]: persistence seam, with [`InMemoryTaskStorage`] for tests
//! - [`FeedEvent`]: live hypothesis updates consumed by [`DiscoverySession::run_feed`]
//! - [`EngineConfig`]: YAML-loadable settings
//!
//! # Example
//!
//! ```rust,no_run
//! use discovery_runtime::{ConfidenceUpdate, DiscoverySession};
//! use discovery_core::NewTask;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let session = DiscoverySession::in_memory();
//! session.observe_confidence(ConfidenceUpdate::new("H1", 0.3)).await?;
//!
//! let task = session
//!     .create_task(NewTask::new("Talk to five users").with_type("explore").linked_to("H1"))
//!     .await?;
//! println!("{} -> {:?}", task.message, task.priority);
//! # Ok(())
//! # }
//! ```

pub mod cancellation;
pub mod command;
pub mod config;
pub mod error;
pub mod feed;
pub mod metrics;
pub mod retry;
pub mod session;
pub mod storage;
pub mod watcher;

pub use cancellation::{CancellationToken, CancellationTokenSource};
pub use command::{CommandOutcome, PersistCommand};
pub use config::{EngineConfig, WriteFailurePolicy, DEFAULT_ASSIGNEE};
pub use error::{EngineError, Result, StorageError};
pub use feed::{feed_channel, ConfidenceUpdate, FeedEvent, FeedReceiver, FeedSender, FeedSummary};
pub use metrics::{MetricKind, MetricsSnapshot, SyncMetrics};
pub use retry::{execute_with_retry, RetryConfig, RetryExhausted};
pub use session::{DiscoverySession, SnapshotReport, SyncReport};
pub use storage::{InMemoryTaskStorage, TaskPatch, TaskStorage};
pub use watcher::{ConfidenceWatcher, Observation};

/// Version of the runtime crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the runtime version at startup
pub fn init() {
    tracing::info!("DiscoveryKit runtime v{}", VERSION);
}
