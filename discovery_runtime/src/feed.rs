//! Confidence feed events
//!
//! Hypothesis confidence arrives from a live subscription on the external
//! inquiry map. Each event is forwarded over an unbounded channel and consumed
//! by [`DiscoverySession::run_feed`](crate::session::DiscoverySession::run_feed).

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use discovery_core::HypothesisId;

/// One `{id, confidence}` record as delivered by the subscription.
///
/// `confidence` is a raw reading; the session's configured scale decides
/// whether it is a fraction or a percentage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceUpdate {
    pub id: HypothesisId,
    pub confidence: f64,
}

impl ConfidenceUpdate {
    pub fn new(id: impl Into<HypothesisId>, confidence: f64) -> Self {
        Self {
            id: id.into(),
            confidence,
        }
    }
}

/// A change notification from the hypothesis subscription
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum FeedEvent {
    /// A single hypothesis was added or modified
    Upsert(ConfidenceUpdate),
    /// The full current set; anything absent has been deleted
    Snapshot(Vec<ConfidenceUpdate>),
    /// A hypothesis was deleted
    Removed(HypothesisId),
}

pub type FeedSender = mpsc::UnboundedSender<FeedEvent>;
pub type FeedReceiver = mpsc::UnboundedReceiver<FeedEvent>;

/// Creates a new channel pair for feed events.
pub fn feed_channel() -> (FeedSender, FeedReceiver) {
    mpsc::unbounded_channel()
}

/// Totals for one run of the feed loop
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeedSummary {
    /// Events taken off the channel
    pub events: usize,
    /// Events that could not be applied (bad readings, unknown ids)
    pub rejected: usize,
    /// Priority writes that reached storage
    pub writes: usize,
    /// Whether the loop ended because of cancellation
    pub cancelled: bool,
}
