//! Confidence change detection
//!
//! The watcher remembers the last confidence observed for each hypothesis and
//! classifies every new observation. Only a real change asks for the linked
//! tasks to be re-derived: the first sighting of a hypothesis establishes a
//! baseline and a repeated value is ignored, so initial loads and duplicate
//! snapshot events never cause writes.
//!
//! A watcher belongs to one session. Entries are pruned when a hypothesis is
//! removed or missing from a full snapshot, so the map never outgrows the set
//! of live hypotheses.

use indexmap::IndexMap;

use discovery_core::{Confidence, Hypothesis, HypothesisId};

/// Classification of one confidence observation
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Observation {
    /// First time this hypothesis was seen
    Baseline(Confidence),
    /// Same value as last time
    Unchanged(Confidence),
    /// Value moved; linked tasks need re-deriving
    Changed {
        previous: Confidence,
        current: Confidence,
    },
}

impl Observation {
    pub fn current(&self) -> Confidence {
        match *self {
            Observation::Baseline(c) | Observation::Unchanged(c) => c,
            Observation::Changed { current, .. } => current,
        }
    }

    pub fn is_change(&self) -> bool {
        matches!(self, Observation::Changed { .. })
    }
}

/// Per-session record of last observed confidence by hypothesis
#[derive(Clone, Debug, Default)]
pub struct ConfidenceWatcher {
    known: IndexMap<HypothesisId, Confidence>,
}

impl ConfidenceWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, id: &HypothesisId, confidence: Confidence) -> Observation {
        match self.known.get_mut(id) {
            None => {
                self.known.insert(id.clone(), confidence);
                Observation::Baseline(confidence)
            }
            Some(previous) if *previous == confidence => Observation::Unchanged(confidence),
            Some(previous) => {
                let before = *previous;
                *previous = confidence;
                Observation::Changed {
                    previous: before,
                    current: confidence,
                }
            }
        }
    }

    /// Last observed confidence
    pub fn known(&self, id: &HypothesisId) -> Option<Confidence> {
        self.known.get(id).copied()
    }

    /// Drop a deleted hypothesis. Returns true if it was tracked.
    pub fn forget(&mut self, id: &HypothesisId) -> bool {
        self.known.shift_remove(id).is_some()
    }

    /// Keep only the given ids; returns the pruned ones
    pub fn retain_only<'a, I>(&mut self, live: I) -> Vec<HypothesisId>
    where
        I: IntoIterator<Item = &'a HypothesisId>,
    {
        let live: std::collections::HashSet<&HypothesisId> = live.into_iter().collect();
        let stale: Vec<HypothesisId> = self
            .known
            .keys()
            .filter(|id| !live.contains(id))
            .cloned()
            .collect();
        for id in &stale {
            self.known.shift_remove(id);
        }
        stale
    }

    /// Tracked hypotheses in first-seen order
    pub fn hypotheses(&self) -> Vec<Hypothesis> {
        self.known
            .iter()
            .map(|(id, confidence)| Hypothesis::new(id.clone(), *confidence))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
