//! Hypotheses and their confidence
//!
//! Hypotheses are owned by an external inquiry process; this crate only reads
//! them. The confidence value is the single input the priority rules need.

pub mod confidence;

pub use confidence::{Confidence, ConfidenceError, ConfidenceScale};

use serde::{Deserialize, Serialize};

/// Opaque identifier for a hypothesis, stable across the life of an inquiry
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HypothesisId(pub String);

impl HypothesisId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HypothesisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HypothesisId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for HypothesisId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A claim under investigation and its current evidence-weighted confidence
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub id: HypothesisId,
    pub confidence: Confidence,
}

impl Hypothesis {
    pub fn new(id: impl Into<HypothesisId>, confidence: Confidence) -> Self {
        Self {
            id: id.into(),
            confidence,
        }
    }

    pub fn id(&self) -> &HypothesisId {
        &self.id
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }
}
