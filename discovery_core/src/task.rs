//! Task data model
//!
//! Tasks are serialized in the camelCase shape used by the shared document
//! store. Deserialization is lenient where other clients are known to write
//! sloppy values: an unknown task type becomes `explore` and an unknown
//! priority becomes "no stored priority".

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::hypothesis::{Confidence, HypothesisId};
use crate::matrix::PriorityMatrix;

/// Opaque identifier for a task, unique within a project
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The effect a task is meant to have on its hypothesis
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// Gather evidence that would confirm the hypothesis
    Validate,
    /// Broad investigation around the hypothesis
    #[default]
    Explore,
    /// Gather evidence that would contradict the hypothesis
    Refute,
}

impl TaskType {
    /// Parse a task type, falling back to `Explore` for anything unrecognized
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("validate") => TaskType::Validate,
            Some("refute") => TaskType::Refute,
            _ => TaskType::Explore,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Validate => "validate",
            TaskType::Explore => "explore",
            TaskType::Refute => "refute",
        }
    }
}

/// Priority tier, most urgent first
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// All tiers in display order
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    /// Strict parse; `None` for anything that is not a known tier
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Critical and high tasks block graduation
    pub fn is_urgent(&self) -> bool {
        matches!(self, Priority::Critical | Priority::High)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task lifecycle status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Open,
    Scheduled,
    #[serde(alias = "done")]
    Completed,
}

impl TaskStatus {
    /// Completed tasks drop out of priority grouping and readiness
    pub fn is_active(&self) -> bool {
        !matches!(self, TaskStatus::Completed)
    }
}

/// Where the stored priority came from
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PriorityOrigin {
    /// Computed by the priority matrix from this confidence
    Derived { confidence: Confidence },
    /// Set by hand; stands until the linked confidence next changes
    #[default]
    Manual,
}

impl PriorityOrigin {
    pub fn is_manual(&self) -> bool {
        matches!(self, PriorityOrigin::Manual)
    }
}

/// An actionable item, optionally linked to a hypothesis
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "lenient_task_type")]
    pub task_type: TaskType,
    #[serde(default)]
    pub hypothesis_id: Option<HypothesisId>,
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub priority_origin: PriorityOrigin,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Build a new open task, deriving its priority from `confidence`.
    ///
    /// `confidence` is the linked hypothesis's current value, or zero when
    /// the task is unlinked or the hypothesis is unknown. An empty assignee
    /// list falls back to `placeholder`.
    pub fn create(input: NewTask, confidence: Confidence, placeholder: &str) -> Self {
        let task_type = TaskType::parse_lenient(input.task_type.as_deref());
        let now = Utc::now();
        Self {
            id: TaskId::generate(),
            message: input.message,
            task_type,
            hypothesis_id: input.hypothesis_id,
            priority: Some(PriorityMatrix::derive(task_type, confidence)),
            priority_origin: PriorityOrigin::Derived { confidence },
            status: TaskStatus::Open,
            assignees: normalize_assignees(input.assignees.unwrap_or_default(), placeholder),
            created_at: now,
            updated_at: now,
        }
    }

    /// The persisted priority, if it is a known tier
    pub fn stored_priority(&self) -> Option<Priority> {
        self.priority
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_linked_to(&self, hypothesis: &HypothesisId) -> bool {
        self.hypothesis_id.as_ref() == Some(hypothesis)
    }

    /// Priority the matrix would assign at `confidence`
    pub fn derived_priority(&self, confidence: Confidence) -> Priority {
        PriorityMatrix::derive(self.task_type, confidence)
    }

    /// Record a derived priority. Returns true if the stored value changed.
    pub fn apply_derived(&mut self, confidence: Confidence) -> bool {
        let next = self.derived_priority(confidence);
        self.priority_origin = PriorityOrigin::Derived { confidence };
        if self.priority == Some(next) {
            return false;
        }
        self.priority = Some(next);
        self.touch();
        true
    }

    /// Record a manual override
    pub fn apply_manual(&mut self, priority: Priority) {
        self.priority = Some(priority);
        self.priority_origin = PriorityOrigin::Manual;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Trims names, drops blanks, and substitutes `placeholder` for an empty list
pub fn normalize_assignees(assignees: Vec<String>, placeholder: &str) -> Vec<String> {
    let names: Vec<String> = assignees
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        vec![placeholder.to_string()]
    } else {
        names
    }
}

/// Task creation input from the UI or an accepted AI suggestion.
///
/// There is deliberately no priority field: priority is always derived.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub message: String,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub hypothesis_id: Option<HypothesisId>,
    #[serde(default)]
    pub assignees: Option<Vec<String>>,
}

impl NewTask {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }

    pub fn linked_to(mut self, hypothesis: impl Into<HypothesisId>) -> Self {
        self.hypothesis_id = Some(hypothesis.into());
        self
    }

    pub fn assigned_to(mut self, assignees: Vec<String>) -> Self {
        self.assignees = Some(assignees);
        self
    }
}

/// Any JSON value, kept only when it is a string
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseString {
    Str(String),
    Other(IgnoredAny),
}

impl LooseString {
    fn into_str(self) -> Option<String> {
        match self {
            LooseString::Str(value) => Some(value),
            LooseString::Other(_) => None,
        }
    }
}

fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<LooseString> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(LooseString::into_str))
}

fn lenient_task_type<'de, D>(deserializer: D) -> Result<TaskType, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = loose_string(deserializer)?;
    Ok(TaskType::parse_lenient(raw.as_deref()))
}

fn lenient_priority<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = loose_string(deserializer)?;
    Ok(raw.as_deref().and_then(Priority::parse))
}
