//! "Ready to graduate" evaluation
//!
//! A project is ready to move to its next phase once at least one hypothesis
//! is held with high confidence and none of those hypotheses still has an
//! urgent task attached. Urgency here is re-derived from the live confidence
//! rather than read from the stored priority, so a stale stored value can
//! neither block nor release graduation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::hypothesis::{Confidence, Hypothesis, HypothesisId};
use crate::task::{Task, TaskId};

/// Confidence at or above which a hypothesis counts as established
pub const DEFAULT_READINESS_THRESHOLD: f64 = Confidence::ESTABLISHED.get();

/// Outcome of a readiness evaluation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub ready: bool,
    /// Hypotheses at or above the threshold
    pub confident: Vec<HypothesisId>,
    /// Active tasks whose re-derived priority is critical or high
    pub blocking: Vec<TaskId>,
}

pub fn evaluate_readiness<'a, I>(
    hypotheses: &[Hypothesis],
    tasks: I,
    threshold: Confidence,
) -> ReadinessReport
where
    I: IntoIterator<Item = &'a Task>,
{
    let confident: HashMap<&HypothesisId, Confidence> = hypotheses
        .iter()
        .filter(|h| h.confidence >= threshold)
        .map(|h| (&h.id, h.confidence))
        .collect();

    if confident.is_empty() {
        return ReadinessReport::default();
    }

    let blocking: Vec<TaskId> = tasks
        .into_iter()
        .filter(|t| t.is_active())
        .filter_map(|t| {
            let confidence = t.hypothesis_id.as_ref().and_then(|id| confident.get(id))?;
            t.derived_priority(*confidence).is_urgent().then(|| t.id.clone())
        })
        .collect();

    let mut confident_ids: Vec<HypothesisId> = confident.into_keys().cloned().collect();
    confident_ids.sort();

    if !blocking.is_empty() {
        tracing::debug!(
            blocking = blocking.len(),
            "graduation blocked by urgent tasks on confident hypotheses"
        );
    }

    ReadinessReport {
        ready: blocking.is_empty(),
        confident: confident_ids,
        blocking,
    }
}

/// Readiness at the default threshold
pub fn is_ready_to_graduate<'a, I>(hypotheses: &[Hypothesis], tasks: I) -> bool
where
    I: IntoIterator<Item = &'a Task>,
{
    evaluate_readiness(hypotheses, tasks, Confidence::ESTABLISHED).ready
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{NewTask, TaskStatus};

    const NO_TASKS: &[Task] = &[];

    fn hyp(id: &str, confidence: f64) -> Hypothesis {
        Hypothesis::new(id, Confidence::new(confidence).unwrap())
    }

    fn linked(task_type: &str, hypothesis: &str) -> Task {
        Task::create(
            NewTask::new("t").with_type(task_type).linked_to(hypothesis),
            Confidence::ZERO,
            "Me",
        )
    }

    #[test]
    fn test_no_confident_hypothesis_is_not_ready() {
        assert!(!is_ready_to_graduate(&[hyp("A", 0.5)], NO_TASKS));
        assert!(!is_ready_to_graduate(&[], NO_TASKS));
    }

    #[test]
    fn test_confident_without_tasks_is_ready() {
        let report = evaluate_readiness(
            &[hyp("A", 0.9), hyp("B", 0.2)],
            NO_TASKS,
            Confidence::new(0.75).unwrap(),
        );
        assert!(report.ready);
        assert_eq!(report.confident, vec![HypothesisId::from("A")]);
    }

    #[test]
    fn test_recomputes_instead_of_trusting_stored_priority() {
        // Stored priority says critical (derived at zero), live confidence says low
        let task = linked("validate", "A");
        assert_eq!(task.priority, Some(crate::task::Priority::Critical));
        assert!(is_ready_to_graduate(&[hyp("A", 0.8)], &[task]));
    }

    #[test]
    fn test_validate_at_threshold_is_still_mid_band() {
        // 75% sits in the mid band where validation work is high priority
        let report = evaluate_readiness(
            &[hyp("A", 0.75)],
            &[linked("validate", "A")],
            Confidence::new(0.75).unwrap(),
        );
        assert!(!report.ready);
        assert_eq!(report.blocking.len(), 1);
    }

    #[test]
    fn test_completed_tasks_do_not_block() {
        let mut task = linked("validate", "A");
        task.status = TaskStatus::Completed;
        assert!(is_ready_to_graduate(&[hyp("A", 0.75)], &[task]));
    }

    #[test]
    fn test_tasks_on_other_hypotheses_do_not_block() {
        let tasks = vec![linked("validate", "B"), linked("explore", "A")];
        assert!(is_ready_to_graduate(&[hyp("A", 0.8), hyp("B", 0.1)], &tasks));
    }
}
