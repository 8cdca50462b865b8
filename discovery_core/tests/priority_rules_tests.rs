//! Behavioural tests for the priority rules
//!
//! Covers the matrix boundaries, the fraction/percentage edge at 1.0,
//! grouping fallback and the graduation rule end to end.

use discovery_core::*;

fn conf(value: f64) -> Confidence {
    Confidence::new(value).unwrap()
}

#[test]
fn test_derivation_is_deterministic() {
    let types = [Some("validate"), Some("explore"), Some("refute"), Some("other"), None];
    for task_type in types {
        for step in 0..=100 {
            let raw = step as f64;
            let first = PriorityMatrix::derive_raw(task_type, raw);
            let second = PriorityMatrix::derive_raw(task_type, raw);
            assert_eq!(first, second, "type {:?} at {}", task_type, raw);
        }
    }
}

#[test]
fn test_validate_crosses_into_mid_band_above_forty() {
    assert_eq!(PriorityMatrix::derive_raw(Some("validate"), 0.40), Priority::Critical);
    assert_eq!(PriorityMatrix::derive_raw(Some("validate"), 0.41), Priority::High);
    assert_eq!(PriorityMatrix::derive(TaskType::Validate, conf(0.40)), Priority::Critical);
    assert_eq!(PriorityMatrix::derive(TaskType::Validate, conf(0.41)), Priority::High);
}

#[test]
fn test_refute_stays_medium_across_seventy_five() {
    assert_eq!(PriorityMatrix::derive_raw(Some("refute"), 0.75), Priority::Medium);
    assert_eq!(PriorityMatrix::derive_raw(Some("refute"), 0.76), Priority::Medium);
    // Only the low band differs for refutation work
    assert_eq!(PriorityMatrix::derive_raw(Some("refute"), 0.40), Priority::Low);
}

#[test]
fn test_missing_task_type_behaves_like_explore() {
    assert_eq!(PriorityMatrix::derive_raw(None, 0.3), Priority::High);
    assert_eq!(
        PriorityMatrix::derive_raw(None, 0.3),
        PriorityMatrix::derive_raw(Some("explore"), 0.3)
    );
}

#[test]
fn test_reading_of_one_means_full_confidence() {
    // 1 is not > 1, so it is scaled to 100% and lands in the high band
    assert_eq!(PriorityMatrix::derive_raw(Some("validate"), 1.0), Priority::Low);
    let normalized = ConfidenceScale::Auto.normalize(1.0).unwrap();
    assert_eq!(PriorityMatrix::derive(TaskType::Validate, normalized), Priority::Low);
}

#[test]
fn test_graduation_scenarios() {
    let task = Task::create(
        NewTask::new("Run pilot").with_type("validate").linked_to("A"),
        Confidence::ZERO,
        "Me",
    );

    let confident = [Hypothesis::new("A", conf(0.8))];
    assert!(is_ready_to_graduate(&confident, std::slice::from_ref(&task)));

    let weak = [Hypothesis::new("A", conf(0.3))];
    assert!(!is_ready_to_graduate(&weak, std::slice::from_ref(&task)));
}

#[test]
fn test_unknown_stored_priority_is_grouped_as_low() {
    let json = r#"[
        {"id": "t1", "message": "a", "priority": "sometime"},
        {"id": "t2", "message": "b"},
        {"id": "t3", "message": "c", "priority": "high"}
    ]"#;
    let tasks: Vec<Task> = serde_json::from_str(json).unwrap();
    let groups = PriorityGroups::from_tasks(&tasks);

    let low: Vec<&str> = groups
        .bucket(Priority::Low)
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(low, vec!["t1", "t2"]);
    assert_eq!(groups.bucket(Priority::High).len(), 1);
    assert_eq!(groups.total(), 3);
}
