//! Discovery session: the task store and confidence watcher in one place.
//!
//! A [`DiscoverySession`] owns the local view of every task plus the last
//! confidence seen for every hypothesis. Mutations are applied locally first
//! and then persisted through [`TaskStorage`]. A failed write never fails the
//! caller; it is logged, counted, and handled according to the configured
//! [`WriteFailurePolicy`].
//!
//! Confidence observations only trigger re-derivation when the value actually
//! moves. The first observation of a hypothesis establishes a baseline and
//! writes nothing, and a repeated value is a no-op.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinSet;

use discovery_core::{
    evaluate_readiness, normalize_assignees, Confidence, Hypothesis, HypothesisId, NewTask,
    Priority, PriorityGroups, ReadinessReport, Task, TaskId, TaskStatus, TaskType,
};

use crate::cancellation::CancellationToken;
use crate::command::{self, CommandOutcome, PersistCommand};
use crate::config::{EngineConfig, WriteFailurePolicy};
use crate::error::{EngineError, Result};
use crate::feed::{ConfidenceUpdate, FeedEvent, FeedReceiver, FeedSummary};
use crate::metrics::{MetricKind, MetricsSnapshot, SyncMetrics};
use crate::storage::{InMemoryTaskStorage, TaskPatch, TaskStorage};
use crate::watcher::{ConfidenceWatcher, Observation};

/// What one confidence observation did to the linked tasks
#[derive(Clone, Debug, PartialEq)]
pub struct SyncReport {
    pub hypothesis_id: HypothesisId,
    pub observation: Observation,
    /// Tasks whose new priority reached storage
    pub written: Vec<TaskId>,
    /// Tasks whose re-derived priority matched the stored one
    pub unchanged: usize,
    /// Tasks whose write was dropped after retries
    pub failed: Vec<TaskId>,
}

impl SyncReport {
    fn quiet(hypothesis_id: HypothesisId, observation: Observation) -> Self {
        Self {
            hypothesis_id,
            observation,
            written: Vec::new(),
            unchanged: 0,
            failed: Vec::new(),
        }
    }

    /// Number of linked tasks that were re-derived
    pub fn recomputed(&self) -> usize {
        self.written.len() + self.failed.len() + self.unchanged
    }
}

/// Result of applying a full hypothesis snapshot
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SnapshotReport {
    pub reports: Vec<SyncReport>,
    /// Hypotheses dropped because they were absent from the snapshot
    pub pruned: Vec<HypothesisId>,
    /// Entries whose reading could not be normalized
    pub rejected: Vec<HypothesisId>,
}

impl SnapshotReport {
    pub fn writes(&self) -> usize {
        self.reports.iter().map(|r| r.written.len()).sum()
    }
}

struct SessionState {
    tasks: IndexMap<TaskId, Task>,
    watcher: ConfidenceWatcher,
}

/// Task store plus confidence watcher for one open project
pub struct DiscoverySession {
    config: EngineConfig,
    threshold: Confidence,
    storage: Arc<dyn TaskStorage>,
    state: RwLock<SessionState>,
    metrics: SyncMetrics,
    readiness: watch::Sender<ReadinessReport>,
}

impl DiscoverySession {
    /// Create a session over `storage`.
    ///
    /// # Errors
    /// Returns `EngineError::Config` if the configuration does not validate.
    pub fn new(storage: Arc<dyn TaskStorage>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let threshold = config.threshold()?;
        Ok(Self::build(storage, config, threshold))
    }

    /// Session over an empty in-memory store with default configuration
    pub fn in_memory() -> Self {
        Self::build(
            Arc::new(InMemoryTaskStorage::new()),
            EngineConfig::default(),
            Confidence::ESTABLISHED,
        )
    }

    fn build(storage: Arc<dyn TaskStorage>, config: EngineConfig, threshold: Confidence) -> Self {
        let (readiness, _) = watch::channel(ReadinessReport::default());
        tracing::info!(
            user = %config.current_user,
            threshold = %threshold,
            policy = ?config.write_failure,
            "discovery session started"
        );
        Self {
            config,
            threshold,
            storage,
            state: RwLock::new(SessionState {
                tasks: IndexMap::new(),
                watcher: ConfidenceWatcher::new(),
            }),
            metrics: SyncMetrics::new(),
            readiness,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn TaskStorage> {
        &self.storage
    }

    /// Replace the local task cache with what storage currently holds.
    ///
    /// Stored priorities are taken as-is; nothing is re-derived on load.
    pub async fn load(&self) -> Result<usize> {
        let tasks = self.storage.list_tasks().await?;
        let count = tasks.len();
        {
            let mut state = self.state.write().await;
            state.tasks = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        }
        tracing::info!(count, "loaded tasks from storage");
        self.publish_readiness().await;
        Ok(count)
    }

    // -- task mutations --------------------------------------------------

    /// Create a task with a derived priority.
    ///
    /// The priority comes from the linked hypothesis' last observed confidence,
    /// or zero when the task is unlinked or the hypothesis has not been seen.
    ///
    /// The task is returned as built. Under [`WriteFailurePolicy::Revert`] a
    /// failed insert removes it from the session again, so check
    /// [`task`](Self::task) if the local copy matters.
    pub async fn create_task(&self, input: NewTask) -> Result<Task> {
        if input.message.trim().is_empty() {
            return Err(EngineError::InvalidInput("task message must not be empty".into()));
        }

        let task = {
            let mut state = self.state.write().await;
            let confidence = input
                .hypothesis_id
                .as_ref()
                .and_then(|id| state.watcher.known(id))
                .unwrap_or(Confidence::ZERO);
            let task = Task::create(input, confidence, &self.config.current_user);
            state.tasks.insert(task.id.clone(), task.clone());
            task
        };

        tracing::debug!(task = %task.id, priority = ?task.priority, "task created");
        self.commit(PersistCommand::Create(task.clone()), None, Some(task.clone()))
            .await;
        self.publish_readiness().await;
        Ok(task)
    }

    /// Set a priority by hand. It sticks until the linked confidence next moves.
    pub async fn set_priority(&self, id: &TaskId, priority: Priority) -> Result<Task> {
        self.update_task(id, |task, _| {
            task.apply_manual(priority);
            TaskPatch::manual_priority(priority)
        })
        .await
    }

    pub async fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task> {
        self.update_task(id, |task, _| {
            task.status = status;
            task.touch();
            TaskPatch::status(status)
        })
        .await
    }

    /// Replace the assignee list. An empty list falls back to the current user.
    pub async fn set_assignees(&self, id: &TaskId, assignees: Vec<String>) -> Result<Task> {
        let assignees = normalize_assignees(assignees, &self.config.current_user);
        self.update_task(id, |task, _| {
            task.assignees = assignees.clone();
            task.touch();
            TaskPatch::assignees(assignees)
        })
        .await
    }

    /// Link a task to a hypothesis (or unlink it with `None`) and re-derive
    pub async fn link_hypothesis(
        &self,
        id: &TaskId,
        hypothesis: Option<HypothesisId>,
    ) -> Result<Task> {
        self.update_task(id, |task, watcher| {
            let confidence = hypothesis
                .as_ref()
                .and_then(|h| watcher.known(h))
                .unwrap_or(Confidence::ZERO);
            task.hypothesis_id = hypothesis;
            task.apply_derived(confidence);
            task.touch();
            TaskPatch::priority_sync(task)
        })
        .await
    }

    pub async fn set_task_type(&self, id: &TaskId, task_type: TaskType) -> Result<Task> {
        self.update_task(id, |task, watcher| {
            let confidence = task
                .hypothesis_id
                .as_ref()
                .and_then(|h| watcher.known(h))
                .unwrap_or(Confidence::ZERO);
            task.task_type = task_type;
            task.apply_derived(confidence);
            task.touch();
            TaskPatch::priority_sync(task)
        })
        .await
    }

    pub async fn delete_task(&self, id: &TaskId) -> Result<Task> {
        let removed = {
            let mut state = self.state.write().await;
            state.tasks.shift_remove(id)
        }
        .ok_or_else(|| EngineError::NotFound(format!("task {}", id)))?;

        self.commit(PersistCommand::Delete(id.clone()), Some(removed.clone()), None)
            .await;
        self.publish_readiness().await;
        Ok(removed)
    }

    // -- confidence observations -----------------------------------------

    /// Record one confidence reading and re-derive linked tasks if it moved.
    ///
    /// # Errors
    /// Returns `EngineError::Confidence` if the reading cannot be normalized
    /// under the configured scale. The watcher is left untouched in that case.
    pub async fn observe_confidence(&self, update: ConfidenceUpdate) -> Result<SyncReport> {
        let confidence = self
            .config
            .confidence_scale
            .normalize(update.confidence)
            .map_err(|e| {
                tracing::warn!(hypothesis = %update.id, raw = update.confidence, "rejected reading: {}", e);
                e
            })?;
        let report = self.apply_observation(update.id, confidence).await;
        self.publish_readiness().await;
        Ok(report)
    }

    /// Apply the full current hypothesis set.
    ///
    /// Every entry is observed in order. Hypotheses the watcher knows but the
    /// snapshot omits are forgotten.
    pub async fn observe_snapshot(&self, updates: Vec<ConfidenceUpdate>) -> SnapshotReport {
        let mut report = SnapshotReport::default();
        let live: Vec<HypothesisId> = updates.iter().map(|u| u.id.clone()).collect();

        for update in updates {
            match self.config.confidence_scale.normalize(update.confidence) {
                Ok(confidence) => {
                    report
                        .reports
                        .push(self.apply_observation(update.id, confidence).await);
                }
                Err(e) => {
                    tracing::warn!(hypothesis = %update.id, raw = update.confidence, "rejected reading: {}", e);
                    report.rejected.push(update.id);
                }
            }
        }

        report.pruned = self.state.write().await.watcher.retain_only(live.iter());
        if !report.pruned.is_empty() {
            tracing::debug!(pruned = report.pruned.len(), "forgot hypotheses missing from snapshot");
        }
        self.publish_readiness().await;
        report
    }

    /// Forget a deleted hypothesis. Tasks linked to it keep their link.
    pub async fn remove_hypothesis(&self, id: &HypothesisId) -> bool {
        let removed = self.state.write().await.watcher.forget(id);
        if removed {
            tracing::debug!(hypothesis = %id, "hypothesis removed");
            self.publish_readiness().await;
        }
        removed
    }

    async fn apply_observation(&self, id: HypothesisId, confidence: Confidence) -> SyncReport {
        let (observation, pending, unchanged) = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            let observation = state.watcher.observe(&id, confidence);

            match observation {
                Observation::Baseline(_) => {
                    self.metrics.record(MetricKind::Baseline);
                    return SyncReport::quiet(id, observation);
                }
                Observation::Unchanged(_) => {
                    self.metrics.record(MetricKind::DuplicateObservation);
                    return SyncReport::quiet(id, observation);
                }
                Observation::Changed { .. } => {
                    self.metrics.record(MetricKind::ConfidenceChange);
                }
            }

            let mut pending = Vec::new();
            let mut unchanged = 0;
            for task in state.tasks.values_mut().filter(|t| t.is_linked_to(&id)) {
                let previous = task.clone();
                if task.apply_derived(confidence) {
                    pending.push((previous, task.clone()));
                } else {
                    unchanged += 1;
                }
            }
            (observation, pending, unchanged)
        };

        tracing::debug!(
            hypothesis = %id,
            confidence = %confidence,
            pending = pending.len(),
            unchanged,
            "confidence changed"
        );
        self.metrics.add(MetricKind::SkippedWrite, unchanged as u64);

        let mut report = SyncReport {
            hypothesis_id: id,
            observation,
            written: Vec::new(),
            unchanged,
            failed: Vec::new(),
        };

        // Each write stands alone; one failure must not hold up the rest.
        let mut writes = JoinSet::new();
        for (previous, updated) in pending {
            let storage = Arc::clone(&self.storage);
            let retry = self.config.retry.clone();
            writes.spawn(async move {
                let command = PersistCommand::Patch {
                    task_id: updated.id.clone(),
                    patch: TaskPatch::priority_sync(&updated),
                };
                let outcome = command::execute(storage.as_ref(), &command, &retry).await;
                (previous, updated, outcome)
            });
        }

        while let Some(joined) = writes.join_next().await {
            match joined {
                Ok((previous, updated, outcome)) => {
                    let id = updated.id.clone();
                    if self.settle(&outcome, true, Some(previous), Some(&updated)).await {
                        report.written.push(id);
                    } else {
                        report.failed.push(id);
                    }
                }
                Err(e) => tracing::warn!("priority write task aborted: {}", e),
            }
        }

        report
    }

    // -- queries ---------------------------------------------------------

    /// All tasks in insertion order
    pub async fn tasks(&self) -> Vec<Task> {
        self.state.read().await.tasks.values().cloned().collect()
    }

    pub async fn task(&self, id: &TaskId) -> Option<Task> {
        self.state.read().await.tasks.get(id).cloned()
    }

    /// Hypotheses with their last observed confidence
    pub async fn hypotheses(&self) -> Vec<Hypothesis> {
        self.state.read().await.watcher.hypotheses()
    }

    pub async fn confidence_of(&self, id: &HypothesisId) -> Option<Confidence> {
        self.state.read().await.watcher.known(id)
    }

    /// Active tasks bucketed by stored priority
    pub async fn groups(&self) -> PriorityGroups {
        PriorityGroups::from_tasks(self.state.read().await.tasks.values())
    }

    pub async fn readiness(&self) -> ReadinessReport {
        let state = self.state.read().await;
        evaluate_readiness(&state.watcher.hypotheses(), state.tasks.values(), self.threshold)
    }

    /// Receiver that sees every change in readiness
    pub fn subscribe_readiness(&self) -> watch::Receiver<ReadinessReport> {
        self.readiness.subscribe()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    // -- feed ------------------------------------------------------------

    /// Consume feed events until the channel closes or `token` is cancelled.
    ///
    /// An event already being applied runs to completion; cancellation is
    /// only checked between events.
    pub async fn run_feed(&self, mut events: FeedReceiver, token: CancellationToken) -> FeedSummary {
        let mut summary = FeedSummary::default();
        tracing::info!("confidence feed started");

        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    summary.cancelled = true;
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            summary.events += 1;
            match self.apply_event(event).await {
                Ok(writes) => summary.writes += writes,
                Err(e) => {
                    summary.rejected += 1;
                    tracing::warn!("feed event rejected: {}", e);
                }
            }
        }

        tracing::info!(
            events = summary.events,
            rejected = summary.rejected,
            writes = summary.writes,
            cancelled = summary.cancelled,
            "confidence feed stopped"
        );
        summary
    }

    async fn apply_event(&self, event: FeedEvent) -> Result<usize> {
        match event {
            FeedEvent::Upsert(update) => {
                Ok(self.observe_confidence(update).await?.written.len())
            }
            // Unreadable entries are logged and skipped inside observe_snapshot
            FeedEvent::Snapshot(updates) => Ok(self.observe_snapshot(updates).await.writes()),
            FeedEvent::Removed(id) => {
                if self.remove_hypothesis(&id).await {
                    Ok(0)
                } else {
                    Err(EngineError::NotFound(format!("hypothesis {}", id)))
                }
            }
        }
    }

    // -- persistence -----------------------------------------------------

    async fn update_task<F>(&self, id: &TaskId, mutate: F) -> Result<Task>
    where
        F: FnOnce(&mut Task, &ConfidenceWatcher) -> TaskPatch,
    {
        let (previous, updated, patch) = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            let task = state
                .tasks
                .get_mut(id)
                .ok_or_else(|| EngineError::NotFound(format!("task {}", id)))?;
            let previous = task.clone();
            let patch = mutate(task, &state.watcher);
            (previous, task.clone(), patch)
        };

        self.commit(
            PersistCommand::Patch {
                task_id: id.clone(),
                patch,
            },
            Some(previous),
            Some(updated.clone()),
        )
        .await;
        self.publish_readiness().await;

        // Under the revert policy a failed write has already restored the old value
        let current = self.state.read().await.tasks.get(id).cloned();
        Ok(current.unwrap_or(updated))
    }

    async fn commit(
        &self,
        command: PersistCommand,
        previous: Option<Task>,
        applied: Option<Task>,
    ) -> bool {
        let carries_priority = match &command {
            PersistCommand::Patch { patch, .. } => patch.priority.is_some(),
            _ => false,
        };
        let outcome = command::execute(self.storage.as_ref(), &command, &self.config.retry).await;
        self.settle(&outcome, carries_priority, previous, applied.as_ref())
            .await
    }

    /// Account for a finished write. Returns whether it landed.
    async fn settle(
        &self,
        outcome: &CommandOutcome,
        carries_priority: bool,
        previous: Option<Task>,
        applied: Option<&Task>,
    ) -> bool {
        if outcome.is_applied() {
            if carries_priority {
                self.metrics.record(MetricKind::PriorityWrite);
            }
            return true;
        }

        self.metrics.record(MetricKind::WriteFailure);
        if self.config.write_failure == WriteFailurePolicy::Revert {
            self.revert(previous, applied).await;
        }
        false
    }

    /// Roll the local copy back, unless something newer already replaced it
    async fn revert(&self, previous: Option<Task>, applied: Option<&Task>) {
        let Some(id) = previous
            .as_ref()
            .map(|t| t.id.clone())
            .or_else(|| applied.map(|t| t.id.clone()))
        else {
            return;
        };

        let mut state = self.state.write().await;
        if state.tasks.get(&id) != applied {
            tracing::debug!(task = %id, "skipping revert, task changed since the failed write");
            return;
        }
        match previous {
            Some(task) => {
                state.tasks.insert(id.clone(), task);
            }
            None => {
                state.tasks.shift_remove(&id);
            }
        }
        tracing::info!(task = %id, "reverted local change after failed write");
    }

    /// Recompute readiness and publish it if it moved.
    ///
    /// The read guard is held until the send completes, so no mutation can
    /// land between computing a report and publishing it.
    async fn publish_readiness(&self) {
        let state = self.state.read().await;
        let report =
            evaluate_readiness(&state.watcher.hypotheses(), state.tasks.values(), self.threshold);
        self.readiness.send_if_modified(|current| {
            if *current == report {
                false
            } else {
                *current = report;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_rejects_blank_message() {
        let session = DiscoverySession::in_memory();
        let err = session.create_task(NewTask::new("   ")).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
        assert!(session.tasks().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_uses_last_known_confidence() {
        let session = DiscoverySession::in_memory();
        session
            .observe_confidence(ConfidenceUpdate::new("A", 0.9))
            .await
            .unwrap();
        let task = session
            .create_task(NewTask::new("Interview users").with_type("validate").linked_to("A"))
            .await
            .unwrap();
        assert_eq!(task.priority, Some(Priority::Low));
        assert_eq!(task.assignees, vec!["Me".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let session = DiscoverySession::in_memory();
        let ghost = TaskId::from("ghost");
        assert!(matches!(
            session.set_status(&ghost, TaskStatus::Completed).await,
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(session.delete_task(&ghost).await, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rejected_reading_leaves_watcher_alone() {
        let session = DiscoverySession::in_memory();
        let result = session
            .observe_confidence(ConfidenceUpdate::new("A", f64::NAN))
            .await;
        assert!(matches!(result, Err(EngineError::Confidence(_))));
        assert!(session.hypotheses().await.is_empty());
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_config() {
        let storage: Arc<dyn TaskStorage> = Arc::new(InMemoryTaskStorage::new());
        let config = EngineConfig {
            readiness_threshold: 1.5,
            ..EngineConfig::default()
        };
        assert!(matches!(
            DiscoverySession::new(storage, config),
            Err(EngineError::Config(_))
        ));
    }
}
