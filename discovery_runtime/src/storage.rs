//! Storage abstraction for tasks
//!
//! The authoritative task records live in a shared remote document store.
//! The session talks to it only through [`TaskStorage`]; the in-memory
//! implementation backs tests and offline sessions.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use discovery_core::{
    HypothesisId, Priority, PriorityOrigin, Task, TaskId, TaskStatus, TaskType,
};

use crate::error::StorageError;

/// Partial update for one task document.
///
/// Applying the same patch twice leaves the document unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Travels with every priority write so a reload knows manual from derived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_origin: Option<PriorityOrigin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    /// `Some(None)` unlinks the task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hypothesis_id: Option<Option<HypothesisId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
}

impl TaskPatch {
    /// Derived-priority write. Type and link ride along unchanged so a
    /// concurrent partial update cannot leave the three out of step.
    pub fn priority_sync(task: &Task) -> Self {
        Self {
            priority: task.priority,
            priority_origin: Some(task.priority_origin),
            task_type: Some(task.task_type),
            hypothesis_id: Some(task.hypothesis_id.clone()),
            ..Self::default()
        }
    }

    pub fn manual_priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            priority_origin: Some(PriorityOrigin::Manual),
            ..Self::default()
        }
    }

    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn assignees(assignees: Vec<String>) -> Self {
        Self {
            assignees: Some(assignees),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(priority) = self.priority {
            task.priority = Some(priority);
        }
        if let Some(origin) = self.priority_origin {
            task.priority_origin = origin;
        }
        if let Some(task_type) = self.task_type {
            task.task_type = task_type;
        }
        if let Some(link) = &self.hypothesis_id {
            task.hypothesis_id = link.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(assignees) = &self.assignees {
            task.assignees = assignees.clone();
        }
    }
}

/// Persistence contract for task documents
#[async_trait]
pub trait TaskStorage: Send + Sync {
    /// Store a newly created task
    async fn insert_task(&self, task: &Task) -> Result<(), StorageError>;

    /// Apply a partial update to an existing task
    async fn patch_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), StorageError>;

    /// Remove a task. Returns false if it did not exist.
    async fn delete_task(&self, id: &TaskId) -> Result<bool, StorageError>;

    /// All stored tasks
    async fn list_tasks(&self) -> Result<Vec<Task>, StorageError>;
}

/// In-memory storage that counts every write it receives
#[derive(Default)]
pub struct InMemoryTaskStorage {
    tasks: RwLock<HashMap<TaskId, Task>>,
    writes: AtomicU64,
}

impl InMemoryTaskStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing documents without counting writes
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let map = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        Self {
            tasks: RwLock::new(map),
            writes: AtomicU64::new(0),
        }
    }

    /// Number of insert, patch and delete calls received
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.read().await.get(id).cloned()
    }

    fn count_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskStorage for InMemoryTaskStorage {
    async fn insert_task(&self, task: &Task) -> Result<(), StorageError> {
        self.count_write();
        let mut store = self.tasks.write().await;
        store.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn patch_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), StorageError> {
        self.count_write();
        let mut store = self.tasks.write().await;
        let task = store
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        patch.apply_to(task);
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_task(&self, id: &TaskId) -> Result<bool, StorageError> {
        self.count_write();
        let mut store = self.tasks.write().await;
        Ok(store.remove(id).is_some())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, StorageError> {
        let store = self.tasks.read().await;
        let mut tasks: Vec<Task> = store.values().cloned().collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }
}
