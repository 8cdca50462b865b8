//! Persistence commands
//!
//! Every local mutation is applied to the session's cache first and then
//! described as a [`PersistCommand`]. Executing a command never fails the
//! caller: the [`CommandOutcome`] says whether the write landed, and the
//! session decides what to do with its local copy.

use discovery_core::{Task, TaskId};

use crate::error::StorageError;
use crate::retry::{execute_with_retry, RetryConfig};
use crate::storage::{TaskPatch, TaskStorage};

/// A pending write against task storage
#[derive(Clone, Debug, PartialEq)]
pub enum PersistCommand {
    Create(Task),
    Patch { task_id: TaskId, patch: TaskPatch },
    Delete(TaskId),
}

impl PersistCommand {
    pub fn task_id(&self) -> &TaskId {
        match self {
            PersistCommand::Create(task) => &task.id,
            PersistCommand::Patch { task_id, .. } => task_id,
            PersistCommand::Delete(task_id) => task_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PersistCommand::Create(_) => "create",
            PersistCommand::Patch { .. } => "patch",
            PersistCommand::Delete(_) => "delete",
        }
    }
}

/// Result of executing a command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    Failed { error: StorageError, attempts: u32 },
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied)
    }
}

/// Execute `command` with retries. Failures are logged, not returned.
pub async fn execute(
    storage: &dyn TaskStorage,
    command: &PersistCommand,
    retry: &RetryConfig,
) -> CommandOutcome {
    let result = execute_with_retry(
        || async move {
            match command {
                PersistCommand::Create(task) => storage.insert_task(task).await,
                PersistCommand::Patch { task_id, patch } => {
                    storage.patch_task(task_id, patch).await
                }
                PersistCommand::Delete(task_id) => storage.delete_task(task_id).await.map(|_| ()),
            }
        },
        retry,
    )
    .await;

    match result {
        Ok(()) => {
            tracing::debug!(task = %command.task_id(), kind = command.kind(), "write applied");
            CommandOutcome::Applied
        }
        Err(exhausted) => {
            tracing::warn!(
                task = %command.task_id(),
                kind = command.kind(),
                attempts = exhausted.attempts,
                "write dropped: {}",
                exhausted.error
            );
            CommandOutcome::Failed {
                error: exhausted.error,
                attempts: exhausted.attempts,
            }
        }
    }
}
