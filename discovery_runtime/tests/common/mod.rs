//! Shared fixtures for session integration tests

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use discovery_core::{Task, TaskId};
use discovery_runtime::{
    DiscoverySession, EngineConfig, InMemoryTaskStorage, RetryConfig, StorageError, TaskPatch,
    TaskStorage,
};

/// In-memory storage that rejects patches for selected tasks
#[derive(Default)]
pub struct FlakyStorage {
    pub inner: InMemoryTaskStorage,
    failing: Mutex<HashSet<TaskId>>,
    fail_all: AtomicBool,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_patches_for(&self, id: &TaskId) {
        self.failing.lock().await.insert(id.clone());
    }

    pub fn fail_everything(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    fn all_failing(&self) -> bool {
        self.fail_all.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskStorage for FlakyStorage {
    async fn insert_task(&self, task: &Task) -> Result<(), StorageError> {
        if self.all_failing() {
            return Err(StorageError::Unavailable("store offline".into()));
        }
        self.inner.insert_task(task).await
    }

    async fn patch_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), StorageError> {
        if self.all_failing() || self.failing.lock().await.contains(id) {
            return Err(StorageError::WriteFailed(format!("rejected patch for {}", id)));
        }
        self.inner.patch_task(id, patch).await
    }

    async fn delete_task(&self, id: &TaskId) -> Result<bool, StorageError> {
        if self.all_failing() {
            return Err(StorageError::Unavailable("store offline".into()));
        }
        self.inner.delete_task(id).await
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, StorageError> {
        self.inner.list_tasks().await
    }
}

/// Config that never sleeps between attempts
pub fn fast_config() -> EngineConfig {
    EngineConfig::default().with_retry(RetryConfig::none())
}

pub fn memory_session() -> (Arc<InMemoryTaskStorage>, DiscoverySession) {
    let storage = Arc::new(InMemoryTaskStorage::new());
    let session = DiscoverySession::new(storage.clone(), fast_config())
        .expect("default config is valid");
    (storage, session)
}

pub fn flaky_session(config: EngineConfig) -> (Arc<FlakyStorage>, DiscoverySession) {
    let storage = Arc::new(FlakyStorage::new());
    let session = DiscoverySession::new(storage.clone(), config).expect("config is valid");
    (storage, session)
}
