//! In-memory task store for tests and embedding.

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::board::{
    domain::{BoardId, ColumnId, Task, TaskId, TaskPatch, display_order},
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};

/// Thread-safe in-memory task store.
#[derive(Debug, Clone)]
pub struct InMemoryTaskStore<C = DefaultClock> {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
    clock: Arc<C>,
}

impl InMemoryTaskStore<DefaultClock> {
    /// Creates an empty store stamping updates with the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for InMemoryTaskStore<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> InMemoryTaskStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty store stamping updates with `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }
}

fn lock_error(err: impl std::fmt::Display) -> TaskStoreError {
    TaskStoreError::persistence(std::io::Error::other(err.to_string()))
}

fn sorted(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(display_order);
    tasks
}

#[async_trait]
impl<C> TaskStore for InMemoryTaskStore<C>
where
    C: Clock + Send + Sync,
{
    async fn insert(&self, task: &Task) -> TaskStoreResult<()> {
        let mut tasks = self.tasks.write().map_err(lock_error)?;
        if tasks.contains_key(&task.id()) {
            return Err(TaskStoreError::DuplicateTask(task.id()));
        }
        tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn patch(&self, patch: &TaskPatch) -> TaskStoreResult<Task> {
        let mut tasks = self.tasks.write().map_err(lock_error)?;
        let task = tasks
            .get_mut(&patch.id())
            .ok_or(TaskStoreError::NotFound(patch.id()))?;
        task.apply_updates(patch.updates(), &*self.clock)
            .map_err(|err| TaskStoreError::Validation(err.to_string()))?;
        Ok(task.clone())
    }

    async fn delete(&self, id: TaskId) -> TaskStoreResult<()> {
        let mut tasks = self.tasks.write().map_err(lock_error)?;
        tasks
            .remove(&id)
            .map(|_| ())
            .ok_or(TaskStoreError::NotFound(id))
    }

    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        let tasks = self.tasks.read().map_err(lock_error)?;
        Ok(tasks.get(&id).cloned())
    }

    async fn list_by_column(&self, column_id: ColumnId) -> TaskStoreResult<Vec<Task>> {
        let tasks = self.tasks.read().map_err(lock_error)?;
        Ok(sorted(
            tasks
                .values()
                .filter(|task| task.column_id() == column_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_by_board(&self, board_id: BoardId) -> TaskStoreResult<Vec<Task>> {
        let tasks = self.tasks.read().map_err(lock_error)?;
        Ok(sorted(
            tasks
                .values()
                .filter(|task| task.board_id() == board_id)
                .cloned()
                .collect(),
        ))
    }
}
