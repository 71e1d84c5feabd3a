//! Service layer for task creation, patching and pull request sync.

use crate::board::{
    domain::{
        BoardDomainError, BoardId, Column, ColumnId, PullRequestSnapshot, SyncReason, Task,
        TaskFieldUpdate, TaskId, TaskPatch, TaskStatus, decide_pull_request_sync,
        expected_column_status, next_order,
    },
    ports::{ColumnRegistry, ColumnRegistryError, TaskStore, TaskStoreError},
    services::{BoardSnapshot, PlannerConfig},
};
use mockable::Clock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    board_id: BoardId,
    column_id: ColumnId,
    title: String,
    description: Option<String>,
    labels: Vec<String>,
    assignees: Vec<String>,
    status: Option<TaskStatus>,
    pr_url: Option<String>,
    locked: bool,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(board_id: BoardId, column_id: ColumnId, title: impl Into<String>) -> Self {
        Self {
            board_id,
            column_id,
            title: title.into(),
            description: None,
            labels: Vec::new(),
            assignees: Vec::new(),
            status: None,
            pr_url: None,
            locked: false,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the labels.
    #[must_use]
    pub fn with_labels(mut self, labels: impl IntoIterator<Item = String>) -> Self {
        self.labels = labels.into_iter().collect();
        self
    }

    /// Sets the assignees.
    #[must_use]
    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = String>) -> Self {
        self.assignees = assignees.into_iter().collect();
        self
    }

    /// Sets the initial status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Locks the task to its assignees.
    #[must_use]
    pub const fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Sets the pull request link. A blank link is ignored.
    #[must_use]
    pub fn with_pr_url(mut self, pr_url: impl Into<String>) -> Self {
        self.pr_url = Some(pr_url.into());
        self
    }
}

/// Service-level errors for planner operations.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] BoardDomainError),
    /// Task store operation failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
    /// Column registry operation failed.
    #[error(transparent)]
    Columns(#[from] ColumnRegistryError),
}

/// Result type for planner service operations.
pub type PlannerResult<T> = Result<T, PlannerError>;

/// A task moved by pull request sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRelocation {
    /// Moved task.
    pub task_id: TaskId,
    /// Column the task left.
    pub from: ColumnId,
    /// Column the task was appended to.
    pub to: ColumnId,
    /// Rank in the new column.
    pub order: u32,
    /// Rule that fired.
    pub reason: SyncReason,
}

/// A task status changed by a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// Updated task.
    pub task_id: TaskId,
    /// Previous status.
    pub from: TaskStatus,
    /// New status.
    pub to: TaskStatus,
}

/// A relocation skipped because its target column is not on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownTarget {
    /// Task that would have moved.
    pub task_id: TaskId,
    /// Configured column that does not exist.
    pub column_id: ColumnId,
}

/// What a pull request sync changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Tasks whose snapshot was evaluated.
    pub checked: usize,
    /// Tasks moved to another column.
    pub relocations: Vec<TaskRelocation>,
    /// Status changes.
    pub status_changes: Vec<StatusChange>,
    /// Relocations skipped for unknown target columns.
    pub unknown_targets: Vec<UnknownTarget>,
}

impl SyncReport {
    /// Returns `true` when the sync changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relocations.is_empty() && self.status_changes.is_empty()
    }
}

/// Task planning orchestration service.
#[derive(Clone)]
pub struct PlannerService<S, R, C>
where
    S: TaskStore,
    R: ColumnRegistry,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    columns: Arc<R>,
    clock: Arc<C>,
    config: PlannerConfig,
}

impl<S, R, C> PlannerService<S, R, C>
where
    S: TaskStore,
    R: ColumnRegistry,
    C: Clock + Send + Sync,
{
    /// Creates a planner service with the default configuration.
    #[must_use]
    pub fn new(store: Arc<S>, columns: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            store,
            columns,
            clock,
            config: PlannerConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Creates a task appended to the end of its column.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Domain`] when the column is not on the board,
    /// the title is blank or the pull request link is invalid, and
    /// [`PlannerError::Store`] when persistence fails.
    pub async fn create_task(&self, request: CreateTaskRequest) -> PlannerResult<Task> {
        let column = self.board_column(request.board_id, request.column_id).await?;
        let siblings = self.store.list_by_column(column.id()).await?;
        let order = next_order(&siblings, column.id());

        let mut task = Task::new(
            request.board_id,
            column.id(),
            order,
            request.title,
            &*self.clock,
        )?
        .with_labels(request.labels)
        .with_assignees(request.assignees)
        .with_locked(request.locked);
        if let Some(description) = request.description {
            task = task.with_description(description);
        }
        if let Some(status) = request.status {
            task = task.with_status(status);
        }
        if let Some(raw) = request.pr_url.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
            task = task.with_pr_url(self.config.parse_pr_url(raw)?);
        }

        self.store.insert(&task).await?;
        info!(task_id = %task.id(), column_id = %column.id(), order, "created task");
        Ok(task)
    }

    /// Applies a validated patch.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Domain`] when the patch names an unknown
    /// column or a link on a host outside the configured set, and
    /// [`PlannerError::Store`] when the store rejects it.
    pub async fn patch_task(&self, patch: &TaskPatch) -> PlannerResult<Task> {
        if let Some(column_id) = patch.column_id() {
            if self.columns.find_by_id(column_id).await?.is_none() {
                return Err(BoardDomainError::UnknownColumn(column_id).into());
            }
        }
        if let Some(Some(pr_url)) = patch.pr_url() {
            self.config.parse_pr_url(pr_url.as_str())?;
        }
        Ok(self.store.patch(patch).await?)
    }

    /// Deletes a task. Column siblings keep their ranks.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Store`] when the task does not exist or
    /// persistence fails.
    pub async fn delete_task(&self, task_id: TaskId) -> PlannerResult<()> {
        self.store.delete(task_id).await?;
        info!(task_id = %task_id, "deleted task");
        Ok(())
    }

    /// Finds a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Store`] when the lookup fails.
    pub async fn find_task(&self, task_id: TaskId) -> PlannerResult<Option<Task>> {
        Ok(self.store.find_by_id(task_id).await?)
    }

    /// Loads a board's columns and tasks.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Columns`] or [`PlannerError::Store`] when
    /// loading fails.
    pub async fn board(&self, board_id: BoardId) -> PlannerResult<BoardSnapshot> {
        let columns = self.columns.list_by_board(board_id).await?;
        let tasks = self.store.list_by_board(board_id).await?;
        Ok(BoardSnapshot::new(board_id, columns, tasks))
    }

    /// Applies pull request snapshots to tasks in PR-gated columns.
    ///
    /// Tasks without a snapshot are skipped. Relocated tasks are appended
    /// to the end of their target column.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError`] when loading or persisting fails. Changes
    /// written before the failure are kept.
    pub async fn sync_pull_requests(
        &self,
        board_id: BoardId,
        snapshots: &BTreeMap<TaskId, PullRequestSnapshot>,
    ) -> PlannerResult<SyncReport> {
        let columns = self.columns_by_id(board_id).await?;
        let mut tasks = self.store.list_by_board(board_id).await?;
        let candidates: Vec<(Task, PullRequestSnapshot)> = tasks
            .iter()
            .filter(|task| task.has_pr_url())
            .filter(|task| {
                columns
                    .get(&task.column_id())
                    .is_some_and(Column::requires_pr)
            })
            .filter_map(|task| snapshots.get(&task.id()).map(|snapshot| (task.clone(), *snapshot)))
            .collect();

        let mut report = SyncReport::default();
        for (task, snapshot) in candidates {
            let Some(column) = columns.get(&task.column_id()) else {
                continue;
            };
            report.checked += 1;
            let Some(decision) = decide_pull_request_sync(&task, column, &snapshot) else {
                continue;
            };

            let mut patch = TaskPatch::new(task.id());
            let mut relocation = None;
            if let Some(target) = decision.relocate_to {
                if columns.contains_key(&target) {
                    let order = next_order(&tasks, target);
                    patch = patch
                        .with(TaskFieldUpdate::Column(target))
                        .with(TaskFieldUpdate::Order(order));
                    relocation = Some(TaskRelocation {
                        task_id: task.id(),
                        from: task.column_id(),
                        to: target,
                        order,
                        reason: decision.reason,
                    });
                } else {
                    warn!(task_id = %task.id(), column_id = %target, "pull request sync target column is not on the board");
                    report.unknown_targets.push(UnknownTarget {
                        task_id: task.id(),
                        column_id: target,
                    });
                }
            }
            if let Some(status) = decision.status {
                patch = patch.with(TaskFieldUpdate::Status(status));
            }
            if patch.is_empty() {
                continue;
            }

            let updated = self.store.patch(&patch).await?;
            if let Some(slot) = tasks.iter_mut().find(|slot| slot.id() == updated.id()) {
                *slot = updated;
            }
            info!(task_id = %task.id(), reason = ?decision.reason, "applied pull request sync");
            report.relocations.extend(relocation);
            if let Some(status) = decision.status {
                report.status_changes.push(StatusChange {
                    task_id: task.id(),
                    from: task.status(),
                    to: status,
                });
            }
        }
        Ok(report)
    }

    /// Aligns task statuses with the columns they sit in.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError`] when loading or persisting fails.
    pub async fn sync_column_statuses(&self, board_id: BoardId) -> PlannerResult<Vec<StatusChange>> {
        let columns = self.columns_by_id(board_id).await?;
        let tasks = self.store.list_by_board(board_id).await?;
        let mut changes = Vec::new();
        for task in &tasks {
            let Some(column) = columns.get(&task.column_id()) else {
                continue;
            };
            let Some(status) = expected_column_status(task, column) else {
                continue;
            };
            let patch = TaskPatch::new(task.id()).with(TaskFieldUpdate::Status(status));
            self.store.patch(&patch).await?;
            changes.push(StatusChange {
                task_id: task.id(),
                from: task.status(),
                to: status,
            });
        }
        if !changes.is_empty() {
            info!(board_id = %board_id, updated = changes.len(), "aligned task statuses with columns");
        }
        Ok(changes)
    }

    async fn board_column(&self, board_id: BoardId, column_id: ColumnId) -> PlannerResult<Column> {
        self.columns
            .find_by_id(column_id)
            .await?
            .filter(|column| column.board_id() == board_id)
            .ok_or_else(|| BoardDomainError::UnknownColumn(column_id).into())
    }

    async fn columns_by_id(&self, board_id: BoardId) -> PlannerResult<HashMap<ColumnId, Column>> {
        Ok(self
            .columns
            .list_by_board(board_id)
            .await?
            .into_iter()
            .map(|column| (column.id(), column))
            .collect())
    }
}
