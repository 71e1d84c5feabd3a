//! Task card aggregate and status types.

use super::{
    BoardDomainError, BoardId, ColumnId, ParseTaskStatusError, PullRequestUrl, TaskFieldUpdate,
    TaskId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Workflow status shown on a task card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Work has not started.
    Pending,
    /// Work is under way.
    InProgress,
    /// Work is finished.
    Completed,
    /// Work cannot proceed.
    Blocked,
    /// The linked pull request has been approved.
    Approved,
    /// The linked pull request has been merged.
    Merged,
    /// A reviewer requested changes on the linked pull request.
    ChangesRequested,
}

impl TaskStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Blocked,
        Self::Approved,
        Self::Merged,
        Self::ChangesRequested,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
            Self::Approved => "approved",
            Self::Merged => "merged",
            Self::ChangesRequested => "changes_requested",
        }
    }

    /// Returns `true` for statuses that only pull request review can set.
    #[must_use]
    pub const fn is_review_status(self) -> bool {
        matches!(self, Self::Approved | Self::Merged | Self::ChangesRequested)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseTaskStatusError(value.to_owned()))
    }
}

/// Task card aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    board_id: BoardId,
    column_id: ColumnId,
    order: u32,
    status: TaskStatus,
    pr_url: Option<PullRequestUrl>,
    title: String,
    description: String,
    labels: Vec<String>,
    assignees: Vec<String>,
    #[serde(default)]
    locked: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Owning board.
    pub board_id: BoardId,
    /// Containing column.
    pub column_id: ColumnId,
    /// Rank within the column.
    pub order: u32,
    /// Workflow status.
    pub status: TaskStatus,
    /// Linked pull request, if any.
    pub pr_url: Option<PullRequestUrl>,
    /// Card title.
    pub title: String,
    /// Card description.
    pub description: String,
    /// Free-form labels.
    pub labels: Vec<String>,
    /// Assigned user identifiers.
    pub assignees: Vec<String>,
    /// Whether only assignees may edit the task.
    pub locked: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a pending task at the given rank of a column.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyTaskTitle`] when the title is blank.
    pub fn new(
        board_id: BoardId,
        column_id: ColumnId,
        order: u32,
        title: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, BoardDomainError> {
        let checked_title = validated_title(title.into())?;
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            board_id,
            column_id,
            order,
            status: TaskStatus::Pending,
            pr_url: None,
            title: checked_title,
            description: String::new(),
            labels: Vec::new(),
            assignees: Vec::new(),
            locked: false,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            board_id: data.board_id,
            column_id: data.column_id,
            order: data.order,
            status: data.status,
            pr_url: data.pr_url,
            title: data.title,
            description: data.description,
            labels: data.labels,
            assignees: data.assignees,
            locked: data.locked,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into().trim().to_owned();
        self
    }

    /// Sets the labels, dropping blank entries.
    #[must_use]
    pub fn with_labels(mut self, labels: impl IntoIterator<Item = String>) -> Self {
        self.labels = non_blank(labels);
        self
    }

    /// Sets the assignees, dropping blank entries.
    #[must_use]
    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = String>) -> Self {
        self.assignees = non_blank(assignees);
        self
    }

    /// Sets whether the task is locked to its assignees.
    #[must_use]
    pub const fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Sets the initial status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Links a pull request.
    #[must_use]
    pub fn with_pr_url(mut self, pr_url: PullRequestUrl) -> Self {
        self.pr_url = Some(pr_url);
        self
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning board.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Returns the containing column.
    #[must_use]
    pub const fn column_id(&self) -> ColumnId {
        self.column_id
    }

    /// Returns the rank within the containing column.
    #[must_use]
    pub const fn order(&self) -> u32 {
        self.order
    }

    /// Returns the workflow status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the linked pull request, if any.
    #[must_use]
    pub const fn pr_url(&self) -> Option<&PullRequestUrl> {
        self.pr_url.as_ref()
    }

    /// Returns `true` when a pull request link is present.
    #[must_use]
    pub const fn has_pr_url(&self) -> bool {
        self.pr_url.is_some()
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the assignees.
    #[must_use]
    pub fn assignees(&self) -> &[String] {
        &self.assignees
    }

    /// Returns `true` when only assignees may edit the task.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Places the task at a column and rank without touching timestamps.
    ///
    /// Local optimistic moves use this; the store stamps `updated_at` when
    /// the move is persisted.
    pub const fn reposition(&mut self, column_id: ColumnId, order: u32) {
        self.column_id = column_id;
        self.order = order;
    }

    /// Replaces the pull request link without touching timestamps.
    pub fn set_pr_url(&mut self, pr_url: Option<PullRequestUrl>) {
        self.pr_url = pr_url;
    }

    /// Applies validated field updates and stamps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyTaskTitle`] when a title update is
    /// blank. The task is left unchanged on error.
    pub fn apply_updates(
        &mut self,
        updates: &[TaskFieldUpdate],
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let mut next = self.clone();
        for update in updates {
            next.apply_update(update)?;
        }
        next.updated_at = clock.utc();
        *self = next;
        Ok(())
    }

    fn apply_update(&mut self, update: &TaskFieldUpdate) -> Result<(), BoardDomainError> {
        match update {
            TaskFieldUpdate::Title(title) => self.title = validated_title(title.clone())?,
            TaskFieldUpdate::Description(description) => {
                self.description = description.trim().to_owned();
            }
            TaskFieldUpdate::Column(column_id) => self.column_id = *column_id,
            TaskFieldUpdate::Order(order) => self.order = *order,
            TaskFieldUpdate::Status(status) => self.status = *status,
            TaskFieldUpdate::PrUrl(pr_url) => self.pr_url.clone_from(pr_url),
            TaskFieldUpdate::Labels(labels) => self.labels = non_blank(labels.iter().cloned()),
            TaskFieldUpdate::Assignees(assignees) => {
                self.assignees = non_blank(assignees.iter().cloned());
            }
            TaskFieldUpdate::Locked(locked) => self.locked = *locked,
        }
        Ok(())
    }
}

fn validated_title(title: String) -> Result<String, BoardDomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(BoardDomainError::EmptyTaskTitle);
    }
    Ok(trimmed.to_owned())
}

fn non_blank(values: impl IntoIterator<Item = String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .collect()
}
