//! Board column types and pull request transition rules.

use super::{BoardDomainError, BoardId, ColumnId, TaskStatus};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Columns a task is relocated to when its pull request changes state.
///
/// Only the pull request sync reads these; reordering tasks never touches
/// them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestTransitions {
    /// Destination once the pull request merges.
    pub on_merge: Option<ColumnId>,
    /// Destination once the pull request closes without merging.
    pub on_closed: Option<ColumnId>,
    /// Destination once a reviewer requests changes.
    pub on_changes_requested: Option<ColumnId>,
}

/// A column on a planner board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    id: ColumnId,
    board_id: BoardId,
    name: String,
    order: u32,
    requires_pr: bool,
    transitions: PullRequestTransitions,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedColumnData {
    /// Column identifier.
    pub id: ColumnId,
    /// Owning board.
    pub board_id: BoardId,
    /// Display name.
    pub name: String,
    /// Position among the board's columns.
    pub order: u32,
    /// Whether entering tasks need a pull request link.
    pub requires_pr: bool,
    /// Pull request driven relocation targets.
    pub transitions: PullRequestTransitions,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Column {
    /// Creates a column at the given position on a board.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidPatch`] when the name is blank.
    pub fn new(
        board_id: BoardId,
        name: impl Into<String>,
        order: u32,
        clock: &impl Clock,
    ) -> Result<Self, BoardDomainError> {
        let raw_name = name.into();
        let trimmed = raw_name.trim();
        if trimmed.is_empty() {
            return Err(BoardDomainError::InvalidPatch(
                "column name must not be empty".to_owned(),
            ));
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: ColumnId::new(),
            board_id,
            name: trimmed.to_owned(),
            order,
            requires_pr: false,
            transitions: PullRequestTransitions::default(),
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a column from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedColumnData) -> Self {
        Self {
            id: data.id,
            board_id: data.board_id,
            name: data.name,
            order: data.order,
            requires_pr: data.requires_pr,
            transitions: data.transitions,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Marks the column as pull request gated.
    #[must_use]
    pub const fn requiring_pr(mut self) -> Self {
        self.requires_pr = true;
        self
    }

    /// Sets the pull request relocation targets.
    #[must_use]
    pub const fn with_transitions(mut self, transitions: PullRequestTransitions) -> Self {
        self.transitions = transitions;
        self
    }

    /// Returns the column identifier.
    #[must_use]
    pub const fn id(&self) -> ColumnId {
        self.id
    }

    /// Returns the owning board.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the position among the board's columns.
    #[must_use]
    pub const fn order(&self) -> u32 {
        self.order
    }

    /// Returns `true` when entering tasks need a pull request link.
    #[must_use]
    pub const fn requires_pr(&self) -> bool {
        self.requires_pr
    }

    /// Returns the pull request relocation targets.
    #[must_use]
    pub const fn transitions(&self) -> &PullRequestTransitions {
        &self.transitions
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
}

/// Maps a column name to the status tasks in it should carry.
///
/// Names are compared case-insensitively with whitespace folded to
/// underscores, so "To Do" and "to_do" match. Returns `None` for names
/// with no conventional meaning.
#[must_use]
pub fn status_for_column_name(name: &str) -> Option<TaskStatus> {
    let key = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_lowercase();
    match key.as_str() {
        "backlog" | "to_do" | "todo" => Some(TaskStatus::Pending),
        "in_progress" | "doing" | "review" => Some(TaskStatus::InProgress),
        "done" | "complete" | "completed" => Some(TaskStatus::Completed),
        "blocked" | "blockers" => Some(TaskStatus::Blocked),
        _ => None,
    }
}
