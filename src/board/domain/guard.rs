//! Column entry rules checked before a move is persisted.

use super::{Column, ColumnId, Task};
use serde::{Deserialize, Serialize};

/// Input a deferred move is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingInput {
    /// A pull request link.
    PrUrl,
}

/// Outcome of checking whether a task may enter a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "detail", rename_all = "snake_case")]
pub enum TransitionVerdict {
    /// The move may be persisted now.
    Allow,
    /// The move may stand locally but must not be persisted until the
    /// missing input is supplied.
    DeferPendingInput(MissingInput),
    /// The move is refused.
    Reject(String),
}

impl TransitionVerdict {
    /// Returns `true` for [`TransitionVerdict::Allow`].
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decides whether `task`, currently in `source_column_id`, may enter
/// `destination`.
///
/// Reordering within a column is always allowed. Entering a PR-gated column
/// without a linked pull request is deferred rather than refused so the
/// drop can be kept while the link is collected.
#[must_use]
pub fn evaluate(task: &Task, source_column_id: ColumnId, destination: &Column) -> TransitionVerdict {
    if source_column_id == destination.id() {
        return TransitionVerdict::Allow;
    }
    if destination.requires_pr() && !task.has_pr_url() {
        return TransitionVerdict::DeferPendingInput(MissingInput::PrUrl);
    }
    TransitionVerdict::Allow
}
