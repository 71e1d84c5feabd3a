//! Rules for reacting to pull request status changes.

use super::{
    Column, ColumnId, PullRequestSnapshot, PullRequestState, Task, TaskStatus,
    status_for_column_name,
};
use serde::{Deserialize, Serialize};

/// Why a pull request sync changed a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncReason {
    /// The pull request merged.
    Merged,
    /// The pull request closed without merging.
    ClosedUnmerged,
    /// A reviewer requested changes.
    ChangesRequested,
    /// The pull request was approved.
    Approved,
}

/// Changes a pull request snapshot implies for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncDecision {
    /// Column to relocate the task to, if it moves.
    pub relocate_to: Option<ColumnId>,
    /// Status to set, if it changes.
    pub status: Option<TaskStatus>,
    /// Rule that fired.
    pub reason: SyncReason,
}

/// Decides what a pull request snapshot means for a task in `column`.
///
/// Rules apply in priority order: merged, closed without merge, changes
/// requested, approved while open. Returns `None` when the snapshot leaves
/// the task's column and status as they are.
#[must_use]
pub fn decide_pull_request_sync(
    task: &Task,
    column: &Column,
    snapshot: &PullRequestSnapshot,
) -> Option<SyncDecision> {
    let transitions = column.transitions();
    let (target, status, reason) = if snapshot.merged {
        (
            transitions.on_merge,
            Some(TaskStatus::Merged),
            SyncReason::Merged,
        )
    } else if snapshot.state == PullRequestState::Closed {
        (transitions.on_closed, None, SyncReason::ClosedUnmerged)
    } else if snapshot.changes_requested {
        (
            transitions.on_changes_requested,
            Some(TaskStatus::ChangesRequested),
            SyncReason::ChangesRequested,
        )
    } else if snapshot.approved {
        (None, Some(TaskStatus::Approved), SyncReason::Approved)
    } else {
        return None;
    };

    let relocate_to = target.filter(|column_id| *column_id != task.column_id());
    let status = status.filter(|next| *next != task.status());
    if relocate_to.is_none() && status.is_none() {
        return None;
    }
    Some(SyncDecision {
        relocate_to,
        status,
        reason,
    })
}

/// Status a task should carry given the column it sits in.
///
/// Tasks in PR-gated columns fall back to pending unless a review status
/// is already recorded; elsewhere the column name decides. Returns `None`
/// when the current status already fits or the name is not recognised.
#[must_use]
pub fn expected_column_status(task: &Task, column: &Column) -> Option<TaskStatus> {
    let expected = if column.requires_pr() {
        if task.status().is_review_status() {
            return None;
        }
        TaskStatus::Pending
    } else {
        status_for_column_name(column.name())?
    };
    (expected != task.status()).then_some(expected)
}
