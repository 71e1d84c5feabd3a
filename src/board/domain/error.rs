//! Error types for board domain validation and move computation.

use super::{ColumnId, MoveEvent, MoveState, TaskId};
use thiserror::Error;

/// Errors returned while constructing or reordering board domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardDomainError {
    /// The task is not part of the snapshot the move was computed against.
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),

    /// The column is not part of the board snapshot.
    #[error("unknown column: {0}")]
    UnknownColumn(ColumnId),

    /// The task exists but does not sit in the column the move names.
    #[error("task {task_id} is not in column {column_id}")]
    TaskNotInColumn {
        /// Task named by the move.
        task_id: TaskId,
        /// Column the move claimed as source.
        column_id: ColumnId,
    },

    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTaskTitle,

    /// The pull request URL is not a recognised pull request link.
    #[error("invalid pull request URL '{0}', expected https://<host>/owner/repo/pull/<number>")]
    InvalidPullRequestUrl(String),

    /// A move event is not valid in the current move state.
    #[error("move event {event:?} is not valid in state {from:?}")]
    InvalidMoveTransition {
        /// State the move was in.
        from: MoveState,
        /// Event that was rejected.
        event: MoveEvent,
    },

    /// A patch body named a field that cannot be updated.
    #[error("unknown task field: {0}")]
    UnknownTaskField(String),

    /// A patch body could not be decoded.
    #[error("invalid task patch: {0}")]
    InvalidPatch(String),
}

/// Error returned while parsing task statuses from persistence or input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
