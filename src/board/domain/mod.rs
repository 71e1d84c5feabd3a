//! Domain model for the planner board.
//!
//! Columns hold tasks in a per-column rank order. The ordering engine
//! computes rank changes for drag-and-drop moves, the transition guard
//! decides whether a move may be persisted, and the move state machine
//! names every stage an optimistic move passes through. Nothing here
//! performs I/O.

mod column;
mod error;
mod guard;
mod ids;
mod move_state;
mod ordering;
mod patch;
mod pull_request;
mod sync;
mod task;

pub use column::{Column, PersistedColumnData, PullRequestTransitions, status_for_column_name};
pub use error::{BoardDomainError, ParseTaskStatusError};
pub use guard::{MissingInput, TransitionVerdict, evaluate};
pub use ids::{BoardId, ColumnId, TaskId};
pub use move_state::{MoveEvent, MoveState};
pub use ordering::{
    ColumnPosition, MoveIntent, RankChange, Reorder, apply_changes, column_tasks,
    compute_reorder, display_order, is_contiguous, next_order, normalize_column,
};
pub use patch::{TaskFieldUpdate, TaskPatch};
pub use pull_request::{
    DEFAULT_PULL_REQUEST_HOST, PullRequestSnapshot, PullRequestState, PullRequestUrl,
};
pub use sync::{SyncDecision, SyncReason, decide_pull_request_sync, expected_column_status};
pub use task::{PersistedTaskData, Task, TaskStatus};
