//! Rank assignment for tasks moved within and between columns.
//!
//! Every function here is pure: it reads a task snapshot and describes the
//! rank changes a move implies. Callers decide whether to apply them
//! locally, persist them, or both.

use super::{BoardDomainError, ColumnId, Task, TaskId, TaskPatch};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A slot in a column's displayed sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnPosition {
    /// Column holding the slot.
    pub column_id: ColumnId,
    /// Zero-based index in the column's displayed sequence.
    pub index: usize,
}

impl ColumnPosition {
    /// Creates a column position.
    #[must_use]
    pub const fn new(column_id: ColumnId, index: usize) -> Self {
        Self { column_id, index }
    }
}

/// Request to relocate a task from one slot to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveIntent {
    /// Task being moved.
    pub task_id: TaskId,
    /// Where the drag started.
    pub source: ColumnPosition,
    /// Where the task was dropped.
    pub destination: ColumnPosition,
}

impl MoveIntent {
    /// Creates a move intent.
    #[must_use]
    pub const fn new(task_id: TaskId, source: ColumnPosition, destination: ColumnPosition) -> Self {
        Self {
            task_id,
            source,
            destination,
        }
    }

    /// Returns `true` when the task stays in its column.
    #[must_use]
    pub fn is_same_column(&self) -> bool {
        self.source.column_id == self.destination.column_id
    }

    /// Returns `true` when the drop lands on the slot the drag started from.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.is_same_column() && self.source.index == self.destination.index
    }
}

/// New placement for one task, with the placement it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankChange {
    /// Task being re-ranked.
    pub task_id: TaskId,
    /// Column after the move.
    pub column_id: ColumnId,
    /// Rank after the move.
    pub order: u32,
    /// Column before the move.
    pub previous_column_id: ColumnId,
    /// Rank before the move.
    pub previous_order: u32,
}

impl RankChange {
    /// Returns `true` when the task changes column.
    #[must_use]
    pub fn column_changed(&self) -> bool {
        self.column_id != self.previous_column_id
    }

    /// Returns the change that undoes this one.
    #[must_use]
    pub const fn reverted(&self) -> Self {
        Self {
            task_id: self.task_id,
            column_id: self.previous_column_id,
            order: self.previous_order,
            previous_column_id: self.column_id,
            previous_order: self.order,
        }
    }

    /// Returns the store patch persisting this change.
    ///
    /// Column moves write column and order; rank shifts write order only.
    #[must_use]
    pub fn to_patch(&self) -> TaskPatch {
        if self.column_changed() {
            TaskPatch::position(self.task_id, self.column_id, self.order)
        } else {
            TaskPatch::order_only(self.task_id, self.order)
        }
    }
}

/// Rank changes implied by one move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reorder {
    intent: MoveIntent,
    origin_index: usize,
    final_index: usize,
    changes: Vec<RankChange>,
}

impl Reorder {
    fn unchanged(intent: MoveIntent) -> Self {
        Self {
            intent,
            origin_index: intent.source.index,
            final_index: intent.source.index,
            changes: Vec::new(),
        }
    }

    /// Returns the intent the reorder was computed for.
    #[must_use]
    pub const fn intent(&self) -> &MoveIntent {
        &self.intent
    }

    /// Returns the changed tasks. The moved task comes first.
    #[must_use]
    pub fn changes(&self) -> &[RankChange] {
        &self.changes
    }

    /// Returns `true` when nothing moves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the moved task's change, absent for a no-op.
    #[must_use]
    pub fn moved(&self) -> Option<&RankChange> {
        self.changes.first()
    }

    /// Index the moved task held in its source column.
    #[must_use]
    pub const fn origin_index(&self) -> usize {
        self.origin_index
    }

    /// Index the moved task ends at in its destination column.
    #[must_use]
    pub const fn final_index(&self) -> usize {
        self.final_index
    }

    /// Returns the intent that moves the task back where it came from.
    #[must_use]
    pub const fn inverse_intent(&self) -> MoveIntent {
        MoveIntent {
            task_id: self.intent.task_id,
            source: ColumnPosition::new(self.intent.destination.column_id, self.final_index),
            destination: ColumnPosition::new(self.intent.source.column_id, self.origin_index),
        }
    }

    /// Returns one store patch per changed task.
    #[must_use]
    pub fn patches(&self) -> Vec<TaskPatch> {
        self.changes.iter().map(RankChange::to_patch).collect()
    }
}

/// Orders tasks by rank, breaking ties by identifier.
#[must_use]
pub fn display_order(left: &Task, right: &Task) -> Ordering {
    left.order()
        .cmp(&right.order())
        .then_with(|| left.id().cmp(&right.id()))
}

/// Returns a column's tasks in display order.
#[must_use]
pub fn column_tasks(tasks: &[Task], column_id: ColumnId) -> Vec<&Task> {
    let mut column: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.column_id() == column_id)
        .collect();
    column.sort_by(|left, right| display_order(left, right));
    column
}

/// Rank for a task appended to the end of a column.
///
/// An empty column starts at zero.
#[must_use]
pub fn next_order(tasks: &[Task], column_id: ColumnId) -> u32 {
    tasks
        .iter()
        .filter(|task| task.column_id() == column_id)
        .map(Task::order)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Returns `true` when a column's ranks are exactly `0..n`.
#[must_use]
pub fn is_contiguous(tasks: &[Task], column_id: ColumnId) -> bool {
    column_tasks(tasks, column_id)
        .iter()
        .enumerate()
        .all(|(index, task)| task.order() == rank(index))
}

/// Changes that re-rank a column to `0..n` in display order.
#[must_use]
pub fn normalize_column(tasks: &[Task], column_id: ColumnId) -> Vec<RankChange> {
    let column = column_tasks(tasks, column_id);
    ranked_changes(&column, column_id, None)
}

/// Computes the rank changes for a move.
///
/// The moved task is located by identifier; the intent's source index is
/// only used to detect a drop on the starting slot. The destination index
/// is clamped to the destination column's length.
///
/// # Errors
///
/// Returns [`BoardDomainError::UnknownTask`] when the task is not in the
/// snapshot and [`BoardDomainError::TaskNotInColumn`] when it is not in the
/// intent's source column.
pub fn compute_reorder(tasks: &[Task], intent: &MoveIntent) -> Result<Reorder, BoardDomainError> {
    let moving = tasks
        .iter()
        .find(|task| task.id() == intent.task_id)
        .ok_or(BoardDomainError::UnknownTask(intent.task_id))?;
    let source_column = intent.source.column_id;
    let destination_column = intent.destination.column_id;
    if moving.column_id() != source_column {
        return Err(BoardDomainError::TaskNotInColumn {
            task_id: intent.task_id,
            column_id: source_column,
        });
    }
    if intent.is_noop() {
        return Ok(Reorder::unchanged(*intent));
    }

    let mut source = column_tasks(tasks, source_column);
    let origin_index = source
        .iter()
        .position(|task| task.id() == intent.task_id)
        .ok_or(BoardDomainError::TaskNotInColumn {
            task_id: intent.task_id,
            column_id: source_column,
        })?;
    let moved = source.remove(origin_index);

    let (final_index, mut changes) = if intent.is_same_column() {
        let final_index = intent.destination.index.min(source.len());
        source.insert(final_index, moved);
        let changes = ranked_changes(&source, source_column, Some(moved.id()));
        (final_index, changes)
    } else {
        let mut destination = column_tasks(tasks, destination_column);
        let final_index = intent.destination.index.min(destination.len());
        destination.insert(final_index, moved);
        let mut changes = ranked_changes(&destination, destination_column, Some(moved.id()));
        changes.extend(ranked_changes(&source, source_column, None));
        (final_index, changes)
    };

    if let Some(moved_at) = changes
        .iter()
        .position(|change| change.task_id == intent.task_id)
    {
        changes.swap(0, moved_at);
    }

    Ok(Reorder {
        intent: *intent,
        origin_index,
        final_index,
        changes,
    })
}

/// Applies rank changes to a task snapshot in place.
///
/// Tasks not named by a change are left alone; changes naming unknown
/// tasks are ignored.
pub fn apply_changes(tasks: &mut [Task], changes: &[RankChange]) {
    for change in changes {
        if let Some(task) = tasks.iter_mut().find(|task| task.id() == change.task_id) {
            task.reposition(change.column_id, change.order);
        }
    }
}

/// Assigns ranks `0..n` to `ordered`, reporting tasks whose placement
/// changes. `always` is reported even when unchanged.
fn ranked_changes(
    ordered: &[&Task],
    column_id: ColumnId,
    always: Option<TaskId>,
) -> Vec<RankChange> {
    ordered
        .iter()
        .enumerate()
        .filter_map(|(index, task)| {
            let order = rank(index);
            let unchanged = task.column_id() == column_id && task.order() == order;
            if unchanged && always != Some(task.id()) {
                return None;
            }
            Some(RankChange {
                task_id: task.id(),
                column_id,
                order,
                previous_column_id: task.column_id(),
                previous_order: task.order(),
            })
        })
        .collect()
}

fn rank(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}
