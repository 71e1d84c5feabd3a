//! Conversions between domain values and Diesel rows.

use super::models::{ColumnRow, NewColumnRow, TaskRecord, TaskRow};
use crate::board::domain::{
    BoardId, Column, ColumnId, PersistedColumnData, PersistedTaskData, PullRequestTransitions,
    PullRequestUrl, Task, TaskId, TaskStatus,
};
use serde_json::Value;
use std::io;

/// Failure converting between rows and domain values.
pub type ConversionError = io::Error;

fn invalid_data(message: impl Into<String>) -> ConversionError {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

fn to_rank(order: u32) -> Result<i32, ConversionError> {
    i32::try_from(order).map_err(|err| invalid_data(format!("rank {order} out of range: {err}")))
}

fn from_rank(order_num: i32) -> Result<u32, ConversionError> {
    u32::try_from(order_num)
        .map_err(|err| invalid_data(format!("negative rank {order_num}: {err}")))
}

fn string_list(value: Value) -> Result<Vec<String>, ConversionError> {
    match value {
        Value::Null => Ok(Vec::new()),
        other => serde_json::from_value(other).map_err(io::Error::from),
    }
}

/// Builds the insert/update record for a task.
///
/// # Errors
///
/// Returns an error when the rank does not fit the `INTEGER` column.
pub fn task_to_record(task: &Task) -> Result<TaskRecord, ConversionError> {
    Ok(TaskRecord {
        id: task.id().into_inner(),
        board_id: task.board_id().into_inner(),
        column_id: task.column_id().into_inner(),
        order_num: to_rank(task.order())?,
        status: task.status().as_str().to_owned(),
        pr_url: task.pr_url().map(|pr_url| pr_url.as_str().to_owned()),
        title: task.title().to_owned(),
        description: task.description().to_owned(),
        labels: Value::from(task.labels().to_vec()),
        assignees: Value::from(task.assignees().to_vec()),
        is_locked: task.is_locked(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

/// Rebuilds a task from a stored row.
///
/// # Errors
///
/// Returns an error for negative ranks, unknown statuses, invalid pull
/// request links, or non-string label and assignee entries.
pub fn row_to_task(row: TaskRow) -> Result<Task, ConversionError> {
    let TaskRow {
        id,
        board_id,
        column_id,
        order_num,
        status,
        pr_url,
        title,
        description,
        labels,
        assignees,
        is_locked,
        created_at,
        updated_at,
    } = row;

    let status =
        TaskStatus::try_from(status.as_str()).map_err(|err| invalid_data(err.to_string()))?;
    let pr_url = pr_url
        .filter(|link| !link.trim().is_empty())
        .map(|link| PullRequestUrl::parse_stored(&link))
        .transpose()
        .map_err(|err| invalid_data(err.to_string()))?;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        board_id: BoardId::from_uuid(board_id),
        column_id: ColumnId::from_uuid(column_id),
        order: from_rank(order_num)?,
        status,
        pr_url,
        title,
        description,
        labels: string_list(labels)?,
        assignees: string_list(assignees)?,
        locked: is_locked,
        created_at,
        updated_at,
    }))
}

/// Builds the insert row for a column.
///
/// # Errors
///
/// Returns an error when the column position does not fit `INTEGER`.
pub fn column_to_row(column: &Column) -> Result<NewColumnRow, ConversionError> {
    let transitions = column.transitions();
    Ok(NewColumnRow {
        id: column.id().into_inner(),
        board_id: column.board_id().into_inner(),
        name: column.name().to_owned(),
        order_num: to_rank(column.order())?,
        requires_pr: column.requires_pr(),
        move_to_column_on_merge: transitions.on_merge.map(ColumnId::into_inner),
        move_to_column_on_closed: transitions.on_closed.map(ColumnId::into_inner),
        move_to_column_on_request_changes: transitions
            .on_changes_requested
            .map(ColumnId::into_inner),
        created_at: column.created_at(),
        updated_at: column.updated_at(),
    })
}

/// Rebuilds a column from a stored row.
///
/// # Errors
///
/// Returns an error for negative positions.
pub fn row_to_column(row: ColumnRow) -> Result<Column, ConversionError> {
    Ok(Column::from_persisted(PersistedColumnData {
        id: ColumnId::from_uuid(row.id),
        board_id: BoardId::from_uuid(row.board_id),
        name: row.name,
        order: from_rank(row.order_num)?,
        requires_pr: row.requires_pr,
        transitions: PullRequestTransitions {
            on_merge: row.move_to_column_on_merge.map(ColumnId::from_uuid),
            on_closed: row.move_to_column_on_closed.map(ColumnId::from_uuid),
            on_changes_requested: row
                .move_to_column_on_request_changes
                .map(ColumnId::from_uuid),
        },
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
