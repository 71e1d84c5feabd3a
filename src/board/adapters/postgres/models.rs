//! Diesel row models for board persistence.

use super::schema::{board_columns, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning board.
    pub board_id: uuid::Uuid,
    /// Containing column.
    pub column_id: uuid::Uuid,
    /// Rank within the column.
    pub order_num: i32,
    /// Workflow status.
    pub status: String,
    /// Linked pull request URL.
    pub pr_url: Option<String>,
    /// Card title.
    pub title: String,
    /// Card description.
    pub description: String,
    /// Labels JSON array.
    pub labels: Value,
    /// Assignees JSON array.
    pub assignees: Value,
    /// Whether only assignees may edit the task.
    pub is_locked: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert and full-update model for task records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskRecord {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning board.
    pub board_id: uuid::Uuid,
    /// Containing column.
    pub column_id: uuid::Uuid,
    /// Rank within the column.
    pub order_num: i32,
    /// Workflow status.
    pub status: String,
    /// Linked pull request URL.
    pub pr_url: Option<String>,
    /// Card title.
    pub title: String,
    /// Card description.
    pub description: String,
    /// Labels JSON array.
    pub labels: Value,
    /// Assignees JSON array.
    pub assignees: Value,
    /// Whether only assignees may edit the task.
    pub is_locked: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for column records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = board_columns)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ColumnRow {
    /// Column identifier.
    pub id: uuid::Uuid,
    /// Owning board.
    pub board_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Position among the board's columns.
    pub order_num: i32,
    /// Whether entering tasks need a pull request link.
    pub requires_pr: bool,
    /// Merge relocation target.
    pub move_to_column_on_merge: Option<uuid::Uuid>,
    /// Unmerged close relocation target.
    pub move_to_column_on_closed: Option<uuid::Uuid>,
    /// Changes-requested relocation target.
    pub move_to_column_on_request_changes: Option<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for column records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = board_columns)]
pub struct NewColumnRow {
    /// Column identifier.
    pub id: uuid::Uuid,
    /// Owning board.
    pub board_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Position among the board's columns.
    pub order_num: i32,
    /// Whether entering tasks need a pull request link.
    pub requires_pr: bool,
    /// Merge relocation target.
    pub move_to_column_on_merge: Option<uuid::Uuid>,
    /// Unmerged close relocation target.
    pub move_to_column_on_closed: Option<uuid::Uuid>,
    /// Changes-requested relocation target.
    pub move_to_column_on_request_changes: Option<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
