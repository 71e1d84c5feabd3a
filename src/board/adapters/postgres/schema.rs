//! Diesel schema for planner board persistence.

diesel::table! {
    /// Task cards ranked within board columns.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning board.
        board_id -> Uuid,
        /// Containing column.
        column_id -> Uuid,
        /// Rank within the column.
        order_num -> Int4,
        /// Workflow status.
        #[max_length = 50]
        status -> Varchar,
        /// Linked pull request URL.
        #[max_length = 512]
        pr_url -> Nullable<Varchar>,
        /// Card title.
        #[max_length = 255]
        title -> Varchar,
        /// Card description.
        description -> Text,
        /// Label list as a JSON array of strings.
        labels -> Jsonb,
        /// Assignee list as a JSON array of strings.
        assignees -> Jsonb,
        /// Whether only assignees may edit the task.
        is_locked -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Columns of planner boards.
    board_columns (id) {
        /// Column identifier.
        id -> Uuid,
        /// Owning board.
        board_id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Position among the board's columns.
        order_num -> Int4,
        /// Whether entering tasks need a pull request link.
        requires_pr -> Bool,
        /// Relocation target once a pull request merges.
        move_to_column_on_merge -> Nullable<Uuid>,
        /// Relocation target once a pull request closes unmerged.
        move_to_column_on_closed -> Nullable<Uuid>,
        /// Relocation target once changes are requested.
        move_to_column_on_request_changes -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
