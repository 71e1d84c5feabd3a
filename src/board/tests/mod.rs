//! Unit tests for the planner board module.


use crate::board::domain::{BoardId, Column, ColumnId, Task, TaskId, column_tasks};
use mockable::DefaultClock;

/// Builds tasks ranked `0..n` in `column_id`, one per title.
pub(super) fn ranked_tasks(board_id: BoardId, column_id: ColumnId, titles: &[&str]) -> Vec<Task> {
    titles
        .iter()
        .enumerate()
        .map(|(index, title)| {
            let order = u32::try_from(index).expect("small test column");
            Task::new(board_id, column_id, order, *title, &DefaultClock).expect("valid task")
        })
        .collect()
}

/// Returns a column's task titles in display order.
pub(super) fn titles(tasks: &[Task], column_id: ColumnId) -> Vec<String> {
    column_tasks(tasks, column_id)
        .into_iter()
        .map(|task| task.title().to_owned())
        .collect()
}

/// Finds a task's identifier by title.
pub(super) fn id_of(tasks: &[Task], title: &str) -> TaskId {
    tasks
        .iter()
        .find(|task| task.title() == title)
        .map(Task::id)
        .expect("task with title")
}

/// Creates a column on `board_id`.
pub(super) fn column(board_id: BoardId, name: &str, order: u32) -> Column {
    Column::new(board_id, name, order, &DefaultClock).expect("valid column")
}
