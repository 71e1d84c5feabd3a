//! Shared fixtures for in-memory planner board integration tests.

use async_trait::async_trait;
use futures::channel::oneshot;
use mockable::DefaultClock;
use planboard::board::{
    adapters::memory::{InMemoryColumnRegistry, InMemoryTaskStore},
    domain::{
        BoardId, Column, ColumnId, ColumnPosition, MoveIntent, PullRequestTransitions,
        PullRequestUrl, Task, TaskId, TaskPatch,
    },
    ports::{ColumnRegistry, TaskStore, TaskStoreError, TaskStoreResult},
    services::{MoveCoordinator, PlannerConfig},
};
use rstest::fixture;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory task store that refuses writes for selected tasks.
///
/// In sticky mode every write after the first refusal is refused too,
/// which makes rollback writes fail. Writes for a held task wait until the
/// matching sender fires.
#[derive(Default)]
pub struct FlakyTaskStore {
    inner: InMemoryTaskStore,
    failing: Mutex<HashSet<TaskId>>,
    held: Mutex<HashMap<TaskId, oneshot::Receiver<()>>>,
    sticky: AtomicBool,
    tripped: AtomicBool,
}

impl FlakyTaskStore {
    /// Refuses every later write for `task_id`.
    pub fn fail_writes_for(&self, task_id: TaskId) {
        self.failing.lock().expect("failing set").insert(task_id);
    }

    /// Holds the next write for `task_id` until the returned sender fires.
    pub fn hold_writes_for(&self, task_id: TaskId) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.held.lock().expect("held writes").insert(task_id, gate);
        release
    }

    /// Refuses all writes once any write has been refused.
    pub fn make_sticky(&self) {
        self.sticky.store(true, Ordering::SeqCst);
    }

    /// Accepts every write again.
    pub fn heal(&self) {
        self.failing.lock().expect("failing set").clear();
        self.sticky.store(false, Ordering::SeqCst);
        self.tripped.store(false, Ordering::SeqCst);
    }

    fn refuses(&self, task_id: TaskId) -> bool {
        if self.sticky.load(Ordering::SeqCst) && self.tripped.load(Ordering::SeqCst) {
            return true;
        }
        let refused = self.failing.lock().expect("failing set").contains(&task_id);
        if refused {
            self.tripped.store(true, Ordering::SeqCst);
        }
        refused
    }
}

#[async_trait]
impl TaskStore for FlakyTaskStore {
    async fn insert(&self, task: &Task) -> TaskStoreResult<()> {
        self.inner.insert(task).await
    }

    async fn patch(&self, patch: &TaskPatch) -> TaskStoreResult<Task> {
        let held = self.held.lock().expect("held writes").remove(&patch.id());
        if let Some(gate) = held {
            gate.await.map_err(TaskStoreError::persistence)?;
        }
        if self.refuses(patch.id()) {
            return Err(TaskStoreError::persistence(std::io::Error::other(
                "connection reset",
            )));
        }
        self.inner.patch(patch).await
    }

    async fn delete(&self, id: TaskId) -> TaskStoreResult<()> {
        self.inner.delete(id).await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        self.inner.find_by_id(id).await
    }

    async fn list_by_column(&self, column_id: ColumnId) -> TaskStoreResult<Vec<Task>> {
        self.inner.list_by_column(column_id).await
    }

    async fn list_by_board(&self, board_id: BoardId) -> TaskStoreResult<Vec<Task>> {
        self.inner.list_by_board(board_id).await
    }
}

/// A board with five columns and a few seeded tasks.
///
/// | column  | tasks   | notes                                     |
/// |---------|---------|-------------------------------------------|
/// | To Do   | A, B, C |                                           |
/// | Doing   | X, Y    |                                           |
/// | Review  | R       | requires a PR; R is linked                |
/// | Done    |         | merge target of Review                    |
/// | Rework  |         | changes-requested target of Review        |
pub struct SeededBoard {
    /// Board identifier.
    pub board_id: BoardId,
    /// Shared task store.
    pub store: Arc<FlakyTaskStore>,
    /// Shared column registry.
    pub registry: Arc<InMemoryColumnRegistry>,
    /// "To Do" column.
    pub todo: Column,
    /// "Doing" column.
    pub doing: Column,
    /// PR-gated "Review" column.
    pub review: Column,
    /// "Done" column.
    pub done: Column,
    /// "Rework" column.
    pub rework: Column,
}

fn new_column(board_id: BoardId, name: &str, order: u32) -> Column {
    Column::new(board_id, name, order, &DefaultClock).expect("valid column")
}

/// Seeds the standard board.
#[fixture]
pub async fn seeded() -> SeededBoard {
    let board_id = BoardId::new();
    let todo = new_column(board_id, "To Do", 0);
    let doing = new_column(board_id, "Doing", 1);
    let done = new_column(board_id, "Done", 3);
    let rework = new_column(board_id, "Rework", 4);
    let review = new_column(board_id, "Review", 2)
        .requiring_pr()
        .with_transitions(PullRequestTransitions {
            on_merge: Some(done.id()),
            on_closed: Some(todo.id()),
            on_changes_requested: Some(rework.id()),
        });

    let registry = Arc::new(InMemoryColumnRegistry::new());
    for column in [&todo, &doing, &review, &done, &rework] {
        registry.insert(column).await.expect("column insert");
    }
    let board = SeededBoard {
        board_id,
        store: Arc::new(FlakyTaskStore::default()),
        registry,
        todo,
        doing,
        review,
        done,
        rework,
    };
    board.add_tasks(&board.todo, &["A", "B", "C"]).await;
    board.add_tasks(&board.doing, &["X", "Y"]).await;
    let linked = Task::new(board_id, board.review.id(), 0, "R", &DefaultClock)
        .expect("valid task")
        .with_pr_url(PullRequestUrl::parse("https://github.com/acme/planner/pull/31").expect("valid link"));
    board.store.insert(&linked).await.expect("task insert");
    board
}

impl SeededBoard {
    /// Appends tasks to a column in the store.
    pub async fn add_tasks(&self, column: &Column, titles: &[&str]) -> Vec<Task> {
        let existing = self
            .store
            .list_by_column(column.id())
            .await
            .expect("column listing");
        let mut created = Vec::new();
        for (offset, title) in titles.iter().enumerate() {
            let order = u32::try_from(existing.len() + offset).expect("small column");
            let task =
                Task::new(self.board_id, column.id(), order, *title, &DefaultClock).expect("valid task");
            self.store.insert(&task).await.expect("task insert");
            created.push(task);
        }
        created
    }

    /// Loads a coordinator over the stored board.
    pub async fn coordinator(&self) -> MoveCoordinator<FlakyTaskStore> {
        self.coordinator_with(PlannerConfig::default()).await
    }

    /// Loads a coordinator with a specific configuration.
    pub async fn coordinator_with(&self, config: PlannerConfig) -> MoveCoordinator<FlakyTaskStore> {
        MoveCoordinator::load(
            Arc::clone(&self.store),
            self.registry.as_ref(),
            self.board_id,
            config,
        )
        .await
        .expect("coordinator load")
    }

    /// Returns the stored task with `title`.
    pub async fn stored(&self, title: &str) -> Task {
        self.store
            .list_by_board(self.board_id)
            .await
            .expect("board listing")
            .into_iter()
            .find(|task| task.title() == title)
            .expect("task with title")
    }

    /// Returns a column's stored titles in display order.
    pub async fn stored_titles(&self, column: &Column) -> Vec<String> {
        self.store
            .list_by_column(column.id())
            .await
            .expect("column listing")
            .iter()
            .map(|task| task.title().to_owned())
            .collect()
    }

    /// Returns a column's stored ranks in display order.
    pub async fn stored_orders(&self, column: &Column) -> Vec<u32> {
        self.store
            .list_by_column(column.id())
            .await
            .expect("column listing")
            .iter()
            .map(Task::order)
            .collect()
    }

    /// Returns every stored placement, sorted.
    pub async fn stored_placements(&self) -> Vec<(TaskId, ColumnId, u32)> {
        placements(
            &self
                .store
                .list_by_board(self.board_id)
                .await
                .expect("board listing"),
        )
    }

    /// Builds a move of the stored task `title` to `index` in `to`.
    pub async fn intent(&self, title: &str, to: &Column, index: usize) -> MoveIntent {
        let task = self.stored(title).await;
        let source_index = self
            .store
            .list_by_column(task.column_id())
            .await
            .expect("column listing")
            .iter()
            .position(|sibling| sibling.id() == task.id())
            .expect("task in its column");
        MoveIntent::new(
            task.id(),
            ColumnPosition::new(task.column_id(), source_index),
            ColumnPosition::new(to.id(), index),
        )
    }
}

/// Returns `(id, column, order)` for each task, sorted.
pub fn placements(tasks: &[Task]) -> Vec<(TaskId, ColumnId, u32)> {
    let mut placed: Vec<_> = tasks
        .iter()
        .map(|task| (task.id(), task.column_id(), task.order()))
        .collect();
    placed.sort();
    placed
}

/// Returns a column's titles from a coordinator snapshot.
pub fn local_titles(coordinator: &MoveCoordinator<FlakyTaskStore>, column: &Column) -> Vec<String> {
    coordinator
        .column_tasks(column.id())
        .iter()
        .map(|task| task.title().to_owned())
        .collect()
}
