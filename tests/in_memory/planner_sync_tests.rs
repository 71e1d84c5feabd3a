//! In-memory integration tests for task planning and pull request sync.

use super::board_helpers::{FlakyTaskStore, SeededBoard, seeded};
use mockable::DefaultClock;
use planboard::board::{
    adapters::memory::InMemoryColumnRegistry,
    domain::{
        ColumnId, PullRequestSnapshot, PullRequestTransitions, SyncReason, TaskId, TaskPatch,
        TaskStatus,
    },
    ports::ColumnRegistry,
    services::{CreateTaskRequest, PlannerService, StatusChange, UnknownTarget},
};
use rstest::rstest;
use std::collections::BTreeMap;
use std::sync::Arc;

type TestService = PlannerService<FlakyTaskStore, InMemoryColumnRegistry, DefaultClock>;

fn service(board: &SeededBoard) -> TestService {
    PlannerService::new(
        Arc::clone(&board.store),
        Arc::clone(&board.registry),
        Arc::new(DefaultClock),
    )
}

async fn snapshot_for(
    board: &SeededBoard,
    title: &str,
    snapshot: PullRequestSnapshot,
) -> BTreeMap<TaskId, PullRequestSnapshot> {
    BTreeMap::from([(board.stored(title).await.id(), snapshot)])
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_task_lands_after_existing_tasks(#[future] seeded: SeededBoard) {
    let board = seeded.await;

    let task = service(&board)
        .create_task(CreateTaskRequest::new(board.board_id, board.doing.id(), "Z"))
        .await
        .expect("task creation");

    assert_eq!(task.order(), 2);
    assert_eq!(task.status(), TaskStatus::Pending);
    assert_eq!(board.stored_titles(&board.doing).await, ["X", "Y", "Z"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn merged_pull_request_appends_the_task_to_the_merge_column(
    #[future] seeded: SeededBoard,
) {
    let board = seeded.await;
    board.add_tasks(&board.done, &["Older"]).await;
    let snapshots = snapshot_for(&board, "R", PullRequestSnapshot::merged()).await;

    let report = service(&board)
        .sync_pull_requests(board.board_id, &snapshots)
        .await
        .expect("sync");

    assert_eq!(report.checked, 1);
    let relocation = report.relocations.first().expect("one relocation");
    assert_eq!(relocation.to, board.done.id());
    assert_eq!(relocation.order, 1);
    assert_eq!(relocation.reason, SyncReason::Merged);
    let merged = board.stored("R").await;
    assert_eq!(merged.column_id(), board.done.id());
    assert_eq!(merged.status(), TaskStatus::Merged);
    assert_eq!(board.stored_titles(&board.done).await, ["Older", "R"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn closed_pull_request_moves_back_without_a_status_change(
    #[future] seeded: SeededBoard,
) {
    let board = seeded.await;
    let snapshots = snapshot_for(&board, "R", PullRequestSnapshot::closed_unmerged()).await;

    let report = service(&board)
        .sync_pull_requests(board.board_id, &snapshots)
        .await
        .expect("sync");

    assert!(report.status_changes.is_empty());
    let closed = board.stored("R").await;
    assert_eq!(closed.column_id(), board.todo.id());
    assert_eq!(closed.order(), 3);
    assert_eq!(closed.status(), TaskStatus::Pending);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approval_updates_status_in_place(#[future] seeded: SeededBoard) {
    let board = seeded.await;
    let snapshots = snapshot_for(&board, "R", PullRequestSnapshot::open().with_approval()).await;
    let task_id = board.stored("R").await.id();

    let report = service(&board)
        .sync_pull_requests(board.board_id, &snapshots)
        .await
        .expect("sync");

    assert!(report.relocations.is_empty());
    assert_eq!(
        report.status_changes,
        [StatusChange {
            task_id,
            from: TaskStatus::Pending,
            to: TaskStatus::Approved,
        }]
    );
    assert_eq!(board.stored("R").await.column_id(), board.review.id());

    let again = service(&board)
        .sync_pull_requests(board.board_id, &snapshots)
        .await
        .expect("second sync");
    assert!(again.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_outside_pr_columns_are_not_synced(#[future] seeded: SeededBoard) {
    let board = seeded.await;
    let snapshots = snapshot_for(&board, "A", PullRequestSnapshot::merged()).await;

    let report = service(&board)
        .sync_pull_requests(board.board_id, &snapshots)
        .await
        .expect("sync");

    assert_eq!(report.checked, 0);
    assert!(report.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_target_column_is_reported(#[future] seeded: SeededBoard) {
    let board = seeded.await;
    let missing = ColumnId::new();
    let gated = board
        .review
        .clone()
        .with_transitions(PullRequestTransitions {
            on_merge: Some(missing),
            on_closed: None,
            on_changes_requested: None,
        });
    let registry = InMemoryColumnRegistry::new();
    for column in [&board.todo, &board.doing, &gated, &board.done, &board.rework] {
        registry.insert(column).await.expect("column insert");
    }
    let service = PlannerService::new(
        Arc::clone(&board.store),
        Arc::new(registry),
        Arc::new(DefaultClock),
    );
    let snapshots = snapshot_for(&board, "R", PullRequestSnapshot::merged()).await;

    let report = service
        .sync_pull_requests(board.board_id, &snapshots)
        .await
        .expect("sync");

    let task_id = board.stored("R").await.id();
    assert_eq!(
        report.unknown_targets,
        [UnknownTarget {
            task_id,
            column_id: missing,
        }]
    );
    assert!(report.relocations.is_empty());
    assert_eq!(board.stored("R").await.status(), TaskStatus::Merged);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn column_statuses_follow_column_names(#[future] seeded: SeededBoard) {
    let board = seeded.await;
    let service = service(&board);
    let x = board.stored("X").await;
    service
        .patch_task(&TaskPatch::position(x.id(), board.done.id(), 0))
        .await
        .expect("patch");

    let changes = service
        .sync_column_statuses(board.board_id)
        .await
        .expect("status sync");

    assert!(changes.contains(&StatusChange {
        task_id: x.id(),
        from: TaskStatus::Pending,
        to: TaskStatus::Completed,
    }));
    assert_eq!(board.stored("X").await.status(), TaskStatus::Completed);
    assert_eq!(board.stored("A").await.status(), TaskStatus::Pending);
}
