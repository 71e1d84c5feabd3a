//! Optimistic move coordination for the planner board.
//!
//! A move is applied to the coordinator's board snapshot first so callers
//! can render it at once, then persisted one task patch at a time. When any
//! write fails the move is reverted locally and in the store. Moves into
//! PR-gated columns without a pull request link are held until the link is
//! supplied or the move is cancelled.

use crate::board::{
    domain::{
        BoardDomainError, BoardId, Column, ColumnId, MissingInput, MoveEvent, MoveIntent,
        MoveState, PullRequestUrl, RankChange, Reorder, Task, TaskFieldUpdate, TaskId, TaskPatch,
        TransitionVerdict, apply_changes, column_tasks, compute_reorder, evaluate,
    },
    ports::{ColumnRegistry, ColumnRegistryError, TaskStore, TaskStoreError},
    services::PlannerConfig,
};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Whether a move should reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistMode {
    /// Persist the move after applying it locally.
    #[default]
    Persist,
    /// Apply the move locally only.
    LocalOnly,
}

/// Result of a coordinator operation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The drop landed on the slot the drag started from.
    Unchanged,
    /// The move was applied locally and not persisted.
    AppliedLocally(Vec<RankChange>),
    /// Every write succeeded.
    Committed(Vec<RankChange>),
    /// The move stands locally until the missing input is supplied.
    AwaitingInput {
        /// Task whose move is held.
        task_id: TaskId,
        /// What the move is waiting for.
        missing: MissingInput,
    },
    /// A held move was cancelled and reverted.
    RolledBack,
}

/// Errors returned by [`MoveCoordinator`].
#[derive(Debug, Error)]
pub enum MoveError {
    /// The move does not fit the board snapshot. Local state is untouched.
    #[error(transparent)]
    Structural(#[from] BoardDomainError),

    /// The task already has a move in flight.
    #[error("task {0} already has a move in flight")]
    MoveInFlight(TaskId),

    /// The task has no move waiting for input.
    #[error("task {0} has no move awaiting input")]
    NoPendingMove(TaskId),

    /// The transition guard refused the move.
    #[error("move refused: {0}")]
    Rejected(String),

    /// The supplied pull request link is invalid; the held move was
    /// rolled back.
    #[error("invalid pull request link for task {task_id}: {source}")]
    InvalidPrUrl {
        /// Task whose move was held.
        task_id: TaskId,
        /// Parse failure.
        source: BoardDomainError,
    },

    /// The guard still defers the move after input was supplied.
    #[error("task {0} still does not meet the destination column's requirements")]
    PreconditionUnmet(TaskId),

    /// At least one write failed and the move was rolled back.
    ///
    /// `rolled_back` is `false` when reverting the store also failed; the
    /// affected columns were then re-fetched when configured to.
    #[error("persisting the move of task {task_id} failed for {} task(s): {source}", failed.len())]
    PersistenceFailure {
        /// Task whose move failed.
        task_id: TaskId,
        /// Tasks whose writes failed.
        failed: Vec<TaskId>,
        /// Whether the store was restored to its pre-move state.
        rolled_back: bool,
        /// First write error observed.
        source: TaskStoreError,
    },

    /// Loading tasks failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),

    /// Loading columns failed.
    #[error(transparent)]
    Columns(#[from] ColumnRegistryError),
}

/// Columns and tasks of one board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    /// Board the snapshot belongs to.
    pub board_id: BoardId,
    /// Board columns.
    pub columns: Vec<Column>,
    /// Board tasks.
    pub tasks: Vec<Task>,
}

impl BoardSnapshot {
    /// Creates a snapshot.
    #[must_use]
    pub const fn new(board_id: BoardId, columns: Vec<Column>, tasks: Vec<Task>) -> Self {
        Self {
            board_id,
            columns,
            tasks,
        }
    }
}

#[derive(Debug)]
struct ActiveMove {
    state: MoveState,
    reorder: Reorder,
}

impl ActiveMove {
    fn applied(reorder: Reorder) -> Result<Self, BoardDomainError> {
        let state = MoveState::Idle.apply(MoveEvent::AppliedLocally)?;
        Ok(Self { state, reorder })
    }

    fn advance(&mut self, event: MoveEvent) -> Result<(), BoardDomainError> {
        self.state = self.state.apply(event)?;
        Ok(())
    }
}

#[derive(Debug)]
struct BoardState {
    columns: HashMap<ColumnId, Column>,
    tasks: Vec<Task>,
    moves: HashMap<TaskId, ActiveMove>,
}

enum Started {
    Finished(MoveOutcome),
    Persist(Reorder),
}

/// Applies moves locally and reconciles them with a [`TaskStore`].
///
/// Moves for different tasks may run concurrently; a task holds at most one
/// active move.
pub struct MoveCoordinator<S>
where
    S: TaskStore,
{
    store: Arc<S>,
    config: PlannerConfig,
    board_id: BoardId,
    state: Mutex<BoardState>,
}

impl<S> MoveCoordinator<S>
where
    S: TaskStore,
{
    /// Creates a coordinator over an already loaded board snapshot.
    #[must_use]
    pub fn new(store: Arc<S>, snapshot: BoardSnapshot, config: PlannerConfig) -> Self {
        let columns = snapshot
            .columns
            .into_iter()
            .map(|column| (column.id(), column))
            .collect();
        Self {
            store,
            config,
            board_id: snapshot.board_id,
            state: Mutex::new(BoardState {
                columns,
                tasks: snapshot.tasks,
                moves: HashMap::new(),
            }),
        }
    }

    /// Loads a board's columns and tasks and creates a coordinator for it.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::Columns`] or [`MoveError::Store`] when loading
    /// fails.
    pub async fn load<R>(
        store: Arc<S>,
        registry: &R,
        board_id: BoardId,
        config: PlannerConfig,
    ) -> Result<Self, MoveError>
    where
        R: ColumnRegistry + ?Sized,
    {
        let columns = registry.list_by_board(board_id).await?;
        let tasks = store.list_by_board(board_id).await?;
        debug!(
            board_id = %board_id,
            columns = columns.len(),
            tasks = tasks.len(),
            "loaded board snapshot"
        );
        let snapshot = BoardSnapshot::new(board_id, columns, tasks);
        Ok(Self::new(store, snapshot, config))
    }

    /// Returns the board this coordinator manages.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Applies a move locally and, in [`PersistMode::Persist`], persists it.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::Structural`] when the move does not fit the
    /// snapshot, [`MoveError::MoveInFlight`] when the task is already
    /// moving and [`MoveError::PersistenceFailure`] when a write fails and
    /// the move is rolled back.
    pub async fn apply_move(
        &self,
        intent: MoveIntent,
        mode: PersistMode,
    ) -> Result<MoveOutcome, MoveError> {
        match self.start_move(&intent, mode)? {
            Started::Finished(outcome) => Ok(outcome),
            Started::Persist(reorder) => self.persist(reorder, None).await,
        }
    }

    /// Supplies the pull request link a held move is waiting for and
    /// persists the move together with the link.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::NoPendingMove`] when the task has no held move,
    /// [`MoveError::InvalidPrUrl`] when the link does not parse (the move is
    /// rolled back), [`MoveError::PreconditionUnmet`] when the guard still
    /// defers and [`MoveError::PersistenceFailure`] when a write fails.
    pub async fn resume_move_with_pr_url(
        &self,
        task_id: TaskId,
        pr_url: &str,
    ) -> Result<MoveOutcome, MoveError> {
        let (reorder, parsed) = self.supply_pr_url(task_id, pr_url)?;
        self.persist(reorder, Some(parsed)).await
    }

    /// Cancels a held move and restores the pre-move placement locally.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::NoPendingMove`] when the task has no held move.
    pub fn cancel_pending_move(&self, task_id: TaskId) -> Result<MoveOutcome, MoveError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let held = state
            .moves
            .get(&task_id)
            .filter(|active| active.state == MoveState::AwaitingInput)
            .ok_or(MoveError::NoPendingMove(task_id))?;
        undo_move(&mut state.tasks, &held.reorder)?;
        let Some(mut active) = state.moves.remove(&task_id) else {
            return Err(MoveError::NoPendingMove(task_id));
        };
        active.advance(MoveEvent::Cancelled)?;
        active.advance(MoveEvent::Settled)?;
        warn!(task_id = %task_id, "cancelled held move");
        Ok(MoveOutcome::RolledBack)
    }

    /// Returns a task from the local snapshot.
    #[must_use]
    pub fn task(&self, task_id: TaskId) -> Option<Task> {
        self.lock()
            .tasks
            .iter()
            .find(|task| task.id() == task_id)
            .cloned()
    }

    /// Returns every task in the local snapshot.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    /// Returns a column's tasks in display order.
    #[must_use]
    pub fn column_tasks(&self, column_id: ColumnId) -> Vec<Task> {
        let state = self.lock();
        column_tasks(&state.tasks, column_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Returns the board's columns in board order.
    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        let mut columns: Vec<Column> = self.lock().columns.values().cloned().collect();
        columns.sort_by_key(|column| (column.order(), column.id()));
        columns
    }

    /// Returns where a task's move stands; [`MoveState::Idle`] when none is
    /// active.
    #[must_use]
    pub fn move_state(&self, task_id: TaskId) -> MoveState {
        self.lock()
            .moves
            .get(&task_id)
            .map_or(MoveState::Idle, |active| active.state)
    }

    /// Replaces the local tasks with the store's current state.
    ///
    /// Held moves are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::Store`] when the fetch fails; local state is
    /// then left as it was.
    pub async fn refresh(&self) -> Result<(), MoveError> {
        let tasks = self.store.list_by_board(self.board_id).await?;
        let mut state = self.lock();
        let before = state.moves.len();
        state
            .moves
            .retain(|_, active| active.state != MoveState::AwaitingInput);
        let discarded = before.saturating_sub(state.moves.len());
        if discarded > 0 {
            warn!(board_id = %self.board_id, discarded, "refresh discarded held moves");
        }
        state.tasks = tasks;
        debug!(board_id = %self.board_id, tasks = state.tasks.len(), "refreshed board tasks");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_move(&self, intent: &MoveIntent, mode: PersistMode) -> Result<Started, MoveError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.moves.contains_key(&intent.task_id) {
            return Err(MoveError::MoveInFlight(intent.task_id));
        }
        if !state.columns.contains_key(&intent.source.column_id) {
            return Err(BoardDomainError::UnknownColumn(intent.source.column_id).into());
        }
        let destination = state
            .columns
            .get(&intent.destination.column_id)
            .ok_or(BoardDomainError::UnknownColumn(intent.destination.column_id))?;
        let reorder = compute_reorder(&state.tasks, intent)?;
        if reorder.is_empty() {
            debug!(task_id = %intent.task_id, "move dropped on its own slot");
            return Ok(Started::Finished(MoveOutcome::Unchanged));
        }
        let task = state
            .tasks
            .iter()
            .find(|task| task.id() == intent.task_id)
            .ok_or(BoardDomainError::UnknownTask(intent.task_id))?;
        let verdict = evaluate(task, intent.source.column_id, destination);
        if let TransitionVerdict::Reject(reason) = &verdict {
            return Err(MoveError::Rejected(reason.clone()));
        }

        apply_changes(&mut state.tasks, reorder.changes());
        let mut active = ActiveMove::applied(reorder.clone())?;
        debug!(
            task_id = %intent.task_id,
            from_column = %intent.source.column_id,
            to_column = %intent.destination.column_id,
            index = reorder.final_index(),
            changed = reorder.changes().len(),
            "applied move locally"
        );

        match (mode, verdict) {
            (PersistMode::LocalOnly, _) => {
                active.advance(MoveEvent::KeptLocal)?;
                active.advance(MoveEvent::Settled)?;
                Ok(Started::Finished(MoveOutcome::AppliedLocally(
                    reorder.changes().to_vec(),
                )))
            }
            (PersistMode::Persist, TransitionVerdict::DeferPendingInput(missing)) => {
                active.advance(MoveEvent::Deferred)?;
                state.moves.insert(intent.task_id, active);
                warn!(
                    task_id = %intent.task_id,
                    column_id = %intent.destination.column_id,
                    missing = ?missing,
                    "holding move until input is supplied"
                );
                Ok(Started::Finished(MoveOutcome::AwaitingInput {
                    task_id: intent.task_id,
                    missing,
                }))
            }
            (PersistMode::Persist, _) => {
                active.advance(MoveEvent::PersistStarted)?;
                state.moves.insert(intent.task_id, active);
                Ok(Started::Persist(reorder))
            }
        }
    }

    fn supply_pr_url(
        &self,
        task_id: TaskId,
        raw: &str,
    ) -> Result<(Reorder, PullRequestUrl), MoveError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let active = state
            .moves
            .get_mut(&task_id)
            .filter(|active| active.state == MoveState::AwaitingInput)
            .ok_or(MoveError::NoPendingMove(task_id))?;

        let pr_url = match self.config.parse_pr_url(raw) {
            Ok(pr_url) => pr_url,
            Err(source) => {
                undo_move(&mut state.tasks, &active.reorder)?;
                active.advance(MoveEvent::InputRejected)?;
                active.advance(MoveEvent::Settled)?;
                state.moves.remove(&task_id);
                warn!(task_id = %task_id, error = %source, "rejected pull request link; rolled back held move");
                return Err(MoveError::InvalidPrUrl { task_id, source });
            }
        };

        let intent = *active.reorder.intent();
        let destination = state
            .columns
            .get(&intent.destination.column_id)
            .ok_or(BoardDomainError::UnknownColumn(intent.destination.column_id))?;
        let task = state
            .tasks
            .iter_mut()
            .find(|task| task.id() == task_id)
            .ok_or(BoardDomainError::UnknownTask(task_id))?;
        task.set_pr_url(Some(pr_url.clone()));
        if !evaluate(task, intent.source.column_id, destination).is_allowed() {
            task.set_pr_url(None);
            return Err(MoveError::PreconditionUnmet(task_id));
        }
        active.advance(MoveEvent::InputSupplied)?;
        info!(task_id = %task_id, pr_url = %pr_url, "pull request link supplied; persisting held move");
        Ok((active.reorder.clone(), pr_url))
    }

    async fn persist(
        &self,
        reorder: Reorder,
        pr_url: Option<PullRequestUrl>,
    ) -> Result<MoveOutcome, MoveError> {
        let task_id = reorder.intent().task_id;
        let patches: Vec<TaskPatch> = reorder
            .changes()
            .iter()
            .map(|change| {
                let patch = change.to_patch();
                match &pr_url {
                    Some(url) if change.task_id == task_id => {
                        patch.with(TaskFieldUpdate::PrUrl(Some(url.clone())))
                    }
                    _ => patch,
                }
            })
            .collect();

        let results = join_all(patches.iter().map(|patch| self.store.patch(patch))).await;

        let mut failed = Vec::new();
        let mut first_error = None;
        for (patch, result) in patches.iter().zip(results) {
            if let Err(err) = result {
                warn!(task_id = %patch.id(), error = %err, "task write failed");
                failed.push(patch.id());
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            None => self.commit(&reorder),
            Some(source) => {
                let pr_url_written = pr_url.is_some() && !failed.contains(&task_id);
                let rolled_back = self.roll_back(&reorder, &failed, pr_url_written).await;
                Err(MoveError::PersistenceFailure {
                    task_id,
                    failed,
                    rolled_back,
                    source,
                })
            }
        }
    }

    fn commit(&self, reorder: &Reorder) -> Result<MoveOutcome, MoveError> {
        let task_id = reorder.intent().task_id;
        if let Some(mut active) = self.lock().moves.remove(&task_id) {
            active.advance(MoveEvent::PersistSucceeded)?;
            active.advance(MoveEvent::Settled)?;
        }
        info!(
            task_id = %task_id,
            column_id = %reorder.intent().destination.column_id,
            index = reorder.final_index(),
            written = reorder.changes().len(),
            "move committed"
        );
        Ok(MoveOutcome::Committed(reorder.changes().to_vec()))
    }

    /// Moves the task back locally, then persists the placements that now
    /// differ from the store. Returns `true` when the store was restored.
    async fn roll_back(&self, reorder: &Reorder, failed: &[TaskId], pr_url_written: bool) -> bool {
        let task_id = reorder.intent().task_id;
        let planned = self.revert_locally(reorder, failed, pr_url_written);

        let mut restored = planned.is_some();
        let reverts = planned.unwrap_or_default();
        let results = join_all(reverts.iter().map(|patch| self.store.patch(patch))).await;
        for (patch, result) in reverts.iter().zip(results) {
            if let Err(err) = result {
                restored = false;
                error!(task_id = %patch.id(), error = %err, "failed to persist rollback");
            }
        }

        if !restored && self.config.refetch_on_rollback_failure {
            let intent = reorder.intent();
            self.refetch_columns(&[intent.source.column_id, intent.destination.column_id])
                .await;
        }

        if let Some(mut active) = self.lock().moves.remove(&task_id) {
            if let Err(err) = active.advance(MoveEvent::Settled) {
                error!(task_id = %task_id, error = %err, "move did not settle");
            }
        }
        restored
    }

    /// Undoes a failed move against the current snapshot so moves that
    /// committed meanwhile keep their placement.
    ///
    /// Returns the patches that bring the store in line, or `None` when the
    /// move can no longer be undone locally.
    fn revert_locally(
        &self,
        reorder: &Reorder,
        failed: &[TaskId],
        pr_url_written: bool,
    ) -> Option<Vec<TaskPatch>> {
        let task_id = reorder.intent().task_id;
        let mut guard = self.lock();
        let state = &mut *guard;
        if let Some(active) = state.moves.get_mut(&task_id) {
            if let Err(err) = active.advance(MoveEvent::PersistFailed) {
                error!(task_id = %task_id, error = %err, "unexpected move state during rollback");
            }
        }
        let back = match undo_move(&mut state.tasks, reorder) {
            Ok(back) => back,
            Err(err) => {
                error!(task_id = %task_id, error = %err, "failed to undo move locally");
                return None;
            }
        };
        if pr_url_written {
            if let Some(task) = state.tasks.iter_mut().find(|task| task.id() == task_id) {
                task.set_pr_url(None);
            }
        }
        warn!(
            task_id = %task_id,
            reverted = back.changes().len(),
            "rolled back move after a failed write"
        );

        let unwritten: HashMap<TaskId, (ColumnId, u32)> = reorder
            .changes()
            .iter()
            .filter(|change| failed.contains(&change.task_id))
            .map(|change| (change.task_id, (change.previous_column_id, change.previous_order)))
            .collect();
        let mut patches: Vec<TaskPatch> = back
            .changes()
            .iter()
            .filter(|change| {
                unwritten.get(&change.task_id) != Some(&(change.column_id, change.order))
            })
            .map(RankChange::to_patch)
            .collect();
        for (id, stored) in &unwritten {
            let already = back.changes().iter().any(|change| change.task_id == *id);
            let local = state
                .tasks
                .iter()
                .find(|task| task.id() == *id)
                .map(|task| (task.column_id(), task.order()));
            if let Some((column_id, order)) = local.filter(|placement| !already && placement != stored) {
                patches.push(TaskPatch::position(*id, column_id, order));
            }
        }
        if pr_url_written {
            let cleared = TaskFieldUpdate::PrUrl(None);
            match patches.iter_mut().find(|patch| patch.id() == task_id) {
                Some(patch) => *patch = patch.clone().with(cleared),
                None => patches.push(TaskPatch::new(task_id).with(cleared)),
            }
        }
        Some(patches)
    }

    async fn refetch_columns(&self, column_ids: &[ColumnId]) {
        let mut unique: Vec<ColumnId> = Vec::new();
        for column_id in column_ids {
            if !unique.contains(column_id) {
                unique.push(*column_id);
            }
        }
        let results = join_all(
            unique
                .iter()
                .map(|column_id| self.store.list_by_column(*column_id)),
        )
        .await;

        let mut fetched = Vec::new();
        for (column_id, result) in unique.iter().zip(results) {
            match result {
                Ok(tasks) => fetched.push((*column_id, tasks)),
                Err(err) => {
                    error!(column_id = %column_id, error = %err, "failed to re-fetch column; keeping local state");
                }
            }
        }
        self.replace_columns(fetched);
    }

    fn replace_columns(&self, fetched: Vec<(ColumnId, Vec<Task>)>) {
        let mut state = self.lock();
        for (column_id, tasks) in fetched {
            let ids: HashSet<TaskId> = tasks.iter().map(Task::id).collect();
            state
                .tasks
                .retain(|task| task.column_id() != column_id && !ids.contains(&task.id()));
            debug!(column_id = %column_id, tasks = tasks.len(), "re-fetched column");
            state.tasks.extend(tasks);
        }
    }
}

/// Moves a task back to where `reorder` took it from, re-ranking both
/// columns as they stand now.
fn undo_move(tasks: &mut [Task], reorder: &Reorder) -> Result<Reorder, BoardDomainError> {
    let back = compute_reorder(tasks, &reorder.inverse_intent())?;
    apply_changes(tasks, back.changes());
    Ok(back)
}
