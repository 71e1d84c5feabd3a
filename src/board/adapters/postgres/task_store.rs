//! `PostgreSQL` task store.

use super::{
    conversion::{row_to_task, task_to_record},
    models::TaskRow,
    schema::tasks,
};
use crate::board::{
    domain::{BoardId, ColumnId, Task, TaskId, TaskPatch},
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;

/// `PostgreSQL` connection pool type used by board adapters.
pub type BoardPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task store.
#[derive(Debug, Clone)]
pub struct PostgresTaskStore<C = DefaultClock> {
    pool: BoardPgPool,
    clock: Arc<C>,
}

impl PostgresTaskStore<DefaultClock> {
    /// Creates a store from a connection pool using the system clock.
    #[must_use]
    pub fn new(pool: BoardPgPool) -> Self {
        Self::with_clock(pool, Arc::new(DefaultClock))
    }
}

impl<C> PostgresTaskStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Creates a store from a connection pool stamping updates with `clock`.
    #[must_use]
    pub const fn with_clock(pool: BoardPgPool, clock: Arc<C>) -> Self {
        Self { pool, clock }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskStoreError::persistence)?
    }
}

/// Maps write failures, reporting dangling column references as validation
/// errors rather than infrastructure faults.
fn map_write_error(err: DieselError) -> TaskStoreError {
    match err {
        DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation | DatabaseErrorKind::CheckViolation,
            ref info,
        ) => TaskStoreError::Validation(info.message().to_owned()),
        other => TaskStoreError::persistence(other),
    }
}

impl From<DieselError> for TaskStoreError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

fn load_rows(rows: Vec<TaskRow>) -> TaskStoreResult<Vec<Task>> {
    rows.into_iter()
        .map(|row| row_to_task(row).map_err(TaskStoreError::persistence))
        .collect()
}

#[async_trait]
impl<C> TaskStore for PostgresTaskStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn insert(&self, task: &Task) -> TaskStoreResult<()> {
        let task_id = task.id();
        let record = task_to_record(task).map_err(TaskStoreError::persistence)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&record)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskStoreError::DuplicateTask(task_id)
                    }
                    other => map_write_error(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn patch(&self, patch: &TaskPatch) -> TaskStoreResult<Task> {
        let patch = patch.clone();
        let clock = Arc::clone(&self.clock);
        self.run_blocking(move |connection| {
            connection.transaction(|tx| {
                let task_id = patch.id();
                let row = tasks::table
                    .filter(tasks::id.eq(task_id.into_inner()))
                    .select(TaskRow::as_select())
                    .for_update()
                    .first::<TaskRow>(tx)
                    .optional()
                    .map_err(TaskStoreError::persistence)?
                    .ok_or(TaskStoreError::NotFound(task_id))?;
                let mut task = row_to_task(row).map_err(TaskStoreError::persistence)?;
                task.apply_updates(patch.updates(), &*clock)
                    .map_err(|err| TaskStoreError::Validation(err.to_string()))?;
                let record = task_to_record(&task).map_err(TaskStoreError::persistence)?;
                diesel::update(tasks::table.filter(tasks::id.eq(task_id.into_inner())))
                    .set(&record)
                    .execute(tx)
                    .map_err(map_write_error)?;
                Ok(task)
            })
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> TaskStoreResult<()> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(tasks::table.filter(tasks::id.eq(id.into_inner())))
                .execute(connection)
                .map_err(TaskStoreError::persistence)?;
            if deleted == 0 {
                return Err(TaskStoreError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map(|found| row_to_task(found).map_err(TaskStoreError::persistence))
                .transpose()
        })
        .await
    }

    async fn list_by_column(&self, column_id: ColumnId) -> TaskStoreResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::column_id.eq(column_id.into_inner()))
                .order((tasks::order_num.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskStoreError::persistence)?;
            load_rows(rows)
        })
        .await
    }

    async fn list_by_board(&self, board_id: BoardId) -> TaskStoreResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::board_id.eq(board_id.into_inner()))
                .order((tasks::column_id.asc(), tasks::order_num.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskStoreError::persistence)?;
            load_rows(rows)
        })
        .await
    }
}
