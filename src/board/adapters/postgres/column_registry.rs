//! `PostgreSQL` column registry.

use super::{
    conversion::{column_to_row, row_to_column},
    models::ColumnRow,
    schema::board_columns,
    task_store::BoardPgPool,
};
use crate::board::{
    domain::{BoardId, Column, ColumnId},
    ports::{ColumnRegistry, ColumnRegistryError, ColumnRegistryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed column registry.
#[derive(Debug, Clone)]
pub struct PostgresColumnRegistry {
    pool: BoardPgPool,
}

impl PostgresColumnRegistry {
    /// Creates a registry from a connection pool.
    #[must_use]
    pub const fn new(pool: BoardPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ColumnRegistryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ColumnRegistryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ColumnRegistryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ColumnRegistryError::persistence)?
    }
}

fn load_column(row: ColumnRow) -> ColumnRegistryResult<Column> {
    row_to_column(row).map_err(ColumnRegistryError::persistence)
}

#[async_trait]
impl ColumnRegistry for PostgresColumnRegistry {
    async fn insert(&self, column: &Column) -> ColumnRegistryResult<()> {
        let column_id = column.id();
        let row = column_to_row(column).map_err(ColumnRegistryError::persistence)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(board_columns::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ColumnRegistryError::DuplicateColumn(column_id)
                    }
                    other => ColumnRegistryError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: ColumnId) -> ColumnRegistryResult<Option<Column>> {
        self.run_blocking(move |connection| {
            board_columns::table
                .filter(board_columns::id.eq(id.into_inner()))
                .select(ColumnRow::as_select())
                .first::<ColumnRow>(connection)
                .optional()
                .map_err(ColumnRegistryError::persistence)?
                .map(load_column)
                .transpose()
        })
        .await
    }

    async fn list_by_board(&self, board_id: BoardId) -> ColumnRegistryResult<Vec<Column>> {
        self.run_blocking(move |connection| {
            board_columns::table
                .filter(board_columns::board_id.eq(board_id.into_inner()))
                .order((board_columns::order_num.asc(), board_columns::id.asc()))
                .select(ColumnRow::as_select())
                .load::<ColumnRow>(connection)
                .map_err(ColumnRegistryError::persistence)?
                .into_iter()
                .map(load_column)
                .collect()
        })
        .await
    }
}
