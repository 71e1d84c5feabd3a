//! In-memory column registry.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::board::{
    domain::{BoardId, Column, ColumnId},
    ports::{ColumnRegistry, ColumnRegistryError, ColumnRegistryResult},
};

/// Thread-safe in-memory column registry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryColumnRegistry {
    columns: Arc<RwLock<HashMap<ColumnId, Column>>>,
}

impl InMemoryColumnRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> ColumnRegistryError {
    ColumnRegistryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ColumnRegistry for InMemoryColumnRegistry {
    async fn insert(&self, column: &Column) -> ColumnRegistryResult<()> {
        let mut columns = self.columns.write().map_err(lock_error)?;
        if columns.contains_key(&column.id()) {
            return Err(ColumnRegistryError::DuplicateColumn(column.id()));
        }
        columns.insert(column.id(), column.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ColumnId) -> ColumnRegistryResult<Option<Column>> {
        let columns = self.columns.read().map_err(lock_error)?;
        Ok(columns.get(&id).cloned())
    }

    async fn list_by_board(&self, board_id: BoardId) -> ColumnRegistryResult<Vec<Column>> {
        let columns = self.columns.read().map_err(lock_error)?;
        let mut listed: Vec<Column> = columns
            .values()
            .filter(|column| column.board_id() == board_id)
            .cloned()
            .collect();
        listed.sort_by(|left, right| {
            left.order()
                .cmp(&right.order())
                .then_with(|| left.id().cmp(&right.id()))
        });
        Ok(listed)
    }
}
