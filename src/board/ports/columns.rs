//! Column registry port.

use crate::board::domain::{BoardId, Column, ColumnId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for column registry operations.
pub type ColumnRegistryResult<T> = Result<T, ColumnRegistryError>;

/// Column metadata contract.
#[async_trait]
pub trait ColumnRegistry: Send + Sync {
    /// Stores a new column.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnRegistryError::DuplicateColumn`] when the ID exists.
    async fn insert(&self, column: &Column) -> ColumnRegistryResult<()>;

    /// Finds a column by identifier.
    async fn find_by_id(&self, id: ColumnId) -> ColumnRegistryResult<Option<Column>>;

    /// Returns a board's columns in board order.
    async fn list_by_board(&self, board_id: BoardId) -> ColumnRegistryResult<Vec<Column>>;
}

/// Errors returned by column registry implementations.
#[derive(Debug, Clone, Error)]
pub enum ColumnRegistryError {
    /// A column with the same identifier already exists.
    #[error("duplicate column identifier: {0}")]
    DuplicateColumn(ColumnId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ColumnRegistryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
