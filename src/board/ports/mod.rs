//! Port contracts for planner board persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by board services.

pub mod columns;
pub mod store;

pub use columns::{ColumnRegistry, ColumnRegistryError, ColumnRegistryResult};
pub use store::{TaskStore, TaskStoreError, TaskStoreResult};
