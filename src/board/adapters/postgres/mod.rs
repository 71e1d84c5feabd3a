//! `PostgreSQL` adapters for planner board persistence.

mod column_registry;
mod conversion;
mod models;
mod schema;
mod task_store;

pub use column_registry::PostgresColumnRegistry;
pub use task_store::{BoardPgPool, PostgresTaskStore};
