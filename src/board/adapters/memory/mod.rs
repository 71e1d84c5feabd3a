//! In-memory adapters for planner board ports.

mod column_registry;
mod task_store;

pub use column_registry::InMemoryColumnRegistry;
pub use task_store::InMemoryTaskStore;
