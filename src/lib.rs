//! Planboard: task ordering and column transitions for a planner board.
//!
//! This crate keeps the tasks of a kanban-style board in a stable,
//! contiguous order per column, decides whether a task may enter a column,
//! and applies moves optimistically with rollback when persistence fails.
//!
//! # Architecture
//!
//! Planboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`board`]: Ordering engine, transition guard, move coordination and
//!   pull request status sync

pub mod board;
