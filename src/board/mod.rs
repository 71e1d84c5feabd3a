//! Planner board task ordering and column transitions.
//!
//! Tasks sit in columns in a per-column rank order and are moved by
//! drag-and-drop. A move is applied locally first and persisted afterwards;
//! columns that require a linked pull request hold incoming moves until the
//! link is supplied. The module follows hexagonal architecture:
//!
//! - Domain types, the ordering engine and the transition guard in
//!   [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The move coordinator and planner service in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
