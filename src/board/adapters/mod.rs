//! Adapter implementations for planner board ports.

pub mod memory;
pub mod postgres;
