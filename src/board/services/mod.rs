//! Application services for board moves and task planning.

mod config;
mod coordinator;
mod planner;

pub use config::PlannerConfig;
pub use coordinator::{BoardSnapshot, MoveCoordinator, MoveError, MoveOutcome, PersistMode};
pub use planner::{
    CreateTaskRequest, PlannerError, PlannerResult, PlannerService, StatusChange, SyncReport,
    TaskRelocation, UnknownTarget,
};
