//! Lifecycle of a single optimistic task move.

use super::BoardDomainError;
use serde::{Deserialize, Serialize};

/// Where a task's current move stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveState {
    /// No move in flight; placement matches the store.
    Idle,
    /// The reorder is applied locally and not yet persisted.
    LocallyMoved,
    /// Applied locally and held until a missing input is supplied.
    AwaitingInput,
    /// Persistence calls are in flight.
    PersistPending,
    /// Every persistence call succeeded.
    Committed,
    /// The move was reverted.
    RolledBack,
}

/// Something that happened to a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveEvent {
    /// The reorder was applied to local state.
    AppliedLocally,
    /// The guard allowed the move and persistence started.
    PersistStarted,
    /// The guard deferred the move.
    Deferred,
    /// The move was kept locally without persistence.
    KeptLocal,
    /// The missing input arrived and persistence started.
    InputSupplied,
    /// The missing input was refused.
    InputRejected,
    /// The user abandoned the deferred move.
    Cancelled,
    /// All persistence calls succeeded.
    PersistSucceeded,
    /// At least one persistence call failed.
    PersistFailed,
    /// A finished move was acknowledged.
    Settled,
}

impl MoveState {
    /// Returns the state reached by `event`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidMoveTransition`] when the event is
    /// not valid in this state.
    pub fn apply(self, event: MoveEvent) -> Result<Self, BoardDomainError> {
        let next = match (self, event) {
            (Self::Idle, MoveEvent::AppliedLocally) => Self::LocallyMoved,
            (Self::LocallyMoved, MoveEvent::PersistStarted)
            | (Self::AwaitingInput, MoveEvent::InputSupplied) => Self::PersistPending,
            (Self::LocallyMoved, MoveEvent::Deferred) => Self::AwaitingInput,
            (Self::LocallyMoved, MoveEvent::KeptLocal)
            | (Self::PersistPending, MoveEvent::PersistSucceeded) => Self::Committed,
            (Self::AwaitingInput, MoveEvent::Cancelled | MoveEvent::InputRejected)
            | (Self::PersistPending, MoveEvent::PersistFailed) => Self::RolledBack,
            (Self::Committed | Self::RolledBack, MoveEvent::Settled) => Self::Idle,
            (from, rejected) => {
                return Err(BoardDomainError::InvalidMoveTransition {
                    from,
                    event: rejected,
                });
            }
        };
        Ok(next)
    }

    /// Returns `true` while a move occupies the task.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            Self::LocallyMoved | Self::AwaitingInput | Self::PersistPending
        )
    }

    /// Returns `true` for states that only wait to settle back to idle.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}
