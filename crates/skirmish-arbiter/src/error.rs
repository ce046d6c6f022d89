//! Error and rejection types for the arbiter.
//!
//! Rejections are ordinary outcomes: the caller asked for something the
//! rules do not allow, nothing broke, and no state changed. Errors mean the
//! arbiter itself could not be reached or configured.

use skirmish_protocol::{PlayerNumber, UnitId};

/// Why a submitted turn was refused. A refused turn changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnRejection {
    /// The caller does not hold the turn.
    #[error("not your turn ({active} is active)")]
    NotYourTurn { active: PlayerNumber },

    /// The match has ended; only `reset` reopens it.
    #[error("game is over")]
    GameOver,

    /// The turn names a unit that is not on the roster.
    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),

    /// The turn tries to move a unit owned by the other player.
    #[error("unit {0} belongs to the other player")]
    NotYourUnit(UnitId),

    /// The turn moves or attacks a unit that has already been removed.
    #[error("unit {0} is down")]
    UnitDown(UnitId),
}

/// Errors that can occur when talking to or building an arbiter.
#[derive(Debug, thiserror::Error)]
pub enum ArbiterError {
    /// The arbiter task has stopped (match discarded) or its channel closed.
    #[error("arbiter is unavailable")]
    Unavailable,

    /// The unit roster is unusable.
    #[error("invalid roster: {0}")]
    InvalidRoster(String),
}
