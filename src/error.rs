//! Error types for combat resolution.
//!
//! Only remote failures on the primary acknowledgement path and broken
//! invariants surface here. Rule violations (a firing group with nothing to
//! shoot at) and best-effort notification failures are absorbed where they
//! happen.

use crate::board::{PlayerId, UnitId};
use crate::combat::{GroupId, GroupPhase};

/// Failures talking to a remote participant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("no remote registered for player '{0}'")]
    NoRemote(PlayerId),

    #[error("player '{0}' disconnected")]
    Disconnected(PlayerId),

    #[error("timed out waiting for player '{0}'")]
    Timeout(PlayerId),

    #[error("remote call failed: {0}")]
    Failed(String),
}

/// Errors that abort a battle action.
#[derive(Debug, thiserror::Error)]
pub enum CombatError {
    #[error("execution stack popped while empty")]
    EmptyStack,

    #[error("unknown firing group {0:?}")]
    UnknownGroup(GroupId),

    #[error("firing group {group:?} is in phase {found:?}, expected {expected:?}")]
    PhaseMismatch {
        group: GroupId,
        expected: GroupPhase,
        found: GroupPhase,
    },

    #[error("{casualties} casualties selected from {targets} valid targets")]
    CasualtyOverflow { casualties: usize, targets: usize },

    #[error("casualty {0:?} is not among the valid targets")]
    CasualtyNotTargeted(UnitId),

    #[error("unknown unit {0:?}")]
    UnknownUnit(UnitId),

    #[error("unknown unit type '{0}'")]
    UnknownUnitType(String),

    #[error("unknown territory '{0}'")]
    UnknownTerritory(String),

    #[error("remote acknowledgement failed: {0}")]
    Remote(#[from] RemoteError),

    #[error("wait for remote acknowledgement was interrupted")]
    Interrupted,
}

/// Errors loading engine configuration or scenario files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
