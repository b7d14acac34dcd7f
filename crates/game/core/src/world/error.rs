use crate::condition::ConditionError;
use crate::error::{ErrorSeverity, GameError};
use crate::state::EntityId;
use crate::unit::PlacementError;

/// A capacity limit refused a new session or group. Existing state is intact.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExhaustionError {
    #[error("too many concurrent casts (limit {limit})")]
    TooManySessions { limit: usize },

    #[error("too many ground footprints (limit {limit})")]
    TooManyGroups { limit: usize },

    #[error("every footprint id below {bound} is in use")]
    GroupIdsExhausted { bound: u32 },
}

impl GameError for ExhaustionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::TooManySessions { .. } => "EXHAUSTED_SESSIONS",
            Self::TooManyGroups { .. } => "EXHAUSTED_GROUPS",
            Self::GroupIdsExhausted { .. } => "EXHAUSTED_GROUP_IDS",
        }
    }
}

/// Everything a world operation can report to its caller.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkillError {
    #[error(transparent)]
    Validation(#[from] ConditionError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Exhausted(#[from] ExhaustionError),

    #[error("actor {0} not found")]
    ActorNotFound(EntityId),

    #[error("actor {0} already exists")]
    ActorExists(EntityId),

    #[error("world is not running")]
    NotRunning,
}

impl GameError for SkillError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Validation(err) => err.severity(),
            Self::Placement(err) => err.severity(),
            Self::Exhausted(err) => err.severity(),
            Self::ActorNotFound(_) | Self::ActorExists(_) => ErrorSeverity::Validation,
            Self::NotRunning => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.error_code(),
            Self::Placement(err) => err.error_code(),
            Self::Exhausted(err) => err.error_code(),
            Self::ActorNotFound(_) => "WORLD_ACTOR_NOT_FOUND",
            Self::ActorExists(_) => "WORLD_ACTOR_EXISTS",
            Self::NotRunning => "WORLD_NOT_RUNNING",
        }
    }
}
