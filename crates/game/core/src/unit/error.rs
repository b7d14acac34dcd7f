use crate::error::{ErrorSeverity, GameError};
use crate::skill::SkillId;
use crate::state::Position;

/// Why a ground footprint could not be placed. Nothing was created.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlacementError {
    #[error("{0} has no footprint")]
    NotAGroundSkill(SkillId),

    #[error("ground skills are restricted at {0}")]
    ZoneRestricted(Position),

    #[error("cell {0} is blocked")]
    BlockedCell(Position),

    #[error("cell {0} is occupied")]
    Occupied(Position),

    #[error("cell {0} already holds this skill")]
    Overlap(Position),

    #[error("{skill} already has {cap} active footprints")]
    InstanceCap { skill: SkillId, cap: usize },

    #[error("no legal cell for the footprint")]
    NoLegalCell,
}

impl GameError for PlacementError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            PlacementError::NotAGroundSkill(_) => ErrorSeverity::Validation,
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            PlacementError::NotAGroundSkill(_) => "PLACEMENT_NOT_A_GROUND_SKILL",
            PlacementError::ZoneRestricted(_) => "PLACEMENT_ZONE_RESTRICTED",
            PlacementError::BlockedCell(_) => "PLACEMENT_BLOCKED_CELL",
            PlacementError::Occupied(_) => "PLACEMENT_OCCUPIED",
            PlacementError::Overlap(_) => "PLACEMENT_OVERLAP",
            PlacementError::InstanceCap { .. } => "PLACEMENT_INSTANCE_CAP",
            PlacementError::NoLegalCell => "PLACEMENT_NO_LEGAL_CELL",
        }
    }
}
