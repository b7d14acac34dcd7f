use crate::error::{ErrorSeverity, GameError};
use crate::skill::{SkillId, SkillLevel};
use crate::state::{EntityId, ItemId, Position, StatusKind, Tick, WeaponClass};

/// Why a caster may not use a skill right now.
///
/// Returned before anything is mutated: a failed check never costs the caster
/// anything.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConditionError {
    #[error("unknown skill {0}")]
    UnknownSkill(SkillId),

    #[error("skill {skill} has no level {level} (max {max})")]
    InvalidLevel {
        skill: SkillId,
        level: SkillLevel,
        max: SkillLevel,
    },

    #[error("caster {0} not found")]
    CasterNotFound(EntityId),

    #[error("caster is dead")]
    CasterDead,

    #[error("caster is already casting")]
    AlreadyCasting,

    #[error("caster cannot act until {until}")]
    ActionDelay { until: Tick },

    #[error("{skill} is on cooldown until {until}")]
    OnCooldown { skill: SkillId, until: Tick },

    #[error("status {0} forbids this action")]
    StatusForbids(StatusKind),

    #[error("requires status {0}")]
    MissingStatus(StatusKind),

    #[error("usable only as a follow-up to {0}")]
    ComboRequired(SkillId),

    #[error("cannot be used with a {0}")]
    WrongWeapon(WeaponClass),

    #[error("not enough HP: need more than {need}, have {have}")]
    InsufficientHp { need: u32, have: u32 },

    #[error("not enough SP: need {need}, have {have}")]
    InsufficientSp { need: u32, have: u32 },

    #[error("missing item {item:?}: need {need}, have {have}")]
    MissingItem { item: ItemId, need: u32, have: u32 },

    #[error("not enough zeny: need {need}, have {have}")]
    InsufficientZeny { need: u64, have: u64 },

    #[error("not enough charges: need {need}, have {have}")]
    InsufficientCharges { need: u8, have: u8 },

    #[error("target is {distance} cells away, range is {range}")]
    OutOfRange { distance: u32, range: u32 },

    #[error("target {0} not found")]
    TargetNotFound(EntityId),

    #[error("target {0} is dead")]
    TargetDead(EntityId),

    #[error("skill cannot target {0}")]
    InvalidTarget(EntityId),

    #[error("skill must be aimed differently")]
    WrongTargetKind,

    #[error("skills are restricted at {0}")]
    ZoneRestricted(Position),

    #[error("terrain at {0} does not allow this skill")]
    TerrainRestricted(Position),
}

impl GameError for ConditionError {
    fn severity(&self) -> ErrorSeverity {
        use ConditionError::*;
        match self {
            UnknownSkill(_) | InvalidLevel { .. } | CasterNotFound(_) | WrongTargetKind
            | InvalidTarget(_) => ErrorSeverity::Validation,
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        use ConditionError::*;
        match self {
            UnknownSkill(_) => "CONDITION_UNKNOWN_SKILL",
            InvalidLevel { .. } => "CONDITION_INVALID_LEVEL",
            CasterNotFound(_) => "CONDITION_CASTER_NOT_FOUND",
            CasterDead => "CONDITION_CASTER_DEAD",
            AlreadyCasting => "CONDITION_ALREADY_CASTING",
            ActionDelay { .. } => "CONDITION_ACTION_DELAY",
            OnCooldown { .. } => "CONDITION_ON_COOLDOWN",
            StatusForbids(_) => "CONDITION_STATUS_FORBIDS",
            MissingStatus(_) => "CONDITION_MISSING_STATUS",
            ComboRequired(_) => "CONDITION_COMBO_REQUIRED",
            WrongWeapon(_) => "CONDITION_WRONG_WEAPON",
            InsufficientHp { .. } => "CONDITION_INSUFFICIENT_HP",
            InsufficientSp { .. } => "CONDITION_INSUFFICIENT_SP",
            MissingItem { .. } => "CONDITION_MISSING_ITEM",
            InsufficientZeny { .. } => "CONDITION_INSUFFICIENT_ZENY",
            InsufficientCharges { .. } => "CONDITION_INSUFFICIENT_CHARGES",
            OutOfRange { .. } => "CONDITION_OUT_OF_RANGE",
            TargetNotFound(_) => "CONDITION_TARGET_NOT_FOUND",
            TargetDead(_) => "CONDITION_TARGET_DEAD",
            InvalidTarget(_) => "CONDITION_INVALID_TARGET",
            WrongTargetKind => "CONDITION_WRONG_TARGET_KIND",
            ZoneRestricted(_) => "CONDITION_ZONE_RESTRICTED",
            TerrainRestricted(_) => "CONDITION_TERRAIN_RESTRICTED",
        }
    }
}
