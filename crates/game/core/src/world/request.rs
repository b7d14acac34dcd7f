use crate::cast::{CastTarget, SessionId};
use crate::condition::Deduction;
use crate::skill::{SkillId, SkillLevel};
use crate::state::{EntityId, Position, StatusKind, Tick};

/// A request to use a skill, from a player or from monster AI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastRequest {
    pub caster: EntityId,
    pub skill: SkillId,
    pub level: SkillLevel,
    pub target: CastTarget,
}

impl CastRequest {
    pub fn on_target(caster: EntityId, skill: SkillId, level: SkillLevel, target: EntityId) -> Self {
        Self {
            caster,
            skill,
            level,
            target: CastTarget::Entity(target),
        }
    }

    pub fn on_ground(caster: EntityId, skill: SkillId, level: SkillLevel, position: Position) -> Self {
        Self {
            caster,
            skill,
            level,
            target: CastTarget::Ground(position),
        }
    }

    pub fn on_self(caster: EntityId, skill: SkillId, level: SkillLevel) -> Self {
        Self {
            caster,
            skill,
            level,
            target: CastTarget::Caster,
        }
    }
}

/// Returned when a cast was accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastTicket {
    pub session: SessionId,
    pub completes_at: Tick,
    /// Resources taken at cast start (empty for ground skills).
    pub paid: Deduction,
    /// The cast had no cast time and already resolved.
    pub resolved: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveKind {
    /// Voluntary movement; refused while casting or rooted.
    Walk,
    /// Knockback, teleport, scripted displacement. Always cancels the cast.
    Forced,
}

/// Why an actor cannot act right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionBlock {
    Missing,
    Dead,
    Casting { completes_at: Tick },
    Delayed { until: Tick },
    Status(StatusKind),
}
