//! Events the world emits for presentation, scripting and logging.
//!
//! The world appends to an outbox while it works; callers drain it after each
//! operation with [`World::drain_events`](crate::world::World::drain_events).

use crate::cast::{CancelReason, CastTarget, SessionId};
use crate::combat::Knockback;
use crate::skill::{SkillId, SkillLevel};
use crate::state::{EntityId, Position, StatusKind, Tick};
use crate::unit::GroupHandle;
use crate::world::SkillError;

/// Why a footprint went away.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupRemoval {
    /// Lifetime ran out.
    Expired,
    /// Every cell died.
    Emptied,
    /// Swept by a cleanse effect.
    Cleansed,
    /// The owner left the world or died.
    OwnerGone,
    /// The linked channel status ended.
    ChannelEnded,
    Shutdown,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkillEvent {
    // ===== cast =====
    CastStarted {
        session: SessionId,
        caster: EntityId,
        skill: SkillId,
        level: SkillLevel,
        target: CastTarget,
        completes_at: Tick,
    },
    CastCompleted {
        session: SessionId,
        caster: EntityId,
        skill: SkillId,
        level: SkillLevel,
    },
    CastCancelled {
        session: SessionId,
        caster: EntityId,
        skill: SkillId,
        reason: CancelReason,
    },
    /// The cast finished but its effect could not be applied.
    CastFailed {
        caster: EntityId,
        skill: SkillId,
        error: SkillError,
    },

    // ===== combat =====
    Damage {
        source: EntityId,
        target: EntityId,
        skill: SkillId,
        amount: u32,
        hits: u8,
        missed: bool,
        group: Option<GroupHandle>,
    },
    Healed {
        source: EntityId,
        target: EntityId,
        skill: SkillId,
        amount: u32,
    },
    StatusApplied {
        target: EntityId,
        kind: StatusKind,
        expires_at: Tick,
    },
    StatusEnded {
        target: EntityId,
        kind: StatusKind,
    },
    KnockedBack {
        target: EntityId,
        knockback: Knockback,
    },
    ActorDied {
        entity: EntityId,
        killer: Option<EntityId>,
    },

    // ===== unit =====
    GroupCreated {
        group: GroupHandle,
        owner: EntityId,
        skill: SkillId,
        cells: usize,
    },
    GroupRemoved {
        group: GroupHandle,
        skill: SkillId,
        reason: GroupRemoval,
    },
    CellEntered {
        group: GroupHandle,
        entity: EntityId,
        position: Position,
    },
    CellLeft {
        group: GroupHandle,
        entity: EntityId,
        position: Position,
    },
    /// The entity is no longer inside the footprint, whether it walked out,
    /// died or left the world.
    GroupLeft {
        group: GroupHandle,
        entity: EntityId,
    },
    /// A cell ran out early (sprung trap, exhausted hit budget, annihilation).
    CellSpent {
        group: GroupHandle,
        cell: u16,
        expires_at: Tick,
    },
}

impl SkillEvent {
    pub fn label(&self) -> &'static str {
        match self {
            SkillEvent::CastStarted { .. } => "cast_started",
            SkillEvent::CastCompleted { .. } => "cast_completed",
            SkillEvent::CastCancelled { .. } => "cast_cancelled",
            SkillEvent::CastFailed { .. } => "cast_failed",
            SkillEvent::Damage { .. } => "damage",
            SkillEvent::Healed { .. } => "healed",
            SkillEvent::StatusApplied { .. } => "status_applied",
            SkillEvent::StatusEnded { .. } => "status_ended",
            SkillEvent::KnockedBack { .. } => "knocked_back",
            SkillEvent::ActorDied { .. } => "actor_died",
            SkillEvent::GroupCreated { .. } => "group_created",
            SkillEvent::GroupRemoved { .. } => "group_removed",
            SkillEvent::CellEntered { .. } => "cell_entered",
            SkillEvent::CellLeft { .. } => "cell_left",
            SkillEvent::GroupLeft { .. } => "group_left",
            SkillEvent::CellSpent { .. } => "cell_spent",
        }
    }

    pub fn is_cast(&self) -> bool {
        matches!(
            self,
            SkillEvent::CastStarted { .. }
                | SkillEvent::CastCompleted { .. }
                | SkillEvent::CastCancelled { .. }
                | SkillEvent::CastFailed { .. }
        )
    }

    pub fn is_unit(&self) -> bool {
        matches!(
            self,
            SkillEvent::GroupCreated { .. }
                | SkillEvent::GroupRemoved { .. }
                | SkillEvent::CellEntered { .. }
                | SkillEvent::CellLeft { .. }
                | SkillEvent::GroupLeft { .. }
                | SkillEvent::CellSpent { .. }
        )
    }
}
