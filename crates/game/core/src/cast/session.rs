use std::fmt;
use std::sync::Arc;

use crate::condition::Deduction;
use crate::skill::{SkillDefinition, SkillId, SkillLevel};
use crate::state::{EntityId, Position, Tick};
use crate::timer::TimerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cast:{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastState {
    #[default]
    Idle,
    Casting,
    Completed,
    Cancelled,
}

impl CastState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CastState::Completed | CastState::Cancelled)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_become(self, next: CastState) -> bool {
        matches!(
            (self, next),
            (CastState::Idle, CastState::Casting)
                | (CastState::Casting, CastState::Completed)
                | (CastState::Casting, CastState::Cancelled)
        )
    }
}

/// What a session is aimed at. Entities are held by id and looked up again
/// when the cast completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastTarget {
    Caster,
    Entity(EntityId),
    Ground(Position),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CancelReason {
    Manual,
    DamageTaken,
    ForcedMovement,
    Disconnected,
    CasterDied,
    Shutdown,
}

/// One use of a skill, from request to resolution.
#[derive(Clone, Debug)]
pub struct CastSession {
    pub id: SessionId,
    pub caster: EntityId,
    pub target: CastTarget,
    pub skill: SkillId,
    pub level: SkillLevel,
    /// Registry snapshot the session started with.
    pub definition: Arc<SkillDefinition>,
    pub state: CastState,
    pub started_at: Tick,
    pub completes_at: Tick,
    pub timer: Option<TimerId>,
    /// Resources already taken. Empty for ground casts until placement.
    pub paid: Deduction,
    pub interruptible: bool,
    pub in_combo: bool,
    pub cancel_reason: Option<CancelReason>,
}

impl CastSession {
    pub fn new(
        id: SessionId,
        caster: EntityId,
        target: CastTarget,
        definition: Arc<SkillDefinition>,
        level: SkillLevel,
        now: Tick,
    ) -> Self {
        Self {
            id,
            caster,
            target,
            skill: definition.id,
            level,
            interruptible: definition.is_interruptible(),
            definition,
            state: CastState::Idle,
            started_at: now,
            completes_at: now,
            timer: None,
            paid: Deduction::default(),
            in_combo: false,
            cancel_reason: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == CastState::Casting
    }

    /// `Idle -> Casting`.
    pub fn start(&mut self, completes_at: Tick) -> bool {
        if !self.advance(CastState::Casting) {
            return false;
        }
        self.completes_at = completes_at;
        true
    }

    /// `Casting -> Completed`.
    pub fn complete(&mut self) -> bool {
        self.advance(CastState::Completed)
    }

    /// Moves to `Cancelled`. A session that already finished is left alone.
    pub fn cancel(&mut self, reason: CancelReason) -> bool {
        if !self.advance(CastState::Cancelled) {
            return false;
        }
        self.cancel_reason = Some(reason);
        true
    }

    fn advance(&mut self, next: CastState) -> bool {
        if !self.state.can_become(next) {
            return false;
        }
        self.state = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::{CastKind, SkillFlags};

    fn session() -> CastSession {
        let definition = SkillDefinition::new(SkillId(19), "Fire Bolt", CastKind::Targeted)
            .with_flags(SkillFlags::INTERRUPTIBLE);
        CastSession::new(
            SessionId(1),
            EntityId(1),
            CastTarget::Entity(EntityId(2)),
            Arc::new(definition),
            3,
            Tick(100),
        )
    }

    #[test]
    fn happy_path() {
        let mut session = session();
        assert!(session.interruptible);
        assert!(session.start(Tick(900)));
        assert!(session.is_active());
        assert!(session.complete());
        assert_eq!(session.state, CastState::Completed);
    }

    #[test]
    fn terminal_states_absorb_cancel() {
        let mut session = session();
        session.start(Tick(900));
        session.complete();
        assert!(!session.cancel(CancelReason::Manual));
        assert_eq!(session.state, CastState::Completed);
        assert_eq!(session.cancel_reason, None);

        let mut session = self::session();
        session.start(Tick(900));
        assert!(session.cancel(CancelReason::DamageTaken));
        assert!(!session.cancel(CancelReason::Manual));
        assert!(!session.complete());
        assert_eq!(session.cancel_reason, Some(CancelReason::DamageTaken));
    }

    #[test]
    fn cannot_skip_casting() {
        let mut session = session();
        assert!(!session.complete());
        assert!(!session.cancel(CancelReason::Manual));
        assert_eq!(session.state, CastState::Idle);
        assert!(!CastState::Idle.can_become(CastState::Cancelled));
        assert!(!CastState::Completed.can_become(CastState::Casting));
        assert!(!CastState::Cancelled.can_become(CastState::Idle));
    }
}
