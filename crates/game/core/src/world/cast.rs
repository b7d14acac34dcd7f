//! Cast requests, cancellation and completion.

use std::sync::Arc;

use super::{CastRequest, CastTicket, ExhaustionError, SkillError, World};
use crate::cast::{CancelReason, CastOutcome, CastSession, CastTarget, SessionId, cast_time, post_cast_delay};
use crate::condition::{CheckPhase, CheckTarget, ConditionChecker, ConditionError, ConditionRequest, TargetView};
use crate::error::GameError;
use crate::events::{GroupRemoval, SkillEvent};
use crate::skill::{CostTiming, EffectSubject, HookContext, SideEffect, SkillId, SkillLevel};
use crate::state::{Direction, EntityId, Position, StatusEffect, StatusKind, StatusSource};
use crate::timer::{TimerOwner, TimerTask};

impl World {
    // ========================================================================
    // Requests
    // ========================================================================

    /// Starts a cast.
    ///
    /// Every requirement is checked before anything is deducted. A skill whose
    /// cost is taken at cast start pays here; ground skills pay when their
    /// footprint is placed. A cast with no cast time resolves before this
    /// returns.
    pub fn cast(&mut self, request: CastRequest) -> Result<CastTicket, SkillError> {
        self.ensure_running()?;
        let result = self.begin_cast(request);
        if let Err(error) = &result {
            tracing::debug!(
                target: "skill::cast",
                caster = %request.caster,
                skill = %request.skill,
                code = error.error_code(),
                "cast rejected"
            );
        }
        self.settle();
        result
    }

    pub fn use_skill_on_target(
        &mut self,
        caster: EntityId,
        skill: SkillId,
        level: SkillLevel,
        target: EntityId,
    ) -> Result<CastTicket, SkillError> {
        self.cast(CastRequest::on_target(caster, skill, level, target))
    }

    pub fn use_skill_on_ground(
        &mut self,
        caster: EntityId,
        skill: SkillId,
        level: SkillLevel,
        position: Position,
    ) -> Result<CastTicket, SkillError> {
        self.cast(CastRequest::on_ground(caster, skill, level, position))
    }

    pub fn use_skill_on_self(
        &mut self,
        caster: EntityId,
        skill: SkillId,
        level: SkillLevel,
    ) -> Result<CastTicket, SkillError> {
        self.cast(CastRequest::on_self(caster, skill, level))
    }

    /// Cancels the caster's cast. A manual cancel also ends the caster's
    /// channelled footprints. Returns whether anything was cancelled.
    pub fn cancel_cast(&mut self, caster: EntityId, reason: CancelReason) -> Result<bool, SkillError> {
        self.ensure_running()?;
        if !self.entities.contains(caster) {
            return Err(SkillError::ActorNotFound(caster));
        }
        let mut cancelled = self.cancel_session(caster, reason);
        if reason == CancelReason::Manual {
            cancelled |= self.end_channels(caster);
        }
        self.settle();
        Ok(cancelled)
    }

    fn begin_cast(&mut self, request: CastRequest) -> Result<CastTicket, SkillError> {
        let now = self.clock;
        let definition = self
            .registry
            .get(request.skill)
            .ok_or(ConditionError::UnknownSkill(request.skill))?;
        let caster = self
            .entities
            .get(request.caster)
            .ok_or(ConditionError::CasterNotFound(request.caster))?;

        if self.sessions.get(request.caster).is_some() {
            return Err(ConditionError::AlreadyCasting.into());
        }
        if self.sessions.is_full() {
            return Err(ExhaustionError::TooManySessions {
                limit: self.config.max_cast_sessions,
            }
            .into());
        }

        let (target, aim) = match request.target {
            CastTarget::Caster => (CheckTarget::Caster, caster.position),
            CastTarget::Ground(position) => (CheckTarget::Ground(position), position),
            CastTarget::Entity(id) => {
                let target = self
                    .entities
                    .get(id)
                    .ok_or(ConditionError::TargetNotFound(id))?;
                (CheckTarget::Actor(TargetView::of(caster, target)), target.position)
            }
        };
        let facing = Direction::between(caster.position, aim).unwrap_or(caster.facing);

        let condition = ConditionRequest {
            definition: &definition,
            level: request.level,
            target,
            phase: CheckPhase::CastStart,
            now,
            map: self.env.map(),
        };
        let commit = definition.cost_timing() == CostTiming::AtCastStart;
        let caster = self
            .entities
            .get_mut(request.caster)
            .ok_or(ConditionError::CasterNotFound(request.caster))?;
        let paid = ConditionChecker.check_and_commit(caster, &condition, commit)?;

        caster.facing = facing;
        let cast_ms = cast_time(&definition, request.level, caster, &self.config, now, paid.combo);
        caster.statuses.remove(StatusKind::InstantCast);
        let completes_at = now + cast_ms;

        let session = self.sessions.open(
            request.caster,
            request.target,
            Arc::clone(&definition),
            request.level,
            now,
        )?;
        session.paid = paid.clone();
        session.in_combo = paid.combo;
        session.start(completes_at);
        let session_id = session.id;

        self.diagnostics.casts_started += 1;
        self.emit(SkillEvent::CastStarted {
            session: session_id,
            caster: request.caster,
            skill: request.skill,
            level: request.level,
            target: request.target,
            completes_at,
        });
        tracing::debug!(
            target: "skill::cast",
            session = %session_id,
            caster = %request.caster,
            skill = %request.skill,
            level = request.level,
            cast_ms,
            "cast started"
        );

        let resolved = if cast_ms == 0 {
            self.complete_session(request.caster, session_id)
        } else {
            let timer = self.timers.schedule(
                TimerOwner::Entity(request.caster),
                completes_at,
                TimerTask::CastComplete {
                    caster: request.caster,
                    session: session_id,
                },
            );
            if let Some(session) = self.sessions.get_mut(request.caster) {
                session.timer = Some(timer);
            }
            false
        };

        Ok(CastTicket {
            session: session_id,
            completes_at,
            paid,
            resolved,
        })
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Cancels an active session and its completion timer.
    pub(super) fn cancel_session(&mut self, caster: EntityId, reason: CancelReason) -> bool {
        let Some(session) = self.sessions.get_mut(caster) else {
            return false;
        };
        if !session.cancel(reason) {
            return false;
        }
        let (id, skill, timer) = (session.id, session.skill, session.timer);
        self.sessions.remove(caster);
        if let Some(timer) = timer {
            self.timers.cancel(timer);
        }

        self.diagnostics.casts_cancelled += 1;
        self.emit(SkillEvent::CastCancelled {
            session: id,
            caster,
            skill,
            reason,
        });
        tracing::debug!(
            target: "skill::cast",
            session = %id,
            caster = %caster,
            skill = %skill,
            %reason,
            "cast cancelled"
        );
        true
    }

    /// Damage taken while casting cancels an interruptible cast.
    pub(super) fn interrupt(&mut self, target: EntityId) {
        let interruptible = self
            .sessions
            .get(target)
            .is_some_and(|session| session.is_active() && session.interruptible);
        if interruptible {
            self.cancel_session(target, CancelReason::DamageTaken);
        }
    }

    /// Runs a session whose cast time elapsed. Returns `false` when the
    /// session is no longer the caster's current one.
    pub(super) fn complete_session(&mut self, caster: EntityId, id: SessionId) -> bool {
        let completed = self
            .sessions
            .get_mut(caster)
            .filter(|session| session.id == id)
            .is_some_and(CastSession::complete);
        if !completed {
            self.diagnostics.timers_absorbed += 1;
            tracing::debug!(target: "skill::cast", session = %id, caster = %caster, "stale completion absorbed");
            return false;
        }
        let Some(session) = self.sessions.close(caster, id) else {
            return false;
        };

        self.diagnostics.casts_completed += 1;
        self.emit(SkillEvent::CastCompleted {
            session: id,
            caster,
            skill: session.skill,
            level: session.level,
        });

        let outcome = self.resolve_session(&session);
        self.finish_cast(&session, outcome);
        true
    }

    /// Cast-end hooks, cooldown and post-cast delay.
    fn finish_cast(&mut self, session: &CastSession, outcome: CastOutcome) {
        let now = self.clock;
        let definition = Arc::clone(&session.definition);

        if outcome == CastOutcome::Resolved {
            let effects = match self.entities.get(session.caster) {
                Some(caster) => {
                    let target = self.session_target_id(session).and_then(|id| self.entities.get(id));
                    self.behaviors.get(definition.id).on_cast_end(&HookContext {
                        definition: &definition,
                        level: session.level,
                        caster,
                        target,
                        now,
                        in_combo: session.in_combo,
                    })
                }
                None => Vec::new(),
            };
            let target = self.session_target_id(session);
            self.apply_side_effects(definition.id, session.caster, target, effects);
        }

        let Some(caster) = self.entities.get_mut(session.caster) else {
            return;
        };
        let cooldown = definition.cooldown.get(session.level);
        if cooldown > 0 {
            caster.cooldowns.insert(definition.id, now + cooldown);
        }
        let delay = post_cast_delay(
            &definition,
            session.level,
            caster,
            &self.config,
            now,
            session.in_combo,
            outcome,
        );
        caster.can_act_at = caster.can_act_at.max(now + delay);
        tracing::trace!(
            target: "skill::cast",
            caster = %session.caster,
            skill = %definition.id,
            ?outcome,
            delay,
            "cast finished"
        );
    }

    fn session_target_id(&self, session: &CastSession) -> Option<EntityId> {
        match session.target {
            CastTarget::Entity(id) => Some(id),
            CastTarget::Caster => Some(session.caster),
            CastTarget::Ground(_) => None,
        }
    }

    /// Ends every channelled footprint `owner` keeps alive.
    fn end_channels(&mut self, owner: EntityId) -> bool {
        let mut ended = false;
        for handle in self.groups.owned_by(owner) {
            let Some(kind) = self
                .groups
                .get(handle)
                .filter(|group| !group.is_invalidated())
                .and_then(|group| group.linked_status)
            else {
                continue;
            };
            self.remove_status_from(owner, kind, StatusSource::Group(handle));
            self.remove_group(handle, GroupRemoval::ChannelEnded);
            ended = true;
        }
        ended
    }

    // ========================================================================
    // Side effects
    // ========================================================================

    /// Applies hook output. Missing subjects are skipped.
    pub(super) fn apply_side_effects(
        &mut self,
        skill: SkillId,
        caster: EntityId,
        target: Option<EntityId>,
        effects: Vec<SideEffect>,
    ) {
        let now = self.clock;
        let subject = |on: EffectSubject| match on {
            EffectSubject::Caster => Some(caster),
            EffectSubject::Target => target,
        };

        for effect in effects {
            match effect {
                SideEffect::ApplyStatus {
                    on,
                    kind,
                    duration_ms,
                    value,
                } => {
                    if let Some(id) = subject(on) {
                        let effect = StatusEffect::new(kind, now + duration_ms)
                            .with_value(value)
                            .with_source(StatusSource::Actor(caster));
                        self.add_status(id, effect);
                    }
                }
                SideEffect::RemoveStatus { on, kind } => {
                    if let Some(id) = subject(on)
                        && let Some(actor) = self.entities.get_mut(id)
                        && actor.statuses.remove(kind).is_some()
                    {
                        self.emit(SkillEvent::StatusEnded { target: id, kind });
                    }
                }
                SideEffect::RestoreHp { on, amount } => {
                    if let Some(id) = subject(on)
                        && let Some(actor) = self.entities.get_mut(id)
                        && actor.is_alive()
                    {
                        let amount = actor.hp.restore(amount);
                        self.emit(SkillEvent::Healed {
                            source: caster,
                            target: id,
                            skill,
                            amount,
                        });
                    }
                }
                SideEffect::DrainSp { on, amount } => {
                    if let Some(id) = subject(on)
                        && let Some(actor) = self.entities.get_mut(id)
                    {
                        actor.sp.drain(amount.unwrap_or(u32::MAX));
                    }
                }
                SideEffect::ConsumeCharges { amount } => {
                    if let Some(actor) = self.entities.get_mut(caster) {
                        actor.charges = actor.charges.saturating_sub(amount);
                    }
                }
            }
        }
    }
}
