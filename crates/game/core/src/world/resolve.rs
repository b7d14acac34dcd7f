//! Effect resolution: damage, healing, statuses, knockback and death.
//!
//! A hit is computed against snapshots of both actors taken before anything
//! changes, then applied in a fixed order: health, status rolls, knockback,
//! per-skill extras. Interrupts and deaths caused along the way run
//! immediately; footprints they invalidate are reaped when the calling
//! operation settles.

use std::sync::Arc;

use super::{SkillError, World};
use crate::cast::{CancelReason, CastOutcome, CastSession, CastTarget};
use crate::combat::{self, DamageInput, DamageKind, Knockback, knockback_heading, slide};
use crate::condition::ConditionError;
use crate::env::{RollContext, compute_seed};
use crate::events::{GroupRemoval, SkillEvent};
use crate::skill::{CastKind, HitSummary, HookContext, SkillDefinition, SkillLevel, TargetMask};
use crate::state::{EntityId, Position, StatusEffect, StatusKind, StatusSource};
use crate::timer::{TimerOwner, TimerTask};
use crate::unit::GroupHandle;

/// One hit about to be applied.
#[derive(Clone, Debug)]
pub(super) struct Hit {
    pub caster: EntityId,
    pub target: EntityId,
    pub definition: Arc<SkillDefinition>,
    pub level: SkillLevel,
    /// Zero for the first hit, then the follow-up number.
    pub index: u8,
    pub in_combo: bool,
    /// Where the hit comes from; knockback pushes away from here.
    pub origin: Position,
    pub group: Option<GroupHandle>,
}

impl World {
    /// Resolves a completed cast.
    pub(super) fn resolve_session(&mut self, session: &CastSession) -> CastOutcome {
        let caster_alive = self
            .entities
            .get(session.caster)
            .is_some_and(|caster| caster.is_alive());
        if !caster_alive {
            return self.fail_cast(session, ConditionError::CasterDead.into());
        }

        match session.definition.cast_kind {
            CastKind::Ground => self.resolve_ground(session),
            CastKind::SelfCast if session.definition.unit.is_some() => self.resolve_ground(session),
            CastKind::SelfCast => self.resolve_targeted(session, session.caster),
            CastKind::Targeted => {
                let target = match session.target {
                    CastTarget::Entity(id) => id,
                    CastTarget::Caster => session.caster,
                    CastTarget::Ground(_) => {
                        return self.fail_cast(session, ConditionError::WrongTargetKind.into());
                    }
                };
                match self.entities.get(target) {
                    None => self.fail_cast(session, ConditionError::TargetNotFound(target).into()),
                    Some(actor) if !actor.is_alive() => {
                        self.fail_cast(session, ConditionError::TargetDead(target).into())
                    }
                    Some(_) => self.resolve_targeted(session, target),
                }
            }
        }
    }

    pub(super) fn fail_cast(&mut self, session: &CastSession, error: SkillError) -> CastOutcome {
        tracing::debug!(
            target: "skill::resolve",
            session = %session.id,
            caster = %session.caster,
            skill = %session.skill,
            %error,
            "cast failed at resolution"
        );
        self.emit(SkillEvent::CastFailed {
            caster: session.caster,
            skill: session.skill,
            error,
        });
        CastOutcome::Failed
    }

    fn resolve_targeted(&mut self, session: &CastSession, primary: EntityId) -> CastOutcome {
        let definition = Arc::clone(&session.definition);
        let level = session.level;
        let (Some(caster), Some(center)) = (
            self.entities.get(session.caster).map(|caster| caster.position),
            self.entities.get(primary).map(|target| target.position),
        ) else {
            return self.fail_cast(session, ConditionError::TargetNotFound(primary).into());
        };

        let area = definition.damage.as_ref().map_or(0, |damage| damage.area.get(level));
        let targets = if area > 0 {
            self.splash_targets(session.caster, center, u32::from(area), definition.target)
        } else {
            vec![primary]
        };

        for target in targets {
            self.apply_hit(Hit {
                caster: session.caster,
                target,
                definition: Arc::clone(&definition),
                level,
                index: 0,
                in_combo: session.in_combo,
                origin: caster,
                group: None,
            });
        }

        let follow_ups = definition.follow_up_hits.get(level);
        for index in 1..=follow_ups {
            let due = self.clock + self.config.follow_up_interval_ms * u64::from(index);
            self.timers.schedule(
                TimerOwner::Entity(session.caster),
                due,
                TimerTask::FollowUpHit {
                    caster: session.caster,
                    target: primary,
                    definition: Arc::clone(&definition),
                    level,
                    hit: index,
                },
            );
        }
        CastOutcome::Resolved
    }

    /// A scheduled extra hit. The target is re-checked: one that died or
    /// left in the meantime absorbs the hit silently.
    pub(super) fn run_follow_up(
        &mut self,
        caster: EntityId,
        target: EntityId,
        definition: Arc<SkillDefinition>,
        level: SkillLevel,
        index: u8,
    ) {
        let origin = self
            .entities
            .get(caster)
            .filter(|actor| actor.is_alive())
            .map(|actor| actor.position);
        let target_alive = self.entities.get(target).is_some_and(|actor| actor.is_alive());
        let Some(origin) = origin.filter(|_| target_alive) else {
            self.diagnostics.timers_absorbed += 1;
            tracing::debug!(
                target: "skill::resolve",
                caster = %caster,
                target_id = %target,
                skill = %definition.id,
                hit = index,
                "follow-up hit absorbed"
            );
            return;
        };
        self.apply_hit(Hit {
            caster,
            target,
            definition,
            level,
            index,
            in_combo: false,
            origin,
            group: None,
        });
    }

    fn splash_targets(&self, caster: EntityId, center: Position, radius: u32, mask: TargetMask) -> Vec<EntityId> {
        let Some(caster) = self.entities.get(caster) else {
            return Vec::new();
        };
        self.entities
            .alive_within(center, radius)
            .into_iter()
            .filter(|id| {
                self.entities
                    .get(*id)
                    .is_some_and(|target| mask.allows(caster.relation_to(target)))
            })
            .collect()
    }

    // ========================================================================
    // Hit pipeline
    // ========================================================================

    /// Applies one hit. Returns `None` if either side is gone.
    pub(super) fn apply_hit(&mut self, hit: Hit) -> Option<HitSummary> {
        let now = self.clock;
        let caster = self.entities.get(hit.caster)?.clone();
        let target = self.entities.get(hit.target).filter(|actor| actor.is_alive())?.clone();
        let definition = Arc::clone(&hit.definition);
        let behavior = self.behaviors.get(definition.id);
        let ctx = HookContext {
            definition: &definition,
            level: hit.level,
            caster: &caster,
            target: Some(&target),
            now,
            in_combo: hit.in_combo,
        };

        self.nonce += 1;
        let nonce = self.nonce;
        let seed = self.config.world_seed;
        let mut summary = HitSummary::default();

        if let Some(spec) = &definition.damage {
            let ratio = behavior.compute_damage_ratio(&ctx, spec.ratio.get(hit.level));
            let breakdown = combat::calculate(&DamageInput {
                kind: spec.kind,
                ratio,
                hits: spec.hits.get(hit.level),
                element: spec.element,
                flat: spec.flat.get(hit.level),
                attacker: &caster,
                defender: &target,
                now,
            });
            summary.hits = breakdown.hits;

            if spec.kind == DamageKind::Physical {
                let roll = self
                    .env
                    .rng()
                    .roll_d100(compute_seed(seed, nonce, target.id.0, RollContext::Hit as u32));
                summary.missed = !combat::check_hit(caster.stats.hit, target.stats.flee, roll);
            }

            if spec.kind == DamageKind::Heal {
                if let Some(actor) = self.entities.get_mut(hit.target) {
                    let amount = actor.hp.restore(breakdown.total);
                    self.emit(SkillEvent::Healed {
                        source: hit.caster,
                        target: hit.target,
                        skill: definition.id,
                        amount,
                    });
                }
            } else {
                if !summary.missed
                    && let Some(actor) = self.entities.get_mut(hit.target)
                {
                    summary.damage = actor.hp.drain(breakdown.total);
                    summary.killed = !actor.is_alive();
                }
                self.emit(SkillEvent::Damage {
                    source: hit.caster,
                    target: hit.target,
                    skill: definition.id,
                    amount: summary.damage,
                    hits: summary.hits,
                    missed: summary.missed,
                    group: hit.group,
                });
                tracing::trace!(
                    target: "skill::resolve",
                    caster = %hit.caster,
                    target_id = %hit.target,
                    skill = %definition.id,
                    base = breakdown.base,
                    element_pct = breakdown.element_pct,
                    total = summary.damage,
                    missed = summary.missed,
                    "hit"
                );
                if summary.damage > 0 {
                    self.interrupt(hit.target);
                }
            }
        }

        if !summary.missed {
            self.roll_statuses(&hit, &target, nonce, summary.killed);
            if !summary.killed {
                self.knock_back(&hit, &summary);
            }
        }

        if summary.killed {
            self.kill(hit.target, Some(hit.caster));
        }

        let effects = behavior.apply_additional_effects(&ctx, &summary);
        self.apply_side_effects(definition.id, hit.caster, Some(hit.target), effects);
        Some(summary)
    }

    fn roll_statuses(&mut self, hit: &Hit, target: &crate::state::ActorState, nonce: u64, killed: bool) {
        let now = self.clock;
        let seed = self.config.world_seed;
        for (index, entry) in hit.definition.statuses.iter().enumerate() {
            let (subject, chance) = if entry.on_caster {
                (hit.caster, u32::from(entry.chance.get(hit.level)))
            } else if killed {
                continue;
            } else {
                let base = u32::from(entry.chance.get(hit.level));
                (hit.target, combat::resisted_chance(base, entry.kind, target))
            };
            if chance == 0 {
                continue;
            }
            let context = RollContext::Status.with_offset(index as u32);
            let roll = self
                .env
                .rng()
                .roll_permille(compute_seed(seed, nonce, subject.0, context));
            if roll > chance {
                continue;
            }
            let effect = StatusEffect::new(entry.kind, now + entry.duration.get(hit.level))
                .with_value(entry.value.get(hit.level))
                .with_source(StatusSource::Actor(hit.caster));
            self.add_status(subject, effect);
        }
    }

    fn knock_back(&mut self, hit: &Hit, summary: &HitSummary) {
        let behavior = self.behaviors.get(hit.definition.id);
        let mut cells = hit.definition.knockback.get(hit.level);
        if behavior.zero_knockback_below_hit_count() && summary.damage < u32::from(summary.hits) {
            cells = 0;
        }
        if cells == 0 {
            return;
        }
        let Some(target) = self.entities.get(hit.target) else {
            return;
        };
        let from = target.position;
        let heading = knockback_heading(behavior.knockback_direction(), hit.origin, from, target.facing);
        let to = slide(self.env.map(), from, heading, cells);
        if to == from {
            return;
        }

        self.cancel_session(hit.target, CancelReason::ForcedMovement);
        self.relocate(hit.target, to);
        self.emit(SkillEvent::KnockedBack {
            target: hit.target,
            knockback: Knockback { from, to, heading },
        });
    }

    // ========================================================================
    // Status and death helpers
    // ========================================================================

    pub(super) fn add_status(&mut self, target: EntityId, effect: StatusEffect) -> bool {
        let Some(actor) = self.entities.get_mut(target) else {
            return false;
        };
        if !actor.statuses.add(effect) {
            tracing::warn!(
                target: "skill::resolve",
                actor = %target,
                kind = %effect.kind,
                "status table full"
            );
            return false;
        }
        self.emit(SkillEvent::StatusApplied {
            target,
            kind: effect.kind,
            expires_at: effect.expires_at,
        });
        true
    }

    pub(super) fn remove_status_from(&mut self, target: EntityId, kind: StatusKind, source: StatusSource) -> bool {
        let removed = self
            .entities
            .get_mut(target)
            .and_then(|actor| actor.statuses.remove_from(kind, source))
            .is_some();
        if removed {
            self.emit(SkillEvent::StatusEnded { target, kind });
        }
        removed
    }

    pub(super) fn remove_statuses_sourced(&mut self, target: EntityId, source: StatusSource) {
        let removed = self
            .entities
            .get_mut(target)
            .map(|actor| actor.statuses.remove_all_from(source))
            .unwrap_or_default();
        for effect in removed {
            self.emit(SkillEvent::StatusEnded {
                target,
                kind: effect.kind,
            });
        }
    }

    /// Death: statuses are cleared, the cast and timers dropped, footprints
    /// let go of the actor and its channels end.
    pub(super) fn kill(&mut self, id: EntityId, killer: Option<EntityId>) {
        let Some(actor) = self.entities.get_mut(id) else {
            return;
        };
        actor.hp.current = 0;
        let cleared = actor.statuses.clear();
        for effect in cleared {
            self.emit(SkillEvent::StatusEnded {
                target: id,
                kind: effect.kind,
            });
        }
        self.emit(SkillEvent::ActorDied { entity: id, killer });
        tracing::debug!(target: "skill::resolve", actor = %id, killer = ?killer, "actor died");

        self.cancel_session(id, CancelReason::CasterDied);
        self.timers.cancel_owner(TimerOwner::Entity(id));
        self.leave_all_groups(id);
        for handle in self.groups.owned_by(id) {
            let channelled = self
                .groups
                .get(handle)
                .is_some_and(|group| group.linked_status.is_some());
            if channelled {
                self.remove_group(handle, GroupRemoval::ChannelEnded);
            }
        }
    }
}
