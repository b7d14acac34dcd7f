//! Ground footprints inside the world: placement, periodic evaluation,
//! triggers, entry and exit, and removal.
//!
//! Groups are never dropped in the middle of an operation. Anything that
//! wants a group gone calls [`World::remove_group`], which only marks it;
//! [`World::reap_groups`] does the actual teardown once the operation is
//! done with its snapshots.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::resolve::Hit;
use super::{ExhaustionError, SkillError, World};
use crate::cast::{CastOutcome, CastSession, CastTarget};
use crate::condition::{CheckPhase, CheckTarget, ConditionChecker, ConditionRequest};
use crate::events::{GroupRemoval, SkillEvent};
use crate::skill::{CostTiming, HookContext, SkillDefinition, SkillLevel, UnitEffect, UnitFlags, UnitPlaceAction};
use crate::state::{EntityId, Position, StatusEffect, StatusKind, StatusSource, Tick};
use crate::timer::{TimerOwner, TimerTask};
use crate::unit::{CellPayload, CellRef, GroupHandle, PlacementContext, PlacementPlan, PlacementRequest, UnitGroup, plan_placement};

impl World {
    // ========================================================================
    // Placement
    // ========================================================================

    /// Places the footprint of a completed ground (or self-anchored) cast.
    pub(super) fn resolve_ground(&mut self, session: &CastSession) -> CastOutcome {
        let now = self.clock;
        let definition = Arc::clone(&session.definition);
        let level = session.level;
        let Some(caster) = self.entities.get(session.caster) else {
            return CastOutcome::Failed;
        };
        let anchor = match session.target {
            CastTarget::Ground(position) => position,
            CastTarget::Caster | CastTarget::Entity(_) => caster.position,
        };

        let planned = plan_placement(
            &PlacementContext {
                map: self.env.map(),
                pool: &self.groups,
                cells: &self.cells,
                entities: &self.entities,
                config: &self.config,
            },
            &PlacementRequest {
                definition: &definition,
                level,
                owner: session.caster,
                anchor,
                facing: caster.facing,
            },
        );
        let plan = match planned {
            Ok(plan) => plan,
            Err(error) => {
                self.diagnostics.placement_failures += 1;
                return self.fail_cast(session, error.into());
            }
        };

        if plan.creates_group() && !self.groups.has_room() {
            self.diagnostics.placement_failures += 1;
            let error = ExhaustionError::TooManyGroups {
                limit: self.config.max_unit_groups,
            };
            return self.fail_cast(session, error.into());
        }

        if definition.cost_timing() == CostTiming::AtPlacement {
            let condition = ConditionRequest {
                definition: &definition,
                level,
                target: CheckTarget::Ground(anchor),
                phase: CheckPhase::Placement {
                    in_combo: session.in_combo,
                },
                now,
                map: self.env.map(),
            };
            let Some(caster) = self.entities.get_mut(session.caster) else {
                return CastOutcome::Failed;
            };
            if let Err(error) = ConditionChecker.check_and_commit(caster, &condition, true) {
                return self.fail_cast(session, error.into());
            }
        }

        self.apply_placement(session.caster, definition, level, anchor, plan);
        CastOutcome::Resolved
    }

    /// Applies a plan: annihilations, cleanses, then the new group and its
    /// first evaluation.
    fn apply_placement(
        &mut self,
        owner: EntityId,
        definition: Arc<SkillDefinition>,
        level: SkillLevel,
        anchor: Position,
        plan: PlacementPlan,
    ) -> Option<GroupHandle> {
        let now = self.clock;
        for cell in &plan.annihilate {
            self.spend_cell(cell.group, cell.cell);
        }
        for handle in &plan.cleanse {
            self.remove_group(*handle, GroupRemoval::Cleansed);
        }
        if !plan.creates_group() {
            return None;
        }

        let tickset = self.config.tickset_capacity;
        let inserted = self.groups.insert_with(|handle| {
            UnitGroup::new(handle, owner, Arc::clone(&definition), level, anchor, &plan.cells, now, tickset)
        });
        let handle = match inserted {
            Ok(handle) => handle,
            Err(error) => {
                tracing::error!(target: "skill::unit", %error, skill = %definition.id, "group insert failed after room check");
                return None;
            }
        };
        for (index, position) in plan.cells.iter().enumerate() {
            self.cells.insert(
                *position,
                CellRef {
                    group: handle,
                    cell: index as u16,
                },
            );
        }

        self.diagnostics.groups_created += 1;
        self.emit(SkillEvent::GroupCreated {
            group: handle,
            owner,
            skill: definition.id,
            cells: plan.cells.len(),
        });
        tracing::debug!(
            target: "skill::unit",
            group = %handle,
            owner = %owner,
            skill = %definition.id,
            cells = plan.cells.len(),
            "group created"
        );

        if let Some(kind) = definition.channel
            && let Some(expires_at) = self.groups.get(handle).map(|group| group.expires_at)
        {
            let effect = StatusEffect::new(kind, expires_at).with_source(StatusSource::Group(handle));
            self.add_status(owner, effect);
        }

        if let Some(due) = self.evaluate_group(handle) {
            let timer = self
                .timers
                .schedule(TimerOwner::Group(handle), due, TimerTask::GroupInterval { group: handle });
            if let Some(group) = self.groups.get_mut(handle) {
                group.timer = Some(timer);
            }
        }
        Some(handle)
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// One pass over a group: expiry, spent cells, then a trigger for every
    /// actor standing on a live cell. Returns when to look again, or `None`
    /// once the group is gone.
    pub(super) fn evaluate_group(&mut self, handle: GroupHandle) -> Option<Tick> {
        let now = self.clock;
        let group = self.groups.get_mut(handle).filter(|group| !group.is_invalidated())?;
        if group.expires_at <= now {
            self.remove_group(handle, GroupRemoval::Expired);
            return None;
        }

        let expired = group.expire_cells(now);
        let released: Vec<(u16, Position, Option<EntityId>)> = expired
            .iter()
            .filter_map(|index| group.cell(*index))
            .map(|cell| (cell.index, cell.position, cell.latched()))
            .collect();
        for (index, position, latched) in released {
            self.cells.remove(position, CellRef { group: handle, cell: index });
            if let Some(victim) = latched {
                self.remove_status_from(victim, StatusKind::Snared, StatusSource::Group(handle));
            }
        }

        let live: Option<Vec<(u16, Position)>> = self
            .groups
            .get(handle)
            .filter(|group| group.alive_count() > 0)
            .map(|group| group.live_cells().map(|cell| (cell.index, cell.position)).collect());
        let Some(live) = live else {
            self.remove_group(handle, GroupRemoval::Emptied);
            return None;
        };
        let previous: Vec<EntityId> = self
            .groups
            .get(handle)
            .map(|group| group.occupants().iter().copied().collect())
            .unwrap_or_default();

        let mut present = BTreeSet::new();
        for (index, position) in live {
            for entity in self.entities.alive_at(position) {
                if !self.group_is_live(handle) {
                    return None;
                }
                present.insert(entity);
                let entered = self
                    .groups
                    .get_mut(handle)
                    .is_some_and(|group| group.enter(entity));
                if entered {
                    self.emit(SkillEvent::CellEntered {
                        group: handle,
                        entity,
                        position,
                    });
                }
                self.trigger(handle, index, entity);
            }
        }

        for entity in previous {
            if !present.contains(&entity) {
                self.leave_group(handle, entity);
            }
        }

        let group = self.groups.get(handle).filter(|group| !group.is_invalidated())?;
        let mut due = group.expires_at;
        if group.interval > 0 {
            due = due.min(now + group.interval.max(self.config.tick_ms));
        }
        if let Some(cell_expiry) = group.live_cells().map(|cell| cell.expires_at).min() {
            due = due.min(cell_expiry);
        }
        Some(due)
    }

    fn group_is_live(&self, handle: GroupHandle) -> bool {
        self.groups.get(handle).is_some_and(|group| !group.is_invalidated())
    }

    // ========================================================================
    // Triggers
    // ========================================================================

    /// A live cell acting on an actor. Bounded in depth, since an effect may
    /// move the actor onto further cells.
    pub(super) fn trigger(&mut self, handle: GroupHandle, index: u16, entity: EntityId) {
        if self.trigger_depth >= self.config.max_trigger_depth {
            self.diagnostics.trigger_depth_overruns += 1;
            tracing::warn!(
                target: "skill::unit",
                group = %handle,
                entity = %entity,
                depth = self.trigger_depth,
                "trigger depth exceeded"
            );
            return;
        }
        self.trigger_depth += 1;
        self.run_trigger(handle, index, entity);
        self.trigger_depth -= 1;
    }

    fn run_trigger(&mut self, handle: GroupHandle, index: u16, entity: EntityId) {
        let now = self.clock;
        let Some(group) = self.groups.get(handle).filter(|group| !group.is_invalidated()) else {
            return;
        };
        let Some(cell) = group.cell(index).filter(|cell| cell.is_armed()) else {
            return;
        };
        let position = cell.position;
        let definition = Arc::clone(&group.definition);
        let (level, owner, mask, interval) = (group.level, group.owner, group.target, group.interval);
        let shared_interval = group.flags().contains(UnitFlags::NO_OVERLAP);
        let Some(spec) = definition.unit.as_ref() else {
            return;
        };

        let (Some(owner_actor), Some(target)) = (
            self.entities.get(owner),
            self.entities.get(entity).filter(|actor| actor.is_alive()),
        ) else {
            return;
        };
        if !mask.allows(owner_actor.relation_to(target)) {
            return;
        }

        let ready = if shared_interval {
            self.skill_ticks
                .get(&(entity, definition.id))
                .is_none_or(|last| now.since(*last) >= interval.max(1))
        } else {
            group.can_trigger(entity, now)
        };
        if !ready {
            return;
        }

        let action = self.behaviors.get(definition.id).on_unit_place(&HookContext {
            definition: &definition,
            level,
            caster: owner_actor,
            target: Some(target),
            now,
            in_combo: false,
        });
        if action == UnitPlaceAction::Skip {
            return;
        }

        if shared_interval {
            self.skill_ticks.insert((entity, definition.id), now);
        } else if let Some(group) = self.groups.get_mut(handle) {
            group.mark_triggered(entity, now);
        }

        match action {
            UnitPlaceAction::Skip => {}
            UnitPlaceAction::Replace(effects) => {
                self.apply_side_effects(definition.id, owner, Some(entity), effects);
            }
            UnitPlaceAction::Default => match spec.effect.clone() {
                UnitEffect::None => {}
                UnitEffect::Damage => {
                    self.apply_hit(Hit {
                        caster: owner,
                        target: entity,
                        definition: Arc::clone(&definition),
                        level,
                        index: 0,
                        in_combo: false,
                        origin: position,
                        group: Some(handle),
                    });
                }
                UnitEffect::Heal { amount } => {
                    if let Some(actor) = self.entities.get_mut(entity) {
                        let amount = actor.hp.restore(amount.get(level));
                        self.emit(SkillEvent::Healed {
                            source: owner,
                            target: entity,
                            skill: definition.id,
                            amount,
                        });
                    }
                }
                UnitEffect::Snare { duration } => {
                    self.latch(handle, index, entity, now + duration.get(level));
                }
                UnitEffect::ZoneStatus { kind, value } => {
                    let source = StatusSource::Group(handle);
                    let already = self.entities.get(entity).is_some_and(|actor| {
                        actor
                            .statuses
                            .active_at(now)
                            .any(|effect| effect.kind == kind && effect.source == source)
                    });
                    let expires_at = self.groups.get(handle).map(|group| group.expires_at);
                    if !already && let Some(expires_at) = expires_at {
                        let effect = StatusEffect::new(kind, expires_at)
                            .with_value(value.get(level))
                            .with_source(source);
                        self.add_status(entity, effect);
                    }
                }
            },
        }

        let exhausted = self
            .groups
            .get_mut(handle)
            .filter(|group| !group.is_invalidated())
            .and_then(|group| group.cell_mut(index))
            .is_some_and(|cell| cell.alive && cell.consume_hit());
        if exhausted {
            self.spend_cell(handle, index);
        }
    }

    /// A trap cell grabs `entity` until `until`, after which the cell is spent.
    fn latch(&mut self, handle: GroupHandle, index: u16, entity: EntityId, until: Tick) {
        let Some(cell) = self.groups.get_mut(handle).and_then(|group| group.cell_mut(index)) else {
            return;
        };
        cell.payload = CellPayload::Latched(entity);
        self.add_status(
            entity,
            StatusEffect::new(StatusKind::Snared, until).with_source(StatusSource::Group(handle)),
        );
        self.set_cell_expiry(handle, index, until);
        self.emit(SkillEvent::CellSpent {
            group: handle,
            cell: index,
            expires_at: until,
        });
        tracing::debug!(target: "skill::unit", group = %handle, cell = index, entity = %entity, %until, "snared");
    }

    /// Lets go of a latched actor; the cell lingers for the spent window.
    pub(super) fn release_latch(&mut self, handle: GroupHandle, index: u16, victim: EntityId) {
        let now = self.clock;
        let Some(cell) = self.groups.get_mut(handle).and_then(|group| group.cell_mut(index)) else {
            return;
        };
        if cell.latched() != Some(victim) {
            return;
        }
        cell.payload = CellPayload::Spent;
        let until = now + self.config.trap_spent_ms;
        self.set_cell_expiry(handle, index, until);
        self.emit(SkillEvent::CellSpent {
            group: handle,
            cell: index,
            expires_at: until,
        });
        self.remove_status_from(victim, StatusKind::Snared, StatusSource::Group(handle));
    }

    /// Sets a cell's expiry and pulls the group's timer in if it now fires
    /// too late to see the cell die.
    fn set_cell_expiry(&mut self, handle: GroupHandle, index: u16, until: Tick) {
        let Some(group) = self.groups.get_mut(handle) else {
            return;
        };
        if let Some(cell) = group.cell_mut(index) {
            cell.expires_at = until;
        }
        if let Some(timer) = group.timer
            && self.timers.due_of(timer).is_some_and(|due| due > until)
        {
            self.timers.reschedule(timer, until);
        }
    }

    /// Kills one cell outright and releases anything it held.
    fn spend_cell(&mut self, handle: GroupHandle, index: u16) {
        let now = self.clock;
        let Some(group) = self.groups.get_mut(handle) else {
            return;
        };
        let Some((position, latched)) = group.cell(index).map(|cell| (cell.position, cell.latched())) else {
            return;
        };
        if !group.kill_cell(index) {
            return;
        }
        let emptied = group.alive_count() == 0;
        self.cells.remove(position, CellRef { group: handle, cell: index });
        self.emit(SkillEvent::CellSpent {
            group: handle,
            cell: index,
            expires_at: now,
        });
        if let Some(victim) = latched {
            self.remove_status_from(victim, StatusKind::Snared, StatusSource::Group(handle));
        }
        if emptied {
            self.remove_group(handle, GroupRemoval::Emptied);
        }
    }

    // ========================================================================
    // Entry and exit
    // ========================================================================

    /// Moves an actor and runs exit hooks for the cells it leaves, then entry
    /// hooks for the cells it lands on.
    pub(super) fn relocate(&mut self, id: EntityId, to: Position) {
        let Some(actor) = self.entities.get_mut(id) else {
            return;
        };
        let from = actor.position;
        if from == to {
            return;
        }
        actor.position = to;
        self.exit_position(id, from, to);
        self.enter_position(id, to);
    }

    fn exit_position(&mut self, id: EntityId, from: Position, to: Position) {
        for cell in self.cells.at(from) {
            let Some(group) = self.groups.get(cell.group).filter(|group| !group.is_invalidated()) else {
                continue;
            };
            let Some(latched) = group.cell(cell.cell).filter(|c| c.alive).map(|c| c.latched()) else {
                continue;
            };
            let still_inside = group.covers(to);
            self.emit(SkillEvent::CellLeft {
                group: cell.group,
                entity: id,
                position: from,
            });
            if latched == Some(id) {
                self.release_latch(cell.group, cell.cell, id);
            }
            if !still_inside {
                self.leave_group(cell.group, id);
            }
        }
    }

    /// Entry hooks for every live cell on `position`.
    pub(super) fn enter_position(&mut self, id: EntityId, position: Position) {
        for cell in self.cells.at(position) {
            let Some(group) = self.groups.get_mut(cell.group).filter(|group| !group.is_invalidated()) else {
                continue;
            };
            if !group.cell(cell.cell).is_some_and(|c| c.alive) {
                continue;
            }
            group.enter(id);
            self.emit(SkillEvent::CellEntered {
                group: cell.group,
                entity: id,
                position,
            });
            self.trigger(cell.group, cell.cell, id);
        }
    }

    /// The actor is no longer inside the group: listeners hear about it,
    /// latches release and the statuses the group gave it end. An owner keeps
    /// its channel status.
    fn leave_group(&mut self, handle: GroupHandle, id: EntityId) {
        let Some(group) = self.groups.get_mut(handle) else {
            return;
        };
        if group.leave(id) {
            self.emit(SkillEvent::GroupLeft { group: handle, entity: id });
        }
        let Some(group) = self.groups.get(handle) else {
            return;
        };
        let latched: Vec<u16> = group
            .live_cells()
            .filter(|cell| cell.latched() == Some(id))
            .map(|cell| cell.index)
            .collect();
        let channel = group.linked_status.filter(|_| group.owner == id);
        for index in latched {
            self.release_latch(handle, index, id);
        }

        let source = StatusSource::Group(handle);
        let removed: Vec<StatusKind> = self
            .entities
            .get_mut(id)
            .map(|actor| {
                let kinds: Vec<StatusKind> = actor
                    .statuses
                    .iter()
                    .filter(|effect| effect.source == source && Some(effect.kind) != channel)
                    .map(|effect| effect.kind)
                    .collect();
                kinds
                    .into_iter()
                    .filter(|kind| actor.statuses.remove_from(*kind, source).is_some())
                    .collect()
            })
            .unwrap_or_default();
        for kind in removed {
            self.emit(SkillEvent::StatusEnded { target: id, kind });
        }
    }

    /// Every group lets go of `id` (death, removal).
    pub(super) fn leave_all_groups(&mut self, id: EntityId) {
        let holding: Vec<GroupHandle> = self
            .groups
            .iter()
            .filter(|group| {
                group.occupants().contains(&id) || group.live_cells().any(|cell| cell.latched() == Some(id))
            })
            .map(|group| group.handle)
            .collect();
        for handle in holding {
            self.leave_group(handle, id);
        }
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Marks a group for removal at the end of the current operation.
    pub(super) fn remove_group(&mut self, handle: GroupHandle, reason: GroupRemoval) {
        if let Some(group) = self.groups.get_mut(handle)
            && !group.is_invalidated()
        {
            group.invalidate();
            self.pending_removals.push((handle, reason));
        }
    }

    /// Tears down every group marked for removal.
    pub(super) fn reap_groups(&mut self) {
        while !self.pending_removals.is_empty() {
            for (handle, reason) in std::mem::take(&mut self.pending_removals) {
                let Some(mut group) = self.groups.remove(handle) else {
                    continue;
                };
                if let Some(timer) = group.timer {
                    self.timers.cancel(timer);
                }
                self.timers.cancel_owner(TimerOwner::Group(handle));
                self.cells.remove_group(handle);

                let source = StatusSource::Group(handle);
                let mut affected: BTreeSet<EntityId> = group.occupants().iter().copied().collect();
                affected.extend(group.live_cells().filter_map(|cell| cell.latched()));
                affected.insert(group.owner);
                for entity in affected {
                    self.remove_statuses_sourced(entity, source);
                }

                group.destroy();
                debug_assert_eq!(group.alive_count(), 0);
                self.diagnostics.groups_removed += 1;
                self.emit(SkillEvent::GroupRemoved {
                    group: handle,
                    skill: group.skill,
                    reason,
                });
                tracing::debug!(target: "skill::unit", group = %handle, skill = %group.skill, %reason, "group removed");
            }
        }
    }

    /// Removes every footprint with a live cell inside the rectangle.
    pub fn cleanse_area(&mut self, from: Position, to: Position) -> Result<usize, SkillError> {
        self.ensure_running()?;
        let (min_x, max_x) = (from.x.min(to.x), from.x.max(to.x));
        let (min_y, max_y) = (from.y.min(to.y), from.y.max(to.y));
        let inside = |p: Position| (min_x..=max_x).contains(&p.x) && (min_y..=max_y).contains(&p.y);

        let doomed: Vec<GroupHandle> = self
            .groups
            .iter()
            .filter(|group| !group.is_invalidated() && group.live_cells().any(|cell| inside(cell.position)))
            .map(|group| group.handle)
            .collect();
        for handle in &doomed {
            self.remove_group(*handle, GroupRemoval::Cleansed);
        }
        self.settle();
        Ok(doomed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::CancelReason;
    use crate::skill::catalog;
    use crate::testing::{Fixture, hero, target_dummy};
    use crate::world::MoveKind;

    fn snare_at(fx: &mut Fixture, caster: EntityId, anchor: Position) -> GroupHandle {
        let ticket = fx
            .world
            .use_skill_on_ground(caster, catalog::ANKLE_SNARE, 1, anchor)
            .unwrap();
        fx.run_until(ticket.completes_at);
        fx.world.groups_at(anchor)[0]
    }

    #[test]
    fn ankle_snare_holds_one_actor_and_spends_its_cell() {
        let mut fx = Fixture::new();
        let hunter = fx.spawn(hero(1, Position::new(5, 5)));
        let anchor = Position::new(10, 10);
        let handle = snare_at(&mut fx, hunter, anchor);
        assert_eq!(fx.world.group(handle).unwrap().alive_count(), 5);

        let prey = fx.spawn(target_dummy(2, Position::new(12, 10)));
        fx.world.move_actor(prey, Position::new(11, 10), MoveKind::Walk).unwrap();
        let now = fx.world.clock();
        assert!(fx.world.actor(prey).unwrap().statuses.has(StatusKind::Snared, now));
        let spent = fx
            .drain()
            .into_iter()
            .filter(|event| matches!(event, SkillEvent::CellSpent { .. }))
            .count();
        assert_eq!(spent, 1);

        let second = fx.spawn(target_dummy(3, Position::new(12, 10)));
        fx.world.move_actor(prey, Position::new(11, 10), MoveKind::Walk).unwrap_err();
        fx.world.move_actor(second, Position::new(11, 10), MoveKind::Walk).unwrap();
        assert!(!fx.world.actor(second).unwrap().statuses.has(StatusKind::Snared, now));

        fx.run_for(60_000);
        assert!(!fx.world.actor(prey).unwrap().statuses.has(StatusKind::Snared, fx.world.clock()));
        assert!(fx.world.group(handle).is_none());
    }

    #[test]
    fn snared_cell_dies_after_the_spent_window() {
        let mut fx = Fixture::new();
        let hunter = fx.spawn(hero(1, Position::new(5, 5)));
        let anchor = Position::new(10, 10);
        let handle = snare_at(&mut fx, hunter, anchor);
        let prey = fx.spawn(target_dummy(2, Position::new(12, 10)));
        fx.world.move_actor(prey, Position::new(11, 10), MoveKind::Walk).unwrap();

        let hold = fx
            .world
            .registry()
            .get(catalog::ANKLE_SNARE)
            .and_then(|def| match &def.unit.as_ref()?.effect {
                UnitEffect::Snare { duration } => Some(duration.get(1)),
                _ => None,
            })
            .unwrap();
        let spent = fx.world.config().trap_spent_ms;
        fx.run_for(hold + spent + fx.world.config().tick_ms);

        let group = fx.world.group(handle).unwrap();
        assert_eq!(group.alive_count(), 4);
        assert!(!group.covers(Position::new(11, 10)));
    }

    #[test]
    fn footprint_triggers_once_per_interval_across_its_cells() {
        let mut fx = Fixture::new();
        let caster = fx.spawn(hero(1, Position::new(5, 5)));
        let victim = fx.spawn(target_dummy(2, Position::new(10, 10)).with_hp(1_000_000, 1_000_000));

        let ticket = fx
            .world
            .use_skill_on_ground(caster, catalog::STORM_GUST, 1, Position::new(10, 10))
            .unwrap();
        fx.run_until(ticket.completes_at);
        fx.drain();

        let interval = fx.world.registry().get(catalog::STORM_GUST).unwrap().unit.as_ref().unwrap().interval_ms;
        fx.world.move_actor(victim, Position::new(11, 10), MoveKind::Forced).unwrap();
        fx.world.move_actor(victim, Position::new(10, 11), MoveKind::Forced).unwrap();
        let hits_inside_interval = fx
            .drain()
            .iter()
            .filter(|event| matches!(event, SkillEvent::Damage { group: Some(_), .. }))
            .count();
        assert_eq!(hits_inside_interval, 0);

        fx.run_for(interval);
        let hits_next_interval = fx
            .drain()
            .iter()
            .filter(|event| matches!(event, SkillEvent::Damage { group: Some(_), .. }))
            .count();
        assert_eq!(hits_next_interval, 1);
    }

    #[test]
    fn crowded_footprint_still_triggers_once_per_interval() {
        let mut fx = Fixture::new();
        let caster = fx.spawn(hero(1, Position::new(5, 5)));
        let crowd: Vec<EntityId> = (6..=14)
            .flat_map(|x| (6..=9).map(move |y| Position::new(x, y)))
            .take(30)
            .zip(10..)
            .map(|(position, id)| fx.spawn(target_dummy(id, position).with_hp(1_000_000, 1_000_000)))
            .collect();
        assert!(crowd.len() > fx.world.config().tickset_capacity);

        let ticket = fx
            .world
            .use_skill_on_ground(caster, catalog::STORM_GUST, 1, Position::new(10, 10))
            .unwrap();
        fx.run_until(ticket.completes_at);
        let unit_hits = |events: Vec<SkillEvent>| {
            events
                .iter()
                .filter(|event| matches!(event, SkillEvent::Damage { group: Some(_), .. }))
                .count()
        };
        assert_eq!(unit_hits(fx.drain()), crowd.len());

        for id in &crowd {
            let at = fx.world.actor(*id).unwrap().position;
            fx.world
                .move_actor(*id, Position::new(at.x, at.y + 4), MoveKind::Forced)
                .unwrap();
        }
        assert_eq!(unit_hits(fx.drain()), 0);
    }

    #[test]
    fn removal_inside_a_footprint_reports_the_departure() {
        let mut fx = Fixture::new();
        let caster = fx.spawn(hero(1, Position::new(5, 5)));
        let leaver = fx.spawn(target_dummy(2, Position::new(10, 10)).with_hp(1_000_000, 1_000_000));
        let doomed = fx.spawn(target_dummy(3, Position::new(11, 11)).with_hp(1, 1));

        let ticket = fx
            .world
            .use_skill_on_ground(caster, catalog::STORM_GUST, 1, Position::new(10, 10))
            .unwrap();
        fx.run_until(ticket.completes_at);
        let group = fx.world.groups_at(Position::new(10, 10))[0];
        let left = |events: &[SkillEvent], who: EntityId| {
            events.iter().any(|event| {
                matches!(event, SkillEvent::GroupLeft { group: g, entity } if *g == group && *entity == who)
            })
        };

        let events = fx.drain();
        assert!(!fx.world.actor(doomed).unwrap().is_alive());
        assert!(left(&events, doomed));

        fx.world.remove_actor(leaver).unwrap();
        assert!(left(&fx.drain(), leaver));
        assert!(!fx.world.group(group).unwrap().occupants().contains(&leaver));
    }

    #[test]
    fn bragi_ends_with_a_manual_cancel() {
        let mut fx = Fixture::new();
        let bard = fx.spawn(hero(1, Position::new(10, 10)));
        let friend = fx.spawn(hero(2, Position::new(11, 10)));

        let ticket = fx.world.use_skill_on_self(bard, catalog::POEM_OF_BRAGI, 1).unwrap();
        fx.run_until(ticket.completes_at);
        let now = fx.world.clock();
        assert!(fx.world.actor(bard).unwrap().statuses.has(StatusKind::Dancing, now));
        assert!(fx.world.actor(friend).unwrap().statuses.has(StatusKind::CastReduction, now));
        assert_eq!(fx.world.group_count(), 1);
        fx.drain();

        assert!(fx.world.cancel_cast(bard, CancelReason::Manual).unwrap());
        assert_eq!(fx.world.group_count(), 0);
        let now = fx.world.clock();
        assert!(!fx.world.actor(bard).unwrap().statuses.has(StatusKind::Dancing, now));
        assert!(!fx.world.actor(friend).unwrap().statuses.has(StatusKind::CastReduction, now));
        assert!(fx.drain().iter().any(|event| matches!(
            event,
            SkillEvent::GroupRemoved {
                reason: GroupRemoval::ChannelEnded,
                ..
            }
        )));
    }

    #[test]
    fn leaving_a_zone_ends_its_status() {
        let mut fx = Fixture::new();
        let bard = fx.spawn(hero(1, Position::new(10, 10)));
        let friend = fx.spawn(hero(2, Position::new(11, 10)));
        let ticket = fx.world.use_skill_on_self(bard, catalog::POEM_OF_BRAGI, 1).unwrap();
        fx.run_until(ticket.completes_at);

        fx.world.move_actor(friend, Position::new(25, 25), MoveKind::Walk).unwrap();
        let now = fx.world.clock();
        assert!(!fx.world.actor(friend).unwrap().statuses.has(StatusKind::CastReduction, now));
        assert!(fx.world.actor(bard).unwrap().statuses.has(StatusKind::Dancing, now));
    }

    #[test]
    fn land_protector_cleanses_what_it_touches() {
        let mut fx = Fixture::new();
        let caster = fx.spawn(hero(1, Position::new(5, 5)));
        let ticket = fx
            .world
            .use_skill_on_ground(caster, catalog::STORM_GUST, 1, Position::new(10, 10))
            .unwrap();
        fx.run_until(ticket.completes_at);
        assert_eq!(fx.world.group_count(), 1);
        fx.wait_until_ready(caster);

        let ticket = fx
            .world
            .use_skill_on_ground(caster, catalog::LAND_PROTECTOR, 1, Position::new(12, 12))
            .unwrap();
        fx.run_until(ticket.completes_at);
        let groups: Vec<_> = fx.world.groups().map(|group| group.skill).collect();
        assert_eq!(groups, vec![catalog::LAND_PROTECTOR]);
    }

    #[test]
    fn removing_the_owner_removes_its_groups_and_timers() {
        let mut fx = Fixture::new();
        let caster = fx.spawn(hero(1, Position::new(5, 5)));
        let ticket = fx
            .world
            .use_skill_on_ground(caster, catalog::STORM_GUST, 1, Position::new(10, 10))
            .unwrap();
        fx.run_until(ticket.completes_at);
        assert!(fx.world.timer_count() > 0);

        fx.world.remove_actor(caster).unwrap();
        assert_eq!(fx.world.group_count(), 0);
        assert_eq!(fx.world.timer_count(), 0);
        assert!(fx.world.groups_at(Position::new(10, 10)).is_empty());
    }

    #[test]
    fn cleanse_area_counts_removed_groups() {
        let mut fx = Fixture::new();
        let caster = fx.spawn(hero(1, Position::new(15, 15)));
        let first = snare_at(&mut fx, caster, Position::new(10, 10));
        fx.wait_until_ready(caster);
        let second = snare_at(&mut fx, caster, Position::new(20, 20));

        let removed = fx.world.cleanse_area(Position::new(8, 8), Position::new(12, 12)).unwrap();
        assert_eq!(removed, 1);
        assert!(fx.world.group(first).is_none());
        assert!(fx.world.group(second).is_some());
    }
}
