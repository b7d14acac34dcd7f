//! Clock advancement and timer dispatch.
//!
//! The clock only moves forward through [`World::advance_to`]. Timers due in
//! the window run in due order; at each due tick status expiry is swept first
//! so a trigger never sees an effect that already ran out.

use super::{SkillError, World};
use crate::events::{GroupRemoval, SkillEvent};
use crate::state::{EntityId, StatusEffect, StatusKind, StatusSource, Tick};
use crate::timer::{TaskOutcome, TimerTask};

impl World {
    /// Advances by one configured tick.
    pub fn advance(&mut self) -> Result<Tick, SkillError> {
        let target = self.clock + self.config.tick_ms.max(1);
        self.advance_to(target)
    }

    pub fn advance_by(&mut self, ms: u64) -> Result<Tick, SkillError> {
        let target = self.clock + ms;
        self.advance_to(target)
    }

    /// Runs every timer due up to and including `target`, then leaves the
    /// clock at `target`. A target in the past is a no-op.
    pub fn advance_to(&mut self, target: Tick) -> Result<Tick, SkillError> {
        self.ensure_running()?;
        while let Some(due) = self.timers.next_due()
            && due <= target
        {
            self.clock = self.clock.max(due);
            self.expire_statuses();
            self.dispatch();
        }
        if target > self.clock {
            self.clock = target;
        }
        self.timers.advance_clock(self.clock);
        self.expire_statuses();
        self.settle();
        Ok(self.clock)
    }

    fn dispatch(&mut self) {
        let now = self.clock;
        let batch = self.timers.begin_dispatch(now);
        tracing::trace!(target: "skill::timer", %now, due = batch.len(), "dispatch");
        for id in batch {
            let Some(fired) = self.timers.take(id) else {
                continue;
            };
            let outcome = self.run_task(fired.task);
            self.timers.complete(id, outcome);
        }
        self.timers.end_dispatch();
        self.reap_groups();
    }

    fn run_task(&mut self, task: TimerTask) -> TaskOutcome {
        match task {
            TimerTask::CastComplete { caster, session } => {
                self.complete_session(caster, session);
                TaskOutcome::Done
            }
            TimerTask::FollowUpHit {
                caster,
                target,
                definition,
                level,
                hit,
            } => {
                self.run_follow_up(caster, target, definition, level, hit);
                TaskOutcome::Done
            }
            TimerTask::GroupInterval { group } => {
                if !self.groups.contains(group) {
                    self.diagnostics.timers_absorbed += 1;
                    tracing::debug!(target: "skill::timer", %group, "interval for a removed group absorbed");
                    return TaskOutcome::Done;
                }
                match self.evaluate_group(group) {
                    Some(due) => TaskOutcome::Reschedule { due },
                    None => TaskOutcome::Done,
                }
            }
        }
    }

    /// Drops expired statuses. A snare running out releases its cell; a
    /// channel running out ends its footprint.
    fn expire_statuses(&mut self) {
        let now = self.clock;
        let mut ended: Vec<(EntityId, StatusEffect)> = Vec::new();
        for actor in self.entities.iter_mut() {
            let id = actor.id;
            ended.extend(actor.statuses.remove_expired(now).into_iter().map(|effect| (id, effect)));
        }

        for (id, effect) in ended {
            self.emit(SkillEvent::StatusEnded {
                target: id,
                kind: effect.kind,
            });
            let StatusSource::Group(handle) = effect.source else {
                continue;
            };
            let Some(group) = self.groups.get(handle) else {
                continue;
            };
            if effect.kind == StatusKind::Snared {
                let held: Vec<u16> = group
                    .live_cells()
                    .filter(|cell| cell.latched() == Some(id))
                    .map(|cell| cell.index)
                    .collect();
                for index in held {
                    self.release_latch(handle, index, id);
                }
            } else if group.owner == id && group.linked_status == Some(effect.kind) {
                self.remove_group(handle, GroupRemoval::ChannelEnded);
            }
        }
    }
}
