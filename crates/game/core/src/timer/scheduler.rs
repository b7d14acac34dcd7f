use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::state::Tick;
use crate::timer::{TaskOutcome, TimerId, TimerOwner, TimerTask};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct QueueKey {
    due: Tick,
    seq: u64,
    id: TimerId,
}

#[derive(Debug)]
struct Entry {
    due: Tick,
    seq: u64,
    owner: TimerOwner,
    task: TimerTask,
    cancelled: bool,
}

/// A timer handed out by [`TimerScheduler::take`].
#[derive(Clone, Debug)]
pub struct Fired {
    pub id: TimerId,
    pub owner: TimerOwner,
    pub due: Tick,
    pub task: TimerTask,
}

/// Due-time ordered timer queue with deferred removal during dispatch.
///
/// Heap entries are never removed eagerly. A cancelled or rescheduled timer
/// leaves a stale key behind which is skipped when it surfaces, since its
/// sequence number no longer matches the live entry.
#[derive(Debug, Default)]
pub struct TimerScheduler {
    clock: Tick,
    next_id: u64,
    next_seq: u64,
    queue: BinaryHeap<Reverse<QueueKey>>,
    entries: HashMap<TimerId, Entry>,
    by_owner: HashMap<TimerOwner, HashSet<TimerId>>,
    live: usize,
    dispatching: bool,
    reap: Vec<TimerId>,
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last tick a dispatch pass ran for.
    pub fn clock(&self) -> Tick {
        self.clock
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_live(&self, id: TimerId) -> bool {
        self.entries.get(&id).is_some_and(|entry| !entry.cancelled)
    }

    pub fn due_of(&self, id: TimerId) -> Option<Tick> {
        self.entries
            .get(&id)
            .filter(|entry| !entry.cancelled)
            .map(|entry| entry.due)
    }

    /// Earliest due tick among live timers. Stale keys at the head of the
    /// heap are discarded on the way.
    pub fn next_due(&mut self) -> Option<Tick> {
        while let Some(Reverse(key)) = self.queue.peek().copied() {
            if self.is_current(key) {
                return Some(key.due);
            }
            self.queue.pop();
        }
        None
    }

    /// Schedules `task` for `due`, or for the tick after the clock if `due`
    /// is not in the future.
    pub fn schedule(&mut self, owner: TimerOwner, due: Tick, task: TimerTask) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = self.clamp(due);
        let seq = self.bump_seq();

        tracing::trace!(
            target: "skill::timer",
            timer = %id,
            task = task.label(),
            due = %due,
            "scheduled"
        );

        self.queue.push(Reverse(QueueKey { due, seq, id }));
        self.entries.insert(
            id,
            Entry {
                due,
                seq,
                owner,
                task,
                cancelled: false,
            },
        );
        self.by_owner.entry(owner).or_default().insert(id);
        self.live += 1;
        id
    }

    /// Cancels a timer. Returns `false` if it was already gone or cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        if entry.cancelled {
            return false;
        }

        self.live -= 1;
        if self.dispatching {
            entry.cancelled = true;
            self.reap.push(id);
        } else {
            let owner = entry.owner;
            self.entries.remove(&id);
            self.unindex(owner, id);
        }
        tracing::trace!(target: "skill::timer", timer = %id, "cancelled");
        true
    }

    /// Moves a live timer to a new due tick, keeping its id.
    pub fn reschedule(&mut self, id: TimerId, due: Tick) -> bool {
        let due = self.clamp(due);
        let seq = self.bump_seq();
        let Some(entry) = self.entries.get_mut(&id).filter(|entry| !entry.cancelled) else {
            return false;
        };
        entry.due = due;
        entry.seq = seq;
        self.queue.push(Reverse(QueueKey { due, seq, id }));
        true
    }

    /// Moves the clock forward without dispatching, so timers scheduled
    /// afterwards cannot land in the past.
    pub fn advance_clock(&mut self, now: Tick) {
        if now > self.clock {
            self.clock = now;
        }
    }

    /// Cancels every live timer tied to `owner`.
    pub fn cancel_owner(&mut self, owner: TimerOwner) -> usize {
        let ids: Vec<TimerId> = self
            .by_owner
            .get(&owner)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        ids.into_iter().filter(|id| self.cancel(*id)).count()
    }

    /// Starts a dispatch pass for `now` and returns the frozen batch of due
    /// timers, in due-time then scheduling order.
    pub fn begin_dispatch(&mut self, now: Tick) -> Vec<TimerId> {
        debug_assert!(!self.dispatching, "nested dispatch pass");
        self.dispatching = true;
        if now > self.clock {
            self.clock = now;
        }

        let mut batch = Vec::new();
        while let Some(Reverse(key)) = self.queue.peek().copied() {
            if key.due > now {
                break;
            }
            self.queue.pop();
            if self.is_current(key) {
                batch.push(key.id);
            }
        }
        batch
    }

    /// Hands out a timer from the current batch, unless it was cancelled or
    /// pushed back earlier in the pass.
    pub fn take(&self, id: TimerId) -> Option<Fired> {
        let entry = self
            .entries
            .get(&id)
            .filter(|entry| !entry.cancelled && entry.due <= self.clock)?;
        Some(Fired {
            id,
            owner: entry.owner,
            due: entry.due,
            task: entry.task.clone(),
        })
    }

    /// Records what a fired task asked for. A reschedule of a timer that was
    /// cancelled from inside its own callback is ignored.
    pub fn complete(&mut self, id: TimerId, outcome: TaskOutcome) -> bool {
        let Some(cancelled) = self.entries.get(&id).map(|entry| entry.cancelled) else {
            return false;
        };
        if cancelled {
            return false;
        }

        match outcome {
            TaskOutcome::Done => {
                self.live -= 1;
                if self.dispatching {
                    if let Some(entry) = self.entries.get_mut(&id) {
                        entry.cancelled = true;
                    }
                    self.reap.push(id);
                } else if let Some(entry) = self.entries.remove(&id) {
                    self.unindex(entry.owner, id);
                }
                false
            }
            TaskOutcome::Reschedule { due } => {
                let due = self.clamp(due);
                let seq = self.bump_seq();
                if let Some(entry) = self.entries.get_mut(&id) {
                    entry.due = due;
                    entry.seq = seq;
                }
                self.queue.push(Reverse(QueueKey { due, seq, id }));
                true
            }
        }
    }

    /// Ends the pass and drops everything that was cancelled or finished
    /// during it.
    pub fn end_dispatch(&mut self) {
        self.dispatching = false;
        for id in std::mem::take(&mut self.reap) {
            if let Some(entry) = self.entries.remove(&id) {
                self.unindex(entry.owner, id);
            }
        }
    }

    /// Drops every timer.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.entries.clear();
        self.by_owner.clear();
        self.reap.clear();
        self.live = 0;
    }

    /// Whether a heap key still points at the live entry it was pushed for.
    fn is_current(&self, key: QueueKey) -> bool {
        self.entries
            .get(&key.id)
            .is_some_and(|entry| entry.seq == key.seq && !entry.cancelled)
    }

    fn clamp(&self, due: Tick) -> Tick {
        let earliest = self.clock + 1;
        if due < earliest { earliest } else { due }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn unindex(&mut self, owner: TimerOwner, id: TimerId) {
        if let Some(ids) = self.by_owner.get_mut(&owner) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_owner.remove(&owner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::SessionId;
    use crate::state::EntityId;

    fn cast_task(caster: u32) -> TimerTask {
        TimerTask::CastComplete {
            caster: EntityId(caster),
            session: SessionId(u64::from(caster)),
        }
    }

    fn caster_of(fired: &Fired) -> EntityId {
        match fired.task {
            TimerTask::CastComplete { caster, .. } => caster,
            _ => panic!("unexpected task"),
        }
    }

    fn run_pass(scheduler: &mut TimerScheduler, now: Tick) -> Vec<Fired> {
        let batch = scheduler.begin_dispatch(now);
        let mut fired = Vec::new();
        for id in batch {
            if let Some(timer) = scheduler.take(id) {
                scheduler.complete(id, TaskOutcome::Done);
                fired.push(timer);
            }
        }
        scheduler.end_dispatch();
        fired
    }

    #[test]
    fn dispatches_everything_due_in_order() {
        let mut scheduler = TimerScheduler::new();
        scheduler.schedule(TimerOwner::World, Tick(30), cast_task(3));
        scheduler.schedule(TimerOwner::World, Tick(10), cast_task(1));
        scheduler.schedule(TimerOwner::World, Tick(10), cast_task(2));
        scheduler.schedule(TimerOwner::World, Tick(50), cast_task(4));

        let fired = run_pass(&mut scheduler, Tick(40));
        let order: Vec<_> = fired.iter().map(caster_of).collect();
        assert_eq!(order, vec![EntityId(1), EntityId(2), EntityId(3)]);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.next_due(), Some(Tick(50)));
    }

    #[test]
    fn timers_scheduled_in_a_pass_wait_for_a_later_tick() {
        let mut scheduler = TimerScheduler::new();
        scheduler.schedule(TimerOwner::World, Tick(10), cast_task(1));

        let batch = scheduler.begin_dispatch(Tick(10));
        assert_eq!(batch.len(), 1);
        let late = scheduler.schedule(TimerOwner::World, Tick(10), cast_task(2));
        scheduler.complete(batch[0], TaskOutcome::Done);
        scheduler.end_dispatch();

        assert_eq!(scheduler.due_of(late), Some(Tick(11)));
        assert!(run_pass(&mut scheduler, Tick(10)).is_empty());
        assert_eq!(run_pass(&mut scheduler, Tick(11)).len(), 1);
    }

    #[test]
    fn cancel_inside_a_pass_is_deferred_and_idempotent() {
        let mut scheduler = TimerScheduler::new();
        let first = scheduler.schedule(TimerOwner::Entity(EntityId(1)), Tick(5), cast_task(1));
        let second = scheduler.schedule(TimerOwner::Entity(EntityId(2)), Tick(5), cast_task(2));

        let batch = scheduler.begin_dispatch(Tick(5));
        assert_eq!(batch, vec![first, second]);

        assert!(scheduler.take(first).is_some());
        assert!(scheduler.cancel(second));
        assert!(!scheduler.cancel(second));
        scheduler.complete(first, TaskOutcome::Done);

        assert!(scheduler.take(second).is_none());
        scheduler.end_dispatch();
        assert!(scheduler.is_empty());
    }

    #[test]
    fn reschedule_keeps_the_id_until_cancelled() {
        let mut scheduler = TimerScheduler::new();
        let id = scheduler.schedule(TimerOwner::World, Tick(100), cast_task(9));

        let batch = scheduler.begin_dispatch(Tick(100));
        assert_eq!(batch, vec![id]);
        assert!(scheduler.complete(id, TaskOutcome::Reschedule { due: Tick(200) }));
        scheduler.end_dispatch();
        assert_eq!(scheduler.due_of(id), Some(Tick(200)));

        let batch = scheduler.begin_dispatch(Tick(200));
        assert_eq!(batch, vec![id]);
        assert!(scheduler.cancel(id));
        assert!(!scheduler.complete(id, TaskOutcome::Reschedule { due: Tick(300) }));
        scheduler.end_dispatch();
        assert!(!scheduler.is_live(id));
        assert!(scheduler.begin_dispatch(Tick(1_000)).is_empty());
    }

    #[test]
    fn cancel_owner_only_touches_that_owner() {
        let mut scheduler = TimerScheduler::new();
        let owner = TimerOwner::Entity(EntityId(7));
        scheduler.schedule(owner, Tick(10), cast_task(7));
        scheduler.schedule(owner, Tick(20), cast_task(7));
        let other = scheduler.schedule(TimerOwner::World, Tick(10), cast_task(1));

        assert_eq!(scheduler.cancel_owner(owner), 2);
        assert_eq!(scheduler.cancel_owner(owner), 0);
        assert!(scheduler.is_live(other));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn stale_heap_keys_are_skipped() {
        let mut scheduler = TimerScheduler::new();
        let id = scheduler.schedule(TimerOwner::World, Tick(10), cast_task(1));
        scheduler.cancel(id);
        assert!(scheduler.begin_dispatch(Tick(10)).is_empty());
        scheduler.end_dispatch();
    }

    #[test]
    fn next_due_skips_cancelled_and_moved_timers() {
        let mut scheduler = TimerScheduler::new();
        let early = scheduler.schedule(TimerOwner::World, Tick(10), cast_task(1));
        let moved = scheduler.schedule(TimerOwner::World, Tick(20), cast_task(2));
        scheduler.schedule(TimerOwner::World, Tick(60), cast_task(3));
        assert_eq!(scheduler.len(), 3);

        scheduler.cancel(early);
        assert!(scheduler.reschedule(moved, Tick(80)));
        assert_eq!(scheduler.len(), 2);
        assert_eq!(scheduler.next_due(), Some(Tick(60)));

        scheduler.clear();
        assert_eq!(scheduler.next_due(), None);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn pushing_back_a_batched_timer_skips_it_this_pass() {
        let mut scheduler = TimerScheduler::new();
        let first = scheduler.schedule(TimerOwner::World, Tick(10), cast_task(1));
        let second = scheduler.schedule(TimerOwner::World, Tick(10), cast_task(2));

        let batch = scheduler.begin_dispatch(Tick(10));
        assert_eq!(batch, vec![first, second]);
        assert!(scheduler.reschedule(second, Tick(40)));
        assert!(scheduler.take(first).is_some());
        assert!(scheduler.take(second).is_none());
        scheduler.complete(first, TaskOutcome::Done);
        scheduler.end_dispatch();

        assert_eq!(scheduler.next_due(), Some(Tick(40)));
        assert_eq!(run_pass(&mut scheduler, Tick(40)).len(), 1);
    }
}
