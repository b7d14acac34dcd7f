//! The owned world context every skill operation runs against.
//!
//! [`World`] bundles the skill registry, actors, timer scheduler, cast
//! sessions and ground footprints that would otherwise be global tables.
//! Public operations are the only entry points. Each one finishes by reaping
//! footprints that were invalidated while it ran, so no operation ever
//! observes a half-removed group.
//!
//! The implementation is split by concern:
//!
//! - `cast`: requests, cancellation and cast completion
//! - `resolve`: the damage/status/knockback pipeline
//! - `units`: footprint placement, triggers, entry/exit and removal
//! - `dispatch`: clock advancement, timer dispatch and status expiry
mod cast;
mod diagnostics;
mod dispatch;
mod error;
mod request;
mod resolve;
mod units;

use std::collections::HashMap;

pub use diagnostics::Diagnostics;
pub use error::{ExhaustionError, SkillError};
pub use request::{ActionBlock, CastRequest, CastTicket, MoveKind};

use crate::cast::{CancelReason, CastSession, SessionTable};
use crate::condition::ConditionError;
use crate::config::GameConfig;
use crate::env::GameEnv;
use crate::events::{GroupRemoval, SkillEvent};
use crate::skill::{BehaviorTable, ReloadSummary, SkillId, SkillRegistry, SkillTable};
use crate::state::{ActorState, EntitiesState, EntityId, Position, Tick};
use crate::timer::{TimerOwner, TimerScheduler};
use crate::unit::{CellIndex, GroupHandle, GroupPool, UnitGroup};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    Running,
    Stopped,
}

/// Skill system state for one map instance.
pub struct World {
    config: GameConfig,
    registry: SkillRegistry,
    behaviors: BehaviorTable,
    env: GameEnv,
    entities: EntitiesState,
    timers: TimerScheduler,
    sessions: SessionTable,
    groups: GroupPool,
    cells: CellIndex,
    /// Last trigger per (actor, skill) for footprints that share one interval.
    skill_ticks: HashMap<(EntityId, SkillId), Tick>,
    pending_removals: Vec<(GroupHandle, GroupRemoval)>,
    clock: Tick,
    nonce: u64,
    events: Vec<SkillEvent>,
    lifecycle: Lifecycle,
    trigger_depth: u32,
    diagnostics: Diagnostics,
}

impl World {
    pub fn new(config: GameConfig, table: SkillTable, env: GameEnv) -> Self {
        tracing::info!(
            target: "skill::world",
            skills = table.len(),
            tick_ms = config.tick_ms,
            "world initialized"
        );
        Self {
            registry: SkillRegistry::new(table),
            behaviors: BehaviorTable::builtin(),
            env,
            entities: EntitiesState::new(),
            timers: TimerScheduler::new(),
            sessions: SessionTable::new(config.max_cast_sessions),
            groups: GroupPool::new(config.group_id_bound, config.max_unit_groups),
            cells: CellIndex::new(),
            skill_ticks: HashMap::new(),
            pending_removals: Vec::new(),
            clock: Tick::ZERO,
            nonce: 0,
            events: Vec::new(),
            lifecycle: Lifecycle::Running,
            trigger_depth: 0,
            diagnostics: Diagnostics::default(),
            config,
        }
    }

    pub fn with_behaviors(mut self, behaviors: BehaviorTable) -> Self {
        self.behaviors = behaviors;
        self
    }

    /// Cancels every cast, removes every footprint and stops the clock.
    /// Later operations return [`SkillError::NotRunning`].
    pub fn shutdown(&mut self) {
        if self.lifecycle == Lifecycle::Stopped {
            return;
        }
        for caster in self.sessions.casters() {
            self.cancel_session(caster, CancelReason::Shutdown);
        }
        for handle in self.groups.handles() {
            self.remove_group(handle, GroupRemoval::Shutdown);
        }
        self.reap_groups();
        self.timers.clear();
        self.lifecycle = Lifecycle::Stopped;
        tracing::info!(target: "skill::world", clock = %self.clock, "world shut down");
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    fn ensure_running(&self) -> Result<(), SkillError> {
        match self.lifecycle {
            Lifecycle::Running => Ok(()),
            Lifecycle::Stopped => Err(SkillError::NotRunning),
        }
    }

    /// Ends a public operation: removes groups invalidated while it ran.
    fn settle(&mut self) {
        self.reap_groups();
    }

    // ========================================================================
    // Actors
    // ========================================================================

    /// Adds an actor. Footprints under its feet react as if it walked in.
    pub fn spawn_actor(&mut self, actor: ActorState) -> Result<(), SkillError> {
        self.ensure_running()?;
        let id = actor.id;
        let position = actor.position;
        if !self.entities.insert(actor) {
            return Err(SkillError::ActorExists(id));
        }
        tracing::debug!(target: "skill::world", actor = %id, ?position, "actor spawned");
        self.enter_position(id, position);
        self.settle();
        Ok(())
    }

    /// Takes an actor out of the world (logout, despawn, map change).
    ///
    /// Its cast is cancelled, its timers dropped, every footprint it stands in
    /// lets go of it, and the footprints it owns are removed.
    pub fn remove_actor(&mut self, id: EntityId) -> Result<ActorState, SkillError> {
        self.ensure_running()?;
        if !self.entities.contains(id) {
            return Err(SkillError::ActorNotFound(id));
        }

        self.cancel_session(id, CancelReason::Disconnected);
        self.timers.cancel_owner(TimerOwner::Entity(id));
        self.leave_all_groups(id);
        for handle in self.groups.owned_by(id) {
            self.remove_group(handle, GroupRemoval::OwnerGone);
        }
        self.skill_ticks.retain(|(entity, _), _| *entity != id);

        let actor = self
            .entities
            .remove(id)
            .ok_or(SkillError::ActorNotFound(id))?;
        tracing::debug!(target: "skill::world", actor = %id, "actor removed");
        self.settle();
        Ok(actor)
    }

    /// Moves an actor and runs footprint exit/entry for the cells involved.
    pub fn move_actor(&mut self, id: EntityId, to: Position, kind: MoveKind) -> Result<(), SkillError> {
        self.ensure_running()?;
        let actor = self.entities.get(id).ok_or(SkillError::ActorNotFound(id))?;
        if !actor.is_alive() {
            return Err(ConditionError::CasterDead.into());
        }
        let map = self.env.map();
        if !map.contains(to) || !map.is_walkable(to) {
            return Err(ConditionError::TerrainRestricted(to).into());
        }

        match kind {
            MoveKind::Walk => {
                if self.sessions.is_casting(id) {
                    return Err(ConditionError::AlreadyCasting.into());
                }
                if let Some(blocker) = actor.movement_blocker(self.clock) {
                    return Err(ConditionError::StatusForbids(blocker).into());
                }
            }
            MoveKind::Forced => {
                self.cancel_session(id, CancelReason::ForcedMovement);
            }
        }

        self.relocate(id, to);
        self.settle();
        Ok(())
    }

    /// Damage dealt by something outside the skill system (auto attacks,
    /// scripts). Interrupts an interruptible cast.
    pub fn notify_damage(&mut self, id: EntityId, amount: u32) -> Result<u32, SkillError> {
        self.ensure_running()?;
        let actor = self
            .entities
            .get_mut(id)
            .ok_or(SkillError::ActorNotFound(id))?;
        if !actor.is_alive() {
            return Ok(0);
        }
        let dealt = actor.hp.drain(amount);
        let killed = !actor.is_alive();
        if dealt > 0 {
            self.interrupt(id);
        }
        if killed {
            self.kill(id, None);
        }
        self.settle();
        Ok(dealt)
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Swaps the skill table. Casts and footprints already in flight keep the
    /// definitions they started with.
    pub fn reload_skills(&mut self, table: SkillTable) -> Result<ReloadSummary, SkillError> {
        self.ensure_running()?;
        Ok(self.registry.reload(table))
    }

    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    pub fn behaviors_mut(&mut self) -> &mut BehaviorTable {
        &mut self.behaviors
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn clock(&self) -> Tick {
        self.clock
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn env(&self) -> &GameEnv {
        &self.env
    }

    pub fn actor(&self, id: EntityId) -> Option<&ActorState> {
        self.entities.get(id)
    }

    /// Mutable access for collaborators outside the skill system (equipment,
    /// inventory, regeneration). Position changes must go through
    /// [`World::move_actor`].
    pub fn actor_mut(&mut self, id: EntityId) -> Option<&mut ActorState> {
        self.entities.get_mut(id)
    }

    pub fn entities(&self) -> &EntitiesState {
        &self.entities
    }

    pub fn session(&self, caster: EntityId) -> Option<&CastSession> {
        self.sessions.get(caster)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn group(&self, handle: GroupHandle) -> Option<&UnitGroup> {
        self.groups.get(handle)
    }

    pub fn groups(&self) -> impl Iterator<Item = &UnitGroup> {
        self.groups.iter()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Live footprints with a live cell on `position`.
    pub fn groups_at(&self, position: Position) -> Vec<GroupHandle> {
        self.cells
            .groups_at(position)
            .into_iter()
            .filter(|handle| self.groups.get(*handle).is_some_and(|group| group.covers(position)))
            .collect()
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    /// Why `id` cannot act, if it cannot.
    pub fn action_block(&self, id: EntityId) -> Option<ActionBlock> {
        let Some(actor) = self.entities.get(id) else {
            return Some(ActionBlock::Missing);
        };
        if !actor.is_alive() {
            return Some(ActionBlock::Dead);
        }
        if let Some(session) = self.sessions.get(id)
            && session.is_active()
        {
            return Some(ActionBlock::Casting {
                completes_at: session.completes_at,
            });
        }
        if actor.can_act_at > self.clock {
            return Some(ActionBlock::Delayed {
                until: actor.can_act_at,
            });
        }
        actor.casting_blocker(self.clock).map(ActionBlock::Status)
    }

    pub fn is_blocked(&self, id: EntityId) -> bool {
        self.action_block(id).is_some()
    }

    /// Takes every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<SkillEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: SkillEvent) {
        tracing::trace!(target: "skill::world", event = event.label(), "emit");
        self.events.push(event);
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("clock", &self.clock)
            .field("actors", &self.entities.len())
            .field("sessions", &self.sessions.len())
            .field("groups", &self.groups.len())
            .field("timers", &self.timers.len())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}
