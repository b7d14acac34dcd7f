//! Simulation worker that owns the authoritative [`game_core::World`].
//!
//! Receives commands from [`RuntimeHandle`](crate::RuntimeHandle), applies
//! them to the world, and publishes the events each one produced to the
//! [`EventBus`]. With auto-tick enabled the worker also advances the world
//! clock by one configured tick per wall-clock tick.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use game_core::skill::ReloadSummary;
use game_core::{
    ActorState, CancelReason, CastRequest, CastTicket, EntityId, GameError, MoveKind, Position,
    SkillError, SkillTable, Tick, World,
};

use crate::events::{Event, EventBus};

type Reply<T> = oneshot::Sender<Result<T, SkillError>>;

/// Commands that can be sent to the simulation worker
pub enum Command {
    Cast {
        request: CastRequest,
        reply: Reply<CastTicket>,
    },
    CancelCast {
        caster: EntityId,
        reply: Reply<bool>,
    },
    Spawn {
        actor: Box<ActorState>,
        reply: Reply<()>,
    },
    Move {
        id: EntityId,
        to: Position,
        kind: MoveKind,
        reply: Reply<()>,
    },
    Remove {
        id: EntityId,
        reply: Reply<ActorState>,
    },
    NotifyDamage {
        id: EntityId,
        amount: u32,
        reply: Reply<u32>,
    },
    ReloadSkills {
        table: SkillTable,
        reply: Reply<ReloadSummary>,
    },
    /// Manual clock stepping, in milliseconds.
    Advance { ms: u64, reply: Reply<Tick> },
    /// Read-only access to the world; the closure carries its own reply.
    Query {
        run: Box<dyn FnOnce(&World) + Send>,
    },
    Shutdown { reply: oneshot::Sender<()> },
}

/// Background task that processes world commands.
pub struct SimulationWorker {
    world: World,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    auto_tick: Option<Duration>,
}

impl SimulationWorker {
    /// Creates a new simulation worker.
    pub fn new(
        world: World,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        auto_tick: Option<Duration>,
    ) -> Self {
        info!(
            target: "runtime::worker",
            actors = world.entities().len(),
            skills = world.registry().snapshot().len(),
            auto_tick = auto_tick.is_some(),
            "simulation worker initialized"
        );

        Self {
            world,
            command_rx,
            event_bus,
            auto_tick,
        }
    }

    /// Main worker loop. Ends when every handle is dropped or on shutdown.
    pub async fn run(mut self) {
        let mut ticker = self.auto_tick.map(|period| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                _ = next_tick(&mut ticker) => self.on_tick(),
            }
        }

        if self.world.is_running() {
            self.world.shutdown();
            self.publish_events();
        }
        info!(target: "runtime::worker", clock = %self.world.clock(), "simulation worker stopped");
    }

    /// Returns false when the worker should stop.
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Cast { request, reply } => {
                let result = self.world.cast(request);
                if let Err(error) = &result {
                    debug!(
                        target: "runtime::worker",
                        caster = %request.caster,
                        skill = %request.skill,
                        code = error.error_code(),
                        "cast rejected"
                    );
                }
                self.finish(reply, result, "Cast");
            }
            Command::CancelCast { caster, reply } => {
                let result = self.world.cancel_cast(caster, CancelReason::Manual);
                self.finish(reply, result, "CancelCast");
            }
            Command::Spawn { actor, reply } => {
                let result = self.world.spawn_actor(*actor);
                self.finish(reply, result, "Spawn");
            }
            Command::Move { id, to, kind, reply } => {
                let result = self.world.move_actor(id, to, kind);
                self.finish(reply, result, "Move");
            }
            Command::Remove { id, reply } => {
                let result = self.world.remove_actor(id);
                self.finish(reply, result, "Remove");
            }
            Command::NotifyDamage { id, amount, reply } => {
                let result = self.world.notify_damage(id, amount);
                self.finish(reply, result, "NotifyDamage");
            }
            Command::ReloadSkills { table, reply } => {
                let result = self.world.reload_skills(table);
                if let Ok(summary) = &result {
                    info!(
                        target: "runtime::worker",
                        added = summary.added.len(),
                        removed = summary.removed.len(),
                        changed = summary.changed.len(),
                        "skills reloaded"
                    );
                }
                self.finish(reply, result, "ReloadSkills");
            }
            Command::Advance { ms, reply } => {
                let result = self.world.advance_by(ms);
                self.finish(reply, result, "Advance");
            }
            Command::Query { run } => run(&self.world),
            Command::Shutdown { reply } => {
                self.world.shutdown();
                self.publish_events();
                if reply.send(()).is_err() {
                    debug!(target: "runtime::worker", "Shutdown reply channel closed (caller dropped)");
                }
                return false;
            }
        }
        true
    }

    /// Publishes the command's events before replying, so a caller that
    /// awaited the reply finds them already on the bus.
    fn finish<T>(&mut self, reply: Reply<T>, result: Result<T, SkillError>, command: &'static str) {
        self.publish_events();
        if reply.send(result).is_err() {
            debug!(target: "runtime::worker", command, "reply channel closed (caller dropped)");
        }
    }

    fn on_tick(&mut self) {
        if let Err(error) = self.world.advance() {
            warn!(target: "runtime::worker", %error, "auto tick failed");
            return;
        }
        self.publish_events();
    }

    fn publish_events(&mut self) {
        let tick = self.world.clock();
        for payload in self.world.drain_events() {
            self.event_bus.publish(Event::new(tick, payload));
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
