//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! casting, stepping the world clock, or streaming events from specific
//! topics.
use tokio::sync::{broadcast, mpsc, oneshot};

use game_core::skill::ReloadSummary;
use game_core::{
    ActorState, CastRequest, CastTicket, EntityId, MoveKind, Position, SkillError, SkillId,
    SkillLevel, SkillTable, Tick, World,
};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    /// Submit a cast request. Rejections surface as [`RuntimeError::Skill`].
    pub async fn cast(&self, request: CastRequest) -> Result<CastTicket> {
        self.request(|reply| Command::Cast { request, reply })
            .await?
            .map_err(RuntimeError::from)
    }

    pub async fn use_skill_on_target(
        &self,
        caster: EntityId,
        skill: SkillId,
        level: SkillLevel,
        target: EntityId,
    ) -> Result<CastTicket> {
        self.cast(CastRequest::on_target(caster, skill, level, target))
            .await
    }

    pub async fn use_skill_on_ground(
        &self,
        caster: EntityId,
        skill: SkillId,
        level: SkillLevel,
        position: Position,
    ) -> Result<CastTicket> {
        self.cast(CastRequest::on_ground(caster, skill, level, position))
            .await
    }

    pub async fn use_skill_on_self(
        &self,
        caster: EntityId,
        skill: SkillId,
        level: SkillLevel,
    ) -> Result<CastTicket> {
        self.cast(CastRequest::on_self(caster, skill, level)).await
    }

    /// Cancel the caster's in-progress cast. Returns false if there was none.
    pub async fn cancel_cast(&self, caster: EntityId) -> Result<bool> {
        self.request(|reply| Command::CancelCast { caster, reply })
            .await?
            .map_err(RuntimeError::from)
    }

    pub async fn spawn_actor(&self, actor: ActorState) -> Result<()> {
        let actor = Box::new(actor);
        self.request(|reply| Command::Spawn { actor, reply })
            .await?
            .map_err(RuntimeError::from)
    }

    pub async fn move_actor(&self, id: EntityId, to: Position, kind: MoveKind) -> Result<()> {
        self.request(|reply| Command::Move { id, to, kind, reply })
            .await?
            .map_err(RuntimeError::from)
    }

    pub async fn remove_actor(&self, id: EntityId) -> Result<ActorState> {
        self.request(|reply| Command::Remove { id, reply })
            .await?
            .map_err(RuntimeError::from)
    }

    /// Report damage dealt outside the skill system; returns the hp lost.
    pub async fn notify_damage(&self, id: EntityId, amount: u32) -> Result<u32> {
        self.request(|reply| Command::NotifyDamage { id, amount, reply })
            .await?
            .map_err(RuntimeError::from)
    }

    /// Swap in a new skill table. Casts already in flight keep the old one.
    pub async fn reload_skills(&self, table: SkillTable) -> Result<ReloadSummary> {
        self.request(|reply| Command::ReloadSkills { table, reply })
            .await?
            .map_err(RuntimeError::from)
    }

    /// Advance the world clock by `ms` and return the new clock.
    pub async fn advance(&self, ms: u64) -> Result<Tick> {
        self.request(|reply| Command::Advance { ms, reply })
            .await?
            .map_err(RuntimeError::from)
    }

    /// Whether `id` is currently unable to start a cast.
    pub async fn is_blocked(&self, id: EntityId) -> Result<bool> {
        self.query(move |world| world.is_blocked(id)).await
    }

    pub async fn actor(&self, id: EntityId) -> Result<Option<ActorState>> {
        self.query(move |world| world.actor(id).cloned()).await
    }

    pub async fn clock(&self) -> Result<Tick> {
        self.query(World::clock).await
    }

    /// Run a read-only closure against the world on the worker task.
    pub async fn query<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&World) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let run = Box::new(move |world: &World| {
            let _ = reply_tx.send(f(world));
        });

        self.command_tx
            .send(Command::Query { run })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Cast` - Cast lifecycle events
    /// - `Topic::Combat` - Damage, healing, status and death
    /// - `Topic::Unit` - Ground footprint events
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut combat_rx = handle.subscribe(Topic::Combat);
    /// while let Ok(event) = combat_rx.recv().await {
    ///     // Handle combat events
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    ///
    /// Returns a map of topic to receiver for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub(crate) async fn shutdown(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Shutdown { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<std::result::Result<T, SkillError>>) -> Command,
    ) -> Result<std::result::Result<T, SkillError>> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }
}
