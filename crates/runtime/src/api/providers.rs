//! Asynchronous abstraction for sourcing monster and scripted casts.
//!
//! Runtime users plug in [`CastProvider`] implementations so AI decisions go
//! through the same entry point as player requests.
use async_trait::async_trait;
use game_core::{ActorState, CastRequest, Tick};
use std::collections::VecDeque;
use std::sync::Mutex;

use super::errors::Result;

/// Trait for deciding what an actor casts next.
///
/// Different implementations can handle:
/// - Monster AI decisions
/// - Scripted/replayed casts
/// - Testing fixtures
#[async_trait]
pub trait CastProvider: Send + Sync {
    /// Whether this provider drives `actor`.
    fn controls(&self, actor: &ActorState) -> bool;

    /// Decide a cast for `actor`, or `None` to do nothing this step.
    async fn provide_cast(&self, actor: &ActorState, now: Tick) -> Result<Option<CastRequest>>;
}

/// A provider that never casts.
pub struct IdleCastProvider;

#[async_trait]
impl CastProvider for IdleCastProvider {
    fn controls(&self, _actor: &ActorState) -> bool {
        false
    }

    async fn provide_cast(&self, _actor: &ActorState, _now: Tick) -> Result<Option<CastRequest>> {
        Ok(None)
    }
}

/// Replays a fixed queue of requests, one per step, for the casters they name.
pub struct ScriptedCastProvider {
    queue: Mutex<VecDeque<CastRequest>>,
}

impl ScriptedCastProvider {
    pub fn new(requests: impl IntoIterator<Item = CastRequest>) -> Self {
        Self {
            queue: Mutex::new(requests.into_iter().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().map_or(0, |queue| queue.len())
    }
}

#[async_trait]
impl CastProvider for ScriptedCastProvider {
    fn controls(&self, actor: &ActorState) -> bool {
        self.queue
            .lock()
            .is_ok_and(|queue| queue.iter().any(|request| request.caster == actor.id))
    }

    async fn provide_cast(&self, actor: &ActorState, _now: Tick) -> Result<Option<CastRequest>> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| super::errors::RuntimeError::Provider("script queue poisoned".into()))?;
        let Some(index) = queue.iter().position(|request| request.caster == actor.id) else {
            return Ok(None);
        };
        Ok(queue.remove(index))
    }
}
