use std::collections::HashMap;
use std::sync::Arc;

use crate::cast::{CastSession, CastTarget, SessionId};
use crate::condition::ConditionError;
use crate::skill::{SkillDefinition, SkillLevel};
use crate::state::{EntityId, Tick};
use crate::world::{ExhaustionError, SkillError};

/// Live cast sessions, at most one per caster.
#[derive(Debug)]
pub struct SessionTable {
    sessions: HashMap<EntityId, CastSession>,
    next_id: u64,
    capacity: usize,
}

impl SessionTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            next_id: 1,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, caster: EntityId) -> Option<&CastSession> {
        self.sessions.get(&caster)
    }

    pub fn get_mut(&mut self, caster: EntityId) -> Option<&mut CastSession> {
        self.sessions.get_mut(&caster)
    }

    pub fn is_full(&self) -> bool {
        self.sessions.len() >= self.capacity
    }

    pub fn is_casting(&self, caster: EntityId) -> bool {
        self.sessions
            .get(&caster)
            .is_some_and(CastSession::is_active)
    }

    /// Creates an idle session for `caster`.
    ///
    /// Fails without touching the table if the caster already has a session or
    /// the table is full.
    pub fn open(
        &mut self,
        caster: EntityId,
        target: CastTarget,
        definition: Arc<SkillDefinition>,
        level: SkillLevel,
        now: Tick,
    ) -> Result<&mut CastSession, SkillError> {
        if self.sessions.contains_key(&caster) {
            return Err(ConditionError::AlreadyCasting.into());
        }
        if self.sessions.len() >= self.capacity {
            return Err(ExhaustionError::TooManySessions {
                limit: self.capacity,
            }
            .into());
        }

        let id = SessionId(self.next_id);
        self.next_id += 1;
        let session = CastSession::new(id, caster, target, definition, level, now);
        Ok(self.sessions.entry(caster).or_insert(session))
    }

    /// Removes the caster's session if it is `id`.
    pub fn close(&mut self, caster: EntityId, id: SessionId) -> Option<CastSession> {
        if self.sessions.get(&caster)?.id != id {
            return None;
        }
        self.sessions.remove(&caster)
    }

    pub fn remove(&mut self, caster: EntityId) -> Option<CastSession> {
        self.sessions.remove(&caster)
    }

    pub fn casters(&self) -> Vec<EntityId> {
        let mut casters: Vec<_> = self.sessions.keys().copied().collect();
        casters.sort();
        casters
    }

    pub fn iter(&self) -> impl Iterator<Item = &CastSession> {
        self.sessions.values()
    }
}
