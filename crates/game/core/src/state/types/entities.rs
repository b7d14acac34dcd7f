use std::collections::BTreeMap;

use crate::state::{ActorState, EntityId, Position};

/// All actors known to the world, ordered by id for deterministic iteration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntitiesState {
    actors: BTreeMap<EntityId, ActorState>,
}

impl EntitiesState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: EntityId) -> Option<&ActorState> {
        self.actors.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut ActorState> {
        self.actors.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Inserts an actor, returning false if the id is taken.
    pub fn insert(&mut self, actor: ActorState) -> bool {
        if self.actors.contains_key(&actor.id) {
            return false;
        }
        self.actors.insert(actor.id, actor);
        true
    }

    pub fn remove(&mut self, id: EntityId) -> Option<ActorState> {
        self.actors.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActorState> {
        self.actors.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ActorState> {
        self.actors.values_mut()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.actors.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Living actors standing on `position`.
    pub fn alive_at(&self, position: Position) -> Vec<EntityId> {
        self.actors
            .values()
            .filter(|a| a.position == position && a.is_alive())
            .map(|a| a.id)
            .collect()
    }

    /// Living actors within a square radius of `center`.
    pub fn alive_within(&self, center: Position, radius: u32) -> Vec<EntityId> {
        self.actors
            .values()
            .filter(|a| a.is_alive() && a.position.within(center, radius))
            .map(|a| a.id)
            .collect()
    }
}
