use std::collections::HashMap;

use crate::skill::SkillId;
use crate::state::EntityId;
use crate::unit::{GroupHandle, UnitGroup};
use crate::world::ExhaustionError;

#[derive(Debug)]
struct Slot {
    generation: u32,
    group: UnitGroup,
}

/// Live groups keyed by numeric id, with per-id generations.
///
/// Ids come from a wrapping counter in `1..=bound`. Every reuse of an id bumps
/// its generation, so handles built before the wrap no longer resolve.
#[derive(Debug)]
pub struct GroupPool {
    slots: HashMap<u32, Slot>,
    generations: HashMap<u32, u32>,
    next_id: u32,
    bound: u32,
    capacity: usize,
}

impl GroupPool {
    pub fn new(bound: u32, capacity: usize) -> Self {
        Self {
            slots: HashMap::new(),
            generations: HashMap::new(),
            next_id: 1,
            bound: bound.max(1),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn has_room(&self) -> bool {
        self.slots.len() < self.capacity && self.slots.len() < self.bound as usize
    }

    /// Reserves an id and stores the group `build` returns for it.
    pub fn insert_with(
        &mut self,
        build: impl FnOnce(GroupHandle) -> UnitGroup,
    ) -> Result<GroupHandle, ExhaustionError> {
        if self.slots.len() >= self.capacity {
            return Err(ExhaustionError::TooManyGroups {
                limit: self.capacity,
            });
        }
        let id = self.next_free_id().ok_or(ExhaustionError::GroupIdsExhausted {
            bound: self.bound,
        })?;

        let generation = match self.generations.get(&id) {
            Some(previous) => previous.wrapping_add(1),
            None => 0,
        };
        let handle = GroupHandle::new(id, generation);

        if self.slots.contains_key(&id) {
            debug_assert!(false, "group id collision on {handle}");
            tracing::error!(target: "skill::unit", group = %handle, "group id collision");
            return Err(ExhaustionError::GroupIdsExhausted { bound: self.bound });
        }

        self.generations.insert(id, generation);
        self.slots.insert(
            id,
            Slot {
                generation,
                group: build(handle),
            },
        );
        Ok(handle)
    }

    pub fn get(&self, handle: GroupHandle) -> Option<&UnitGroup> {
        self.slots
            .get(&handle.id)
            .filter(|slot| slot.generation == handle.generation)
            .map(|slot| &slot.group)
    }

    pub fn get_mut(&mut self, handle: GroupHandle) -> Option<&mut UnitGroup> {
        self.slots
            .get_mut(&handle.id)
            .filter(|slot| slot.generation == handle.generation)
            .map(|slot| &mut slot.group)
    }

    pub fn contains(&self, handle: GroupHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn remove(&mut self, handle: GroupHandle) -> Option<UnitGroup> {
        if !self.contains(handle) {
            return None;
        }
        self.slots.remove(&handle.id).map(|slot| slot.group)
    }

    /// Handles of every live group, in id order.
    pub fn handles(&self) -> Vec<GroupHandle> {
        let mut handles: Vec<GroupHandle> = self
            .slots
            .iter()
            .map(|(id, slot)| GroupHandle::new(*id, slot.generation))
            .collect();
        handles.sort();
        handles
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitGroup> {
        self.slots.values().map(|slot| &slot.group)
    }

    pub fn owned_by(&self, owner: EntityId) -> Vec<GroupHandle> {
        let mut handles: Vec<GroupHandle> = self
            .iter()
            .filter(|group| group.owner == owner)
            .map(|group| group.handle)
            .collect();
        handles.sort();
        handles
    }

    /// Groups of `skill` owned by `owner` that are not already on their way out.
    pub fn count_for(&self, owner: EntityId, skill: SkillId) -> usize {
        self.iter()
            .filter(|group| group.owner == owner && group.skill == skill && !group.is_invalidated())
            .count()
    }

    fn next_free_id(&mut self) -> Option<u32> {
        for _ in 0..self.bound {
            let id = self.next_id;
            self.next_id = if self.next_id >= self.bound {
                1
            } else {
                self.next_id + 1
            };
            if !self.slots.contains_key(&id) {
                return Some(id);
            }
        }
        None
    }
}
