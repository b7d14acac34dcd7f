use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::skill::{SkillDefinition, SkillId, SkillLevel, TargetMask, UnitFlags, UnitSpec};
use crate::state::{EntityId, Position, StatusKind, Tick};
use crate::timer::TimerId;
use crate::unit::{GroupHandle, UnitCell};

/// All cells placed by one ground cast.
#[derive(Clone, Debug)]
pub struct UnitGroup {
    pub handle: GroupHandle,
    pub owner: EntityId,
    pub skill: SkillId,
    pub level: SkillLevel,
    pub definition: Arc<SkillDefinition>,
    pub target: TargetMask,
    pub anchor: Position,
    pub created_at: Tick,
    pub expires_at: Tick,
    pub interval: u64,
    /// Channel status on the owner that keeps this group alive.
    pub linked_status: Option<StatusKind>,
    pub timer: Option<TimerId>,
    cells: Vec<UnitCell>,
    alive_count: usize,
    tickset: BTreeMap<EntityId, Tick>,
    tickset_capacity: usize,
    occupants: BTreeSet<EntityId>,
    invalidated: bool,
}

impl UnitGroup {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        handle: GroupHandle,
        owner: EntityId,
        definition: Arc<SkillDefinition>,
        level: SkillLevel,
        anchor: Position,
        positions: &[Position],
        now: Tick,
        tickset_capacity: usize,
    ) -> Self {
        let spec = definition.unit.clone().unwrap_or_default();
        let expires_at = now + spec.lifetime_ms.get(level);
        let hits = spec.cell_hits.get(level);
        let cells: Vec<UnitCell> = positions
            .iter()
            .enumerate()
            .map(|(index, position)| {
                UnitCell::new(handle, index as u16, *position, expires_at).with_hits(hits)
            })
            .collect();

        Self {
            handle,
            owner,
            skill: definition.id,
            level,
            target: spec.target,
            interval: spec.interval_ms,
            linked_status: definition.channel,
            definition,
            anchor,
            created_at: now,
            expires_at,
            timer: None,
            alive_count: cells.len(),
            cells,
            tickset: BTreeMap::new(),
            tickset_capacity: tickset_capacity.max(1),
            occupants: BTreeSet::new(),
            invalidated: false,
        }
    }

    pub fn spec(&self) -> Option<&UnitSpec> {
        self.definition.unit.as_ref()
    }

    pub fn flags(&self) -> UnitFlags {
        self.spec().map(|spec| spec.flags).unwrap_or_default()
    }

    pub fn cells(&self) -> &[UnitCell] {
        &self.cells
    }

    pub fn cell(&self, index: u16) -> Option<&UnitCell> {
        self.cells.get(usize::from(index))
    }

    pub fn cell_mut(&mut self, index: u16) -> Option<&mut UnitCell> {
        self.cells.get_mut(usize::from(index))
    }

    pub fn live_cells(&self) -> impl Iterator<Item = &UnitCell> {
        self.cells.iter().filter(|cell| cell.alive)
    }

    pub fn alive_count(&self) -> usize {
        debug_assert_eq!(
            self.alive_count,
            self.cells.iter().filter(|cell| cell.alive).count(),
            "alive count drifted for {}",
            self.handle
        );
        self.alive_count
    }

    /// Live cell at `position`, if any.
    pub fn cell_at(&self, position: Position) -> Option<&UnitCell> {
        self.live_cells().find(|cell| cell.position == position)
    }

    pub fn covers(&self, position: Position) -> bool {
        self.cell_at(position).is_some()
    }

    /// Kills one cell. Returns `false` if it was already dead.
    pub fn kill_cell(&mut self, index: u16) -> bool {
        let Some(cell) = self.cells.get_mut(usize::from(index)) else {
            return false;
        };
        if !cell.alive {
            return false;
        }
        cell.alive = false;
        self.alive_count -= 1;
        true
    }

    /// Kills every cell whose lifetime ran out. Returns their indices.
    pub fn expire_cells(&mut self, now: Tick) -> Vec<u16> {
        let expired: Vec<u16> = self
            .live_cells()
            .filter(|cell| cell.expires_at <= now)
            .map(|cell| cell.index)
            .collect();
        for index in &expired {
            self.kill_cell(*index);
        }
        expired
    }

    /// Kills every remaining cell. Returns the positions they occupied.
    pub fn destroy(&mut self) -> Vec<Position> {
        let positions: Vec<Position> = self.live_cells().map(|cell| cell.position).collect();
        for cell in &mut self.cells {
            cell.alive = false;
        }
        self.alive_count = 0;
        self.invalidated = true;
        positions
    }

    /// Marks the group for removal at the end of the current operation.
    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    // ===== re-trigger bookkeeping =====

    /// Whether `entity` may be triggered again at `now`.
    pub fn can_trigger(&self, entity: EntityId, now: Tick) -> bool {
        match self.tickset.get(&entity) {
            Some(last) => now.since(*last) >= self.interval.max(1),
            None => true,
        }
    }

    /// Records a trigger. Once the table reaches its capacity, entries whose
    /// interval has elapsed are pruned first. An entry still inside its
    /// interval is never dropped, so the table grows with the occupants.
    pub fn mark_triggered(&mut self, entity: EntityId, now: Tick) {
        if !self.tickset.contains_key(&entity) && self.tickset.len() >= self.tickset_capacity {
            let interval = self.interval.max(1);
            self.tickset.retain(|_, last| now.since(*last) < interval);
        }
        self.tickset.insert(entity, now);
    }

    pub fn tickset_len(&self) -> usize {
        self.tickset.len()
    }

    // ===== occupancy =====

    pub fn occupants(&self) -> &BTreeSet<EntityId> {
        &self.occupants
    }

    /// Returns `true` if the entity was not inside before.
    pub fn enter(&mut self, entity: EntityId) -> bool {
        self.occupants.insert(entity)
    }

    /// Returns `true` if the entity was inside. Its last trigger tick is
    /// kept, so stepping out and back in does not reset the interval.
    pub fn leave(&mut self, entity: EntityId) -> bool {
        self.occupants.remove(&entity)
    }
}
