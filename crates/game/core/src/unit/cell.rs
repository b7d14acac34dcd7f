use crate::state::{EntityId, Position, Tick};
use crate::unit::GroupHandle;

/// Per-cell scratch slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellPayload {
    #[default]
    Empty,
    /// The cell holds this entity (snare-type traps).
    Latched(EntityId),
    /// Released; the cell lingers until it expires but no longer triggers.
    Spent,
}

/// One tile of a footprint.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitCell {
    pub group: GroupHandle,
    pub index: u16,
    pub position: Position,
    pub expires_at: Tick,
    pub payload: CellPayload,
    /// Triggers left before the cell dies; `None` is unlimited.
    pub hits_left: Option<u16>,
    pub alive: bool,
}

impl UnitCell {
    pub fn new(group: GroupHandle, index: u16, position: Position, expires_at: Tick) -> Self {
        Self {
            group,
            index,
            position,
            expires_at,
            payload: CellPayload::Empty,
            hits_left: None,
            alive: true,
        }
    }

    pub fn with_hits(mut self, hits: u16) -> Self {
        self.hits_left = (hits > 0).then_some(hits);
        self
    }

    pub fn latched(&self) -> Option<EntityId> {
        match self.payload {
            CellPayload::Latched(entity) => Some(entity),
            CellPayload::Empty | CellPayload::Spent => None,
        }
    }

    /// Whether the cell may still trigger on a new actor.
    pub fn is_armed(&self) -> bool {
        self.alive && self.payload == CellPayload::Empty
    }

    /// Consumes one hit. Returns `true` when the budget ran out.
    pub fn consume_hit(&mut self) -> bool {
        match self.hits_left.as_mut() {
            Some(left) => {
                *left = left.saturating_sub(1);
                *left == 0
            }
            None => false,
        }
    }
}
