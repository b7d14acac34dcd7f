use std::fmt;

/// Generation-tagged reference to a [`UnitGroup`](super::UnitGroup).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupHandle {
    pub id: u32,
    pub generation: u32,
}

impl GroupHandle {
    pub const fn new(id: u32, generation: u32) -> Self {
        Self { id, generation }
    }
}

impl fmt::Display for GroupHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group:{}@{}", self.id, self.generation)
    }
}
