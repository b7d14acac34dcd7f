use std::fmt;

/// Numeric skill identifier, stable across reloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SkillId(pub u16);

impl SkillId {
    /// Combo windows store the opener's id in a status value.
    pub const fn as_status_value(self) -> i32 {
        self.0 as i32
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skill:{}", self.0)
    }
}

/// One-based skill level.
pub type SkillLevel = u8;
