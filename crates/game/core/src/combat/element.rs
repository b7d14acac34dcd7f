//! Elements, races and sizes, and the attack-versus-defense element table.

/// Attack and defense elements.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, strum::Display, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Element {
    #[default]
    Neutral,
    Water,
    Earth,
    Fire,
    Wind,
    Poison,
    Holy,
    Shadow,
    Ghost,
    Undead,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Race {
    #[default]
    Formless,
    Undead,
    Brute,
    Plant,
    Insect,
    Fish,
    Demon,
    DemiHuman,
    Angel,
    Dragon,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Size {
    Small,
    #[default]
    Medium,
    Large,
}

// Rows: attack element. Columns: defense element, same order as `Element`.
const ELEMENT_TABLE: [[i32; 10]; 10] = [
    // Ne   Wa   Ea   Fi   Wi   Po   Ho   Sh   Gh   Un
    [100, 100, 100, 100, 100, 100, 100, 100, 25, 100], // Neutral
    [100, 25, 100, 150, 50, 100, 75, 100, 100, 100],   // Water
    [100, 100, 25, 50, 150, 100, 75, 100, 100, 100],   // Earth
    [100, 50, 150, 25, 100, 100, 75, 100, 100, 125],   // Fire
    [100, 175, 50, 100, 25, 100, 75, 100, 100, 100],   // Wind
    [100, 100, 125, 125, 125, 0, 75, 50, 100, -25],    // Poison
    [100, 100, 100, 100, 100, 100, 0, 125, 100, 150],  // Holy
    [100, 100, 100, 100, 100, 50, 125, 0, 100, -25],   // Shadow
    [25, 100, 100, 100, 100, 100, 75, 75, 125, 100],   // Ghost
    [100, 100, 100, 100, 100, 50, 100, 0, 100, 0],     // Undead
];

/// Damage multiplier in percent for `attack` hitting a `defense` element.
///
/// Negative entries (which would heal the target) clamp to zero.
pub fn element_modifier(attack: Element, defense: Element) -> u32 {
    ELEMENT_TABLE[attack as usize][defense as usize].max(0) as u32
}
