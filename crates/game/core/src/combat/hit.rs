//! Hit chance for physical skills.

/// Base hit chance before the accuracy/evasion difference.
pub const BASE_HIT_CHANCE: i64 = 80;
pub const MIN_HIT_CHANCE: i64 = 5;
pub const MAX_HIT_CHANCE: i64 = 95;

/// Hit chance in percent: `80 + hit - flee`, clamped to `[5, 95]`.
pub fn calculate_hit_chance(hit: u32, flee: u32) -> u32 {
    let chance = BASE_HIT_CHANCE + i64::from(hit) - i64::from(flee);
    chance.clamp(MIN_HIT_CHANCE, MAX_HIT_CHANCE) as u32
}

/// `roll` is a d100 result (1-100).
pub fn check_hit(hit: u32, flee: u32, roll: u32) -> bool {
    roll <= calculate_hit_chance(hit, flee)
}
