//! Damage calculation for skill hits.
//!
//! # Pipeline
//!
//! ```text
//! base     = stat-derived attack (physical / magical)
//! scaled   = base × ratio% + flat
//! element  = scaled × element_table[skill element][target element]%
//! bonus    = element × (100 + race% + size% + element%)%   (equipment)
//! total    = mitigate(bonus)                               (def/vit or mdef/int)
//! ```
//!
//! `total` is the damage of the whole skill hit; it is split evenly across
//! `hits` for presentation.

use crate::combat::element::element_modifier;
use crate::combat::Element;
use crate::state::{ActorState, StatusKind, Tick};

/// What a skill hit deals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageKind {
    #[default]
    Physical,
    Magical,
    /// Fixed damage: ignores stats, equipment bonuses and mitigation.
    Misc,
    /// Restores health instead of removing it.
    Heal,
}

/// Inputs for one hit.
#[derive(Clone, Copy, Debug)]
pub struct DamageInput<'a> {
    pub kind: DamageKind,
    /// Skill ratio in percent.
    pub ratio: u32,
    pub hits: u8,
    pub element: Element,
    /// Added after the ratio (misc damage, flat heal).
    pub flat: u32,
    pub attacker: &'a ActorState,
    pub defender: &'a ActorState,
    pub now: Tick,
}

/// Intermediate values, kept for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DamageBreakdown {
    pub base: u32,
    pub scaled: u32,
    pub element_pct: u32,
    pub bonus_pct: i32,
    pub total: u32,
    pub per_hit: u32,
    pub hits: u8,
}

/// Stat-derived base before the skill ratio.
pub fn base_damage(kind: DamageKind, attacker: &ActorState, now: Tick) -> u32 {
    let stats = &attacker.stats;
    match kind {
        DamageKind::Physical => {
            let str_bonus = u32::from(stats.strength / 10).pow(2);
            let boost = attacker.statuses.value_of(StatusKind::AttackBoost, now).max(0) as u32;
            stats.attack + u32::from(stats.strength) + str_bonus + boost
        }
        DamageKind::Magical => {
            let int_bonus = u32::from(stats.intelligence / 7).pow(2);
            stats.magic_attack + u32::from(stats.intelligence) + int_bonus
        }
        DamageKind::Heal => u32::from(stats.level) + u32::from(stats.intelligence),
        DamageKind::Misc => 0,
    }
}

/// Runs the whole pipeline for one hit.
pub fn calculate(input: &DamageInput<'_>) -> DamageBreakdown {
    let base = base_damage(input.kind, input.attacker, input.now);
    let scaled = mul_pct(base, input.ratio).saturating_add(input.flat);
    let hits = input.hits.max(1);

    if matches!(input.kind, DamageKind::Heal | DamageKind::Misc) {
        return DamageBreakdown {
            base,
            scaled,
            element_pct: 100,
            bonus_pct: 0,
            total: scaled,
            per_hit: scaled / u32::from(hits),
            hits,
        };
    }

    let element_pct = element_modifier(input.element, input.defender.element);
    let after_element = mul_pct(scaled, element_pct);

    let bonus_pct = equipment_bonus(input.attacker, input.defender, input.kind);
    let boosted = mul_pct(after_element, (100 + bonus_pct).max(0) as u32);

    let mut total = mitigate(boosted, input.kind, input.defender);
    if total == 0 && scaled > 0 && element_pct > 0 {
        total = 1;
    }

    DamageBreakdown {
        base,
        scaled,
        element_pct,
        bonus_pct,
        total,
        per_hit: total / u32::from(hits),
        hits,
    }
}

fn equipment_bonus(attacker: &ActorState, defender: &ActorState, kind: DamageKind) -> i32 {
    if kind != DamageKind::Physical {
        return 0;
    }
    let bonuses = &attacker.bonuses;
    bonuses.versus_race.get(&defender.race).copied().unwrap_or(0)
        + bonuses.versus_size.get(&defender.size).copied().unwrap_or(0)
        + bonuses
            .versus_element
            .get(&defender.element)
            .copied()
            .unwrap_or(0)
}

fn mitigate(damage: u32, kind: DamageKind, defender: &ActorState) -> u32 {
    let stats = &defender.stats;
    let (reduction_pct, flat) = match kind {
        DamageKind::Physical => (stats.defense.min(99), u32::from(stats.vitality / 2)),
        DamageKind::Magical => (stats.magic_defense.min(99), u32::from(stats.intelligence / 2)),
        DamageKind::Misc | DamageKind::Heal => (0, 0),
    };
    mul_pct(damage, 100 - reduction_pct).saturating_sub(flat)
}

fn mul_pct(value: u32, pct: u32) -> u32 {
    (u64::from(value) * u64::from(pct) / 100).min(u64::from(u32::MAX)) as u32
}
