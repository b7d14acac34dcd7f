//! Per-skill, per-level parameters.
//!
//! A [`SkillDefinition`] is plain data authored in RON and never mutated after
//! load. Per-skill logic that does not fit in data lives in
//! [`SkillBehavior`](crate::skill::SkillBehavior) implementations keyed by id.

use bitflags::bitflags;

use crate::combat::{DamageKind, Element};
use crate::config::GameConfig;
use crate::env::ZoneFlags;
use crate::skill::{SkillId, SkillLevel, UnitLayout};
use crate::state::{ItemId, Relation, StatusKind, WeaponClass};

// ============================================================================
// Level tables
// ============================================================================

/// Values indexed by skill level.
///
/// Level 1 reads index 0. Levels past the end of the table reuse the last
/// entry, so a single-entry table is a constant.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct LevelTable<T>(pub Vec<T>);

impl<T> LevelTable<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self(values)
    }

    pub fn constant(value: T) -> Self {
        Self(vec![value])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn at(&self, level: SkillLevel) -> Option<&T> {
        if self.0.is_empty() {
            return None;
        }
        let index = usize::from(level.max(1) - 1).min(self.0.len() - 1);
        self.0.get(index)
    }
}

impl<T: Copy + Default> LevelTable<T> {
    /// Value at `level`, or `T::default()` for an empty table.
    pub fn get(&self, level: SkillLevel) -> T {
        self.at(level).copied().unwrap_or_default()
    }
}

impl LevelTable<u32> {
    /// `start, start + step, ...` for `levels` levels.
    pub fn linear(start: u32, step: u32, levels: u8) -> Self {
        Self((0..u32::from(levels)).map(|i| start + step * i).collect())
    }
}

impl LevelTable<u64> {
    pub fn linear(start: u64, step: u64, levels: u8) -> Self {
        Self((0..u64::from(levels)).map(|i| start + step * i).collect())
    }
}

impl<T> From<Vec<T>> for LevelTable<T> {
    fn from(values: Vec<T>) -> Self {
        Self(values)
    }
}

// ============================================================================
// Flags
// ============================================================================

bitflags! {
    /// Which actors a skill or footprint may affect, relative to its user.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct TargetMask: u8 {
        const SELF = 1 << 0;
        const ENEMY = 1 << 1;
        const PARTY = 1 << 2;
        const GUILD = 1 << 3;
        /// Same team, regardless of party or guild.
        const ALLY = 1 << 4;

        const FRIEND = Self::SELF.bits() | Self::PARTY.bits() | Self::GUILD.bits() | Self::ALLY.bits();
    }
}

impl TargetMask {
    pub fn allows(self, relation: Relation) -> bool {
        (relation.is_self && self.contains(TargetMask::SELF))
            || (relation.enemy && self.contains(TargetMask::ENEMY))
            || (relation.party && self.contains(TargetMask::PARTY))
            || (relation.guild && self.contains(TargetMask::GUILD))
            || (!relation.is_self && !relation.enemy && self.contains(TargetMask::ALLY))
    }

    pub fn is_offensive(self) -> bool {
        self.contains(TargetMask::ENEMY)
    }
}

bitflags! {
    /// Per-skill casting behavior switches.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct SkillFlags: u16 {
        /// Taking damage while casting cancels the cast.
        const INTERRUPTIBLE = 1 << 0;
        /// Dexterity does not shorten the variable cast time.
        const IGNORE_DEX_CAST = 1 << 1;
        /// Dexterity does not shorten the post-cast delay.
        const IGNORE_DEX_DELAY = 1 << 2;
        /// Ground footprint is a trap (zone `NO_TRAP` applies).
        const TRAP = 1 << 3;
    }
}

bitflags! {
    /// Ground footprint behavior switches.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct UnitFlags: u16 {
        /// May not overlap a live cell of the same skill.
        const NO_REITERATION = 1 << 0;
        /// May not be placed on a cell an actor stands on.
        const NO_FOOTSET = 1 << 1;
        /// Every cell must be reachable from the anchor in a straight line.
        const PATH_CHECK = 1 << 2;
        /// Re-trigger interval is shared by all groups of this skill.
        const NO_OVERLAP = 1 << 3;
        /// Placing this footprint removes every other footprint it touches.
        const CLEANSE = 1 << 4;
        /// A blocked layout cell fails placement instead of being left out.
        const STRICT_TERRAIN = 1 << 5;
    }
}

bitflags! {
    /// Checks and costs a combo skill skips when used inside its window.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ComboWaiver: u8 {
        const RANGE = 1 << 0;
        const CAST_TIME = 1 << 1;
        const SP_COST = 1 << 2;
        const CHARGES = 1 << 3;
    }
}

// ============================================================================
// Definition parts
// ============================================================================

/// How a skill is aimed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastKind {
    #[default]
    Targeted,
    Ground,
    SelfCast,
}

/// When the resource cost is taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostTiming {
    /// Deducted as the cast starts; cancelling refunds nothing.
    AtCastStart,
    /// Deducted when the footprint is placed; an interrupted cast is free.
    AtPlacement,
}

impl CastKind {
    pub const fn cost_timing(self) -> CostTiming {
        match self {
            CastKind::Ground => CostTiming::AtPlacement,
            CastKind::Targeted | CastKind::SelfCast => CostTiming::AtCastStart,
        }
    }
}

/// When a skill's post-cast delay is skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DelayExemption {
    #[default]
    Never,
    /// Used as a combo follow-up.
    InCombo,
    /// The effect failed to resolve (target vanished, placement refused).
    OnFailure,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemCost {
    pub item: ItemId,
    pub amount: u32,
}

/// Everything a caster must have (and pay) to use a skill.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Requirements {
    pub hp: LevelTable<u32>,
    pub sp: LevelTable<u32>,
    /// Percent of maximum health.
    pub hp_rate: LevelTable<u8>,
    /// Percent of maximum spell points.
    pub sp_rate: LevelTable<u8>,
    pub zeny: LevelTable<u32>,
    pub items: Vec<ItemCost>,
    pub charges: LevelTable<u8>,
    /// Allowed weapon classes; empty means any.
    pub weapons: Vec<WeaponClass>,
    pub required_status: Option<StatusKind>,
    /// Zones in which the skill cannot be used.
    pub nocast_zones: ZoneFlags,
}

/// Damage (or healing) dealt on resolution.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DamageSpec {
    pub kind: DamageKind,
    /// Percent of the stat-derived base.
    pub ratio: LevelTable<u32>,
    pub flat: LevelTable<u32>,
    pub hits: LevelTable<u8>,
    pub element: Element,
    /// Splash radius around the primary target; zero hits the target only.
    pub area: LevelTable<u8>,
}

/// One row of a skill's status table.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEntry {
    pub kind: StatusKind,
    /// Chance in per-mille before resistance.
    #[cfg_attr(feature = "serde", serde(default))]
    pub chance: LevelTable<u16>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration: LevelTable<u64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: LevelTable<i32>,
    /// Applies to the caster instead of the target.
    #[cfg_attr(feature = "serde", serde(default))]
    pub on_caster: bool,
}

impl StatusEntry {
    pub fn new(kind: StatusKind, chance: LevelTable<u16>, duration: LevelTable<u64>) -> Self {
        Self {
            kind,
            chance,
            duration,
            value: LevelTable::default(),
            on_caster: false,
        }
    }

    pub fn with_value(mut self, value: LevelTable<i32>) -> Self {
        self.value = value;
        self
    }

    pub fn on_caster(mut self) -> Self {
        self.on_caster = true;
        self
    }
}

/// Follow-up rule for combo skills.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComboRule {
    /// Skill whose window this one continues.
    pub follows: SkillId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub waive: ComboWaiver,
}

/// What a footprint cell does to an actor it triggers on.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnitEffect {
    #[default]
    None,
    /// Runs the skill's damage pipeline with the cell as the source.
    Damage,
    Heal { amount: LevelTable<u32> },
    /// Latches onto the first actor and holds it; the cell is spent on release.
    Snare { duration: LevelTable<u64> },
    /// Applies a status for as long as the actor stays inside the footprint.
    ZoneStatus { kind: StatusKind, value: LevelTable<i32> },
}

/// Ground footprint parameters.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UnitSpec {
    pub layout: LevelTable<UnitLayout>,
    /// Re-trigger interval per (actor, group).
    pub interval_ms: u64,
    pub lifetime_ms: LevelTable<u64>,
    pub target: TargetMask,
    pub flags: UnitFlags,
    /// Concurrent groups per caster; empty uses the configured default.
    pub max_instances: LevelTable<u8>,
    /// Triggers a cell survives; zero means unlimited.
    pub cell_hits: LevelTable<u16>,
    pub effect: UnitEffect,
    /// Skills whose cells are destroyed together with ours on overlap.
    pub annihilates: Vec<SkillId>,
}

impl UnitSpec {
    pub fn layout_at(&self, level: SkillLevel) -> UnitLayout {
        self.layout.at(level).cloned().unwrap_or_default()
    }

    pub fn instance_cap(&self, level: SkillLevel, config: &GameConfig) -> usize {
        match self.max_instances.at(level) {
            Some(cap) => usize::from(*cap),
            None => config.max_groups_per_skill,
        }
    }
}

// ============================================================================
// Definition
// ============================================================================

/// Immutable parameters of one skill across all of its levels.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: String,
    pub max_level: SkillLevel,
    pub cast_kind: CastKind,
    pub target: TargetMask,
    pub range: LevelTable<u32>,
    /// Variable cast time, shortened by dexterity and reductions.
    pub cast_time: LevelTable<u64>,
    /// Fixed part of the cast, only removed by instant cast or combo waivers.
    pub fixed_cast: LevelTable<u64>,
    pub delay: LevelTable<u64>,
    pub cooldown: LevelTable<u64>,
    pub flags: SkillFlags,
    pub delay_exemption: DelayExemption,
    pub requirements: Requirements,
    pub damage: Option<DamageSpec>,
    /// Cells of knockback per hit.
    pub knockback: LevelTable<u8>,
    pub statuses: Vec<StatusEntry>,
    /// Extra timer-scheduled hits after the first.
    pub follow_up_hits: LevelTable<u8>,
    pub combo: Option<ComboRule>,
    pub unit: Option<UnitSpec>,
    /// Status kept on the caster while the footprint lives.
    pub channel: Option<StatusKind>,
}

impl SkillDefinition {
    pub fn new(id: SkillId, name: impl Into<String>, cast_kind: CastKind) -> Self {
        let target = match cast_kind {
            CastKind::SelfCast => TargetMask::SELF,
            CastKind::Targeted | CastKind::Ground => TargetMask::ENEMY,
        };
        Self {
            id,
            name: name.into(),
            max_level: GameConfig::MAX_SKILL_LEVEL,
            cast_kind,
            target,
            ..Self::default()
        }
    }

    pub fn with_max_level(mut self, max_level: SkillLevel) -> Self {
        self.max_level = max_level;
        self
    }

    pub fn with_range(mut self, range: LevelTable<u32>) -> Self {
        self.range = range;
        self
    }

    pub fn with_cast_time(mut self, cast_time: LevelTable<u64>) -> Self {
        self.cast_time = cast_time;
        self
    }

    pub fn with_delay(mut self, delay: LevelTable<u64>) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_sp(mut self, sp: LevelTable<u32>) -> Self {
        self.requirements.sp = sp;
        self
    }

    pub fn with_flags(mut self, flags: SkillFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_target(mut self, target: TargetMask) -> Self {
        self.target = target;
        self
    }

    pub fn with_damage(mut self, damage: DamageSpec) -> Self {
        self.damage = Some(damage);
        self
    }

    pub fn with_status(mut self, entry: StatusEntry) -> Self {
        self.statuses.push(entry);
        self
    }

    pub fn with_knockback(mut self, knockback: LevelTable<u8>) -> Self {
        self.knockback = knockback;
        self
    }

    pub fn with_unit(mut self, unit: UnitSpec) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn with_combo(mut self, combo: ComboRule) -> Self {
        self.combo = Some(combo);
        self
    }

    pub fn with_channel(mut self, status: StatusKind) -> Self {
        self.channel = Some(status);
        self
    }

    pub fn is_valid_level(&self, level: SkillLevel) -> bool {
        (1..=self.max_level).contains(&level)
    }

    pub fn cost_timing(&self) -> crate::skill::CostTiming {
        self.cast_kind.cost_timing()
    }

    pub fn is_interruptible(&self) -> bool {
        self.flags.contains(SkillFlags::INTERRUPTIBLE)
    }

    /// Largest table length, used to reject tables longer than `max_level`.
    pub(crate) fn longest_table(&self) -> (usize, &'static str) {
        let mut lengths = vec![
            (self.range.len(), "range"),
            (self.cast_time.len(), "cast_time"),
            (self.fixed_cast.len(), "fixed_cast"),
            (self.delay.len(), "delay"),
            (self.cooldown.len(), "cooldown"),
            (self.knockback.len(), "knockback"),
            (self.follow_up_hits.len(), "follow_up_hits"),
            (self.requirements.sp.len(), "requirements.sp"),
            (self.requirements.hp.len(), "requirements.hp"),
        ];
        if let Some(damage) = &self.damage {
            lengths.push((damage.ratio.len(), "damage.ratio"));
            lengths.push((damage.hits.len(), "damage.hits"));
        }
        if let Some(unit) = &self.unit {
            lengths.push((unit.layout.len(), "unit.layout"));
            lengths.push((unit.lifetime_ms.len(), "unit.lifetime_ms"));
        }
        lengths
            .into_iter()
            .max_by_key(|(len, _)| *len)
            .unwrap_or((0, "range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_table_clamps_to_last_entry() {
        let table = LevelTable::new(vec![10u32, 20, 30]);
        assert_eq!(table.get(1), 10);
        assert_eq!(table.get(3), 30);
        assert_eq!(table.get(9), 30);
        assert_eq!(LevelTable::<u32>::default().get(4), 0);
    }

    #[test]
    fn linear_tables() {
        assert_eq!(LevelTable::<u32>::linear(130, 30, 3).0, vec![130, 160, 190]);
        assert_eq!(LevelTable::<u64>::linear(700, 0, 2).0, vec![700, 700]);
    }

    #[test]
    fn target_mask_relations() {
        let enemy = Relation {
            is_self: false,
            enemy: true,
            party: false,
            guild: false,
        };
        let ally = Relation {
            is_self: false,
            enemy: false,
            party: false,
            guild: false,
        };
        assert!(TargetMask::ENEMY.allows(enemy));
        assert!(!TargetMask::ENEMY.allows(ally));
        assert!(TargetMask::FRIEND.allows(ally));
        assert!(!TargetMask::PARTY.allows(ally));
    }

    #[test]
    fn ground_skills_pay_on_placement() {
        assert_eq!(CastKind::Ground.cost_timing(), CostTiming::AtPlacement);
        assert_eq!(CastKind::Targeted.cost_timing(), CostTiming::AtCastStart);
        assert_eq!(CastKind::SelfCast.cost_timing(), CostTiming::AtCastStart);
    }
}
