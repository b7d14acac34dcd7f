//! Per-skill logic that does not fit in data.
//!
//! Each hook has a no-op default, so a skill only implements the quirks it
//! actually has. Hooks are pure: they read a [`HookContext`] and return
//! [`SideEffect`]s that the world applies afterwards, which keeps every
//! skill's special case testable in isolation.

use std::collections::HashMap;
use std::sync::Arc;

use crate::combat::KnockbackDirection;
use crate::skill::{SkillDefinition, SkillId, SkillLevel};
use crate::state::{ActorState, StatusKind, Tick};

/// Read-only view handed to per-skill hooks.
#[derive(Clone, Copy, Debug)]
pub struct HookContext<'a> {
    pub definition: &'a SkillDefinition,
    pub level: SkillLevel,
    pub caster: &'a ActorState,
    pub target: Option<&'a ActorState>,
    pub now: Tick,
    pub in_combo: bool,
}

/// Who a side effect applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectSubject {
    Caster,
    Target,
}

/// State change requested by a hook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SideEffect {
    ApplyStatus {
        on: EffectSubject,
        kind: StatusKind,
        duration_ms: u64,
        value: i32,
    },
    RemoveStatus {
        on: EffectSubject,
        kind: StatusKind,
    },
    RestoreHp {
        on: EffectSubject,
        amount: u32,
    },
    /// Drains spell points; `None` drains everything.
    DrainSp {
        on: EffectSubject,
        amount: Option<u32>,
    },
    /// Consumes caster charges beyond the listed requirement.
    ConsumeCharges {
        amount: u8,
    },
}

/// Result of one resolved hit, as seen by hooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct HitSummary {
    pub damage: u32,
    pub hits: u8,
    pub missed: bool,
    pub killed: bool,
}

/// What a footprint cell should do for an actor it is about to trigger on.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum UnitPlaceAction {
    /// Run the footprint's data-driven effect.
    #[default]
    Default,
    /// Do nothing; the trigger does not count against the cell.
    Skip,
    /// Apply these effects instead of the data-driven effect.
    Replace(Vec<SideEffect>),
}

/// Polymorphic per-skill capabilities, looked up by skill id.
pub trait SkillBehavior: Send + Sync {
    /// Final damage ratio in percent, given the level table's ratio.
    fn compute_damage_ratio(&self, _ctx: &HookContext<'_>, base_ratio: u32) -> u32 {
        base_ratio
    }

    /// Extra effects after a hit landed (or missed).
    fn apply_additional_effects(&self, _ctx: &HookContext<'_>, _hit: &HitSummary) -> Vec<SideEffect> {
        Vec::new()
    }

    /// Extra effects when a cast completes successfully.
    fn on_cast_end(&self, _ctx: &HookContext<'_>) -> Vec<SideEffect> {
        Vec::new()
    }

    /// Called before a footprint cell triggers on an actor.
    fn on_unit_place(&self, _ctx: &HookContext<'_>) -> UnitPlaceAction {
        UnitPlaceAction::Default
    }

    fn knockback_direction(&self) -> KnockbackDirection {
        KnockbackDirection::AwayFromSource
    }

    /// Knockback is dropped when total damage is lower than the hit count.
    fn zero_knockback_below_hit_count(&self) -> bool {
        false
    }
}

/// Behavior of every skill without special cases.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultBehavior;

impl SkillBehavior for DefaultBehavior {}

/// Lookup table from skill id to behavior.
#[derive(Clone)]
pub struct BehaviorTable {
    behaviors: HashMap<SkillId, Arc<dyn SkillBehavior>>,
    fallback: Arc<dyn SkillBehavior>,
}

impl BehaviorTable {
    pub fn empty() -> Self {
        Self {
            behaviors: HashMap::new(),
            fallback: Arc::new(DefaultBehavior),
        }
    }

    /// Table with every built-in behavior from [`catalog`](crate::skill::catalog).
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        crate::skill::catalog::register_builtin(&mut table);
        table
    }

    pub fn register(&mut self, skill: SkillId, behavior: impl SkillBehavior + 'static) {
        self.behaviors.insert(skill, Arc::new(behavior));
    }

    /// Behavior for `skill`, falling back to [`DefaultBehavior`].
    pub fn get(&self, skill: SkillId) -> Arc<dyn SkillBehavior> {
        self.behaviors
            .get(&skill)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub fn has_custom(&self, skill: SkillId) -> bool {
        self.behaviors.contains_key(&skill)
    }
}

impl Default for BehaviorTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for BehaviorTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.behaviors.keys().collect();
        ids.sort();
        f.debug_struct("BehaviorTable").field("custom", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    impl SkillBehavior for Doubler {
        fn compute_damage_ratio(&self, _ctx: &HookContext<'_>, base_ratio: u32) -> u32 {
            base_ratio * 2
        }
    }

    #[test]
    fn unknown_skills_use_the_default() {
        let table = BehaviorTable::empty();
        assert!(!table.has_custom(SkillId(9)));
        assert!(!table.get(SkillId(9)).zero_knockback_below_hit_count());
    }

    #[test]
    fn registered_behavior_is_returned() {
        use crate::skill::CastKind;
        use crate::state::{ActorKind, EntityId, Position};

        let mut table = BehaviorTable::empty();
        table.register(SkillId(9), Doubler);

        let definition = SkillDefinition::new(SkillId(9), "Double", CastKind::Targeted);
        let caster = ActorState::new(EntityId(1), ActorKind::Player, Position::ORIGIN);
        let ctx = HookContext {
            definition: &definition,
            level: 1,
            caster: &caster,
            target: None,
            now: Tick::ZERO,
            in_combo: false,
        };
        assert_eq!(table.get(SkillId(9)).compute_damage_ratio(&ctx, 150), 300);
    }
}
