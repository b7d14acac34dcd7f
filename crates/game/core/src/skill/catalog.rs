//! Built-in skill ids and the behaviors of skills with special cases.
//!
//! Numeric parameters live in the content tables; only logic is here.

use crate::combat::KnockbackDirection;
use crate::skill::behavior::{
    BehaviorTable, EffectSubject, HitSummary, HookContext, SideEffect, SkillBehavior,
    UnitPlaceAction,
};
use crate::skill::SkillId;
use crate::state::StatusKind;

pub const BASH: SkillId = SkillId(5);
pub const MAGNUM_BREAK: SkillId = SkillId(7);
pub const COLD_BOLT: SkillId = SkillId(14);
pub const FROST_DIVER: SkillId = SkillId(15);
pub const FIRE_WALL: SkillId = SkillId(18);
pub const FIRE_BOLT: SkillId = SkillId(19);
pub const HEAL: SkillId = SkillId(28);
pub const ARROW_SHOWER: SkillId = SkillId(47);
pub const SANCTUARY: SkillId = SkillId(70);
pub const JUPITEL_THUNDER: SkillId = SkillId(84);
pub const STORM_GUST: SkillId = SkillId(89);
pub const ANKLE_SNARE: SkillId = SkillId(117);
pub const CHARGE_ARROW: SkillId = SkillId(148);
pub const TRIPLE_ATTACK: SkillId = SkillId(263);
pub const EXTREMITY_FIST: SkillId = SkillId(271);
pub const CHAIN_COMBO: SkillId = SkillId(272);
pub const VOLCANO: SkillId = SkillId(285);
pub const DELUGE: SkillId = SkillId(286);
pub const VIOLENT_GALE: SkillId = SkillId(287);
pub const LAND_PROTECTOR: SkillId = SkillId(288);
pub const POEM_OF_BRAGI: SkillId = SkillId(319);

/// Follow-up window opened by combo starters.
pub const COMBO_WINDOW_MS: u64 = 1_500;

/// Registers every behavior below into `table`.
pub fn register_builtin(table: &mut BehaviorTable) {
    table.register(MAGNUM_BREAK, MagnumBreak);
    table.register(ARROW_SHOWER, ArrowShower);
    table.register(SANCTUARY, Sanctuary);
    table.register(CHARGE_ARROW, ChargeArrow);
    table.register(TRIPLE_ATTACK, ComboStarter);
    table.register(CHAIN_COMBO, ComboStarter);
    table.register(EXTREMITY_FIST, ExtremityFist);
}

/// Grants the caster a fire attack bonus after the blast.
pub struct MagnumBreak;

impl SkillBehavior for MagnumBreak {
    fn on_cast_end(&self, _ctx: &HookContext<'_>) -> Vec<SideEffect> {
        vec![SideEffect::ApplyStatus {
            on: EffectSubject::Caster,
            kind: StatusKind::AttackBoost,
            duration_ms: 10_000,
            value: 20,
        }]
    }
}

/// Arrows that deal less total damage than their hit count do not push.
pub struct ArrowShower;

impl SkillBehavior for ArrowShower {
    fn zero_knockback_below_hit_count(&self) -> bool {
        true
    }
}

/// Pushes the target backwards along its own facing.
pub struct ChargeArrow;

impl SkillBehavior for ChargeArrow {
    fn knockback_direction(&self) -> KnockbackDirection {
        KnockbackDirection::BehindTarget
    }
}

/// Healing cells ignore actors that are already at full health.
pub struct Sanctuary;

impl SkillBehavior for Sanctuary {
    fn on_unit_place(&self, ctx: &HookContext<'_>) -> UnitPlaceAction {
        match ctx.target {
            Some(target) if target.hp.current >= target.hp.maximum => UnitPlaceAction::Skip,
            _ => UnitPlaceAction::Default,
        }
    }
}

/// Opens a combo window carrying this skill's id.
pub struct ComboStarter;

impl SkillBehavior for ComboStarter {
    fn on_cast_end(&self, ctx: &HookContext<'_>) -> Vec<SideEffect> {
        vec![SideEffect::ApplyStatus {
            on: EffectSubject::Caster,
            kind: StatusKind::Combo,
            duration_ms: COMBO_WINDOW_MS,
            value: ctx.definition.id.as_status_value(),
        }]
    }
}

/// Scales with the caster's remaining spell points, then drains them.
pub struct ExtremityFist;

impl SkillBehavior for ExtremityFist {
    fn compute_damage_ratio(&self, ctx: &HookContext<'_>, base_ratio: u32) -> u32 {
        base_ratio + 100 * (ctx.caster.sp.current / 10)
    }

    fn apply_additional_effects(&self, _ctx: &HookContext<'_>, _hit: &HitSummary) -> Vec<SideEffect> {
        vec![SideEffect::DrainSp {
            on: EffectSubject::Caster,
            amount: None,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::{CastKind, SkillDefinition};
    use crate::state::{ActorKind, ActorState, EntityId, Position, Tick};

    fn ctx<'a>(
        definition: &'a SkillDefinition,
        caster: &'a ActorState,
        target: Option<&'a ActorState>,
    ) -> HookContext<'a> {
        HookContext {
            definition,
            level: 1,
            caster,
            target,
            now: Tick::ZERO,
            in_combo: false,
        }
    }

    #[test]
    fn builtin_table_covers_special_cases() {
        let table = BehaviorTable::builtin();
        assert!(table.get(ARROW_SHOWER).zero_knockback_below_hit_count());
        assert!(!table.get(BASH).zero_knockback_below_hit_count());
        assert!(!table.get(FIRE_WALL).zero_knockback_below_hit_count());
        assert_eq!(
            table.get(CHARGE_ARROW).knockback_direction(),
            KnockbackDirection::BehindTarget
        );
    }

    #[test]
    fn combo_starter_records_its_own_id() {
        let definition = SkillDefinition::new(TRIPLE_ATTACK, "Triple Attack", CastKind::Targeted);
        let caster = ActorState::new(EntityId(1), ActorKind::Player, Position::ORIGIN);
        let effects = ComboStarter.on_cast_end(&ctx(&definition, &caster, None));
        assert_eq!(
            effects,
            vec![SideEffect::ApplyStatus {
                on: EffectSubject::Caster,
                kind: StatusKind::Combo,
                duration_ms: COMBO_WINDOW_MS,
                value: 263,
            }]
        );
    }

    #[test]
    fn extremity_fist_scales_with_sp() {
        let definition = SkillDefinition::new(EXTREMITY_FIST, "Extremity Fist", CastKind::Targeted);
        let caster =
            ActorState::new(EntityId(1), ActorKind::Player, Position::ORIGIN).with_sp(250, 300);
        assert_eq!(
            ExtremityFist.compute_damage_ratio(&ctx(&definition, &caster, None), 800),
            800 + 2_500
        );
    }

    #[test]
    fn sanctuary_skips_healthy_actors() {
        let definition = SkillDefinition::new(SANCTUARY, "Sanctuary", CastKind::Ground);
        let caster = ActorState::new(EntityId(1), ActorKind::Player, Position::ORIGIN);
        let healthy = ActorState::new(EntityId(2), ActorKind::Player, Position::ORIGIN);
        let hurt = healthy.clone().with_hp(40, 100);

        assert_eq!(
            Sanctuary.on_unit_place(&ctx(&definition, &caster, Some(&healthy))),
            UnitPlaceAction::Skip
        );
        assert_eq!(
            Sanctuary.on_unit_place(&ctx(&definition, &caster, Some(&hurt))),
            UnitPlaceAction::Default
        );
    }
}
