//! Cast time and post-cast delay.
//!
//! All arithmetic is unsigned and saturating; every modifier can only shrink a
//! duration towards zero.

use crate::config::GameConfig;
use crate::skill::{ComboWaiver, DelayExemption, SkillDefinition, SkillFlags, SkillLevel};
use crate::state::{ActorState, StatusKind, Tick};

/// How a cast ended, for delay exemptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastOutcome {
    Resolved,
    /// The effect could not be applied (target gone, placement refused).
    Failed,
}

/// Milliseconds between cast start and resolution.
pub fn cast_time(
    definition: &SkillDefinition,
    level: SkillLevel,
    caster: &ActorState,
    config: &GameConfig,
    now: Tick,
    in_combo: bool,
) -> u64 {
    if caster.statuses.has(StatusKind::InstantCast, now) {
        return 0;
    }
    if in_combo
        && definition
            .combo
            .is_some_and(|rule| rule.waive.contains(ComboWaiver::CAST_TIME))
    {
        return 0;
    }

    let mut variable = definition.cast_time.get(level);
    if !definition.flags.contains(SkillFlags::IGNORE_DEX_CAST) {
        variable = scale_by_dex(variable, caster, config);
    }
    variable = percent(variable, config.cast_rate);
    variable = reduce(variable, reduction_percent(caster, now, true));

    variable.saturating_add(definition.fixed_cast.get(level))
}

/// Milliseconds the caster is locked out after the cast ends.
pub fn post_cast_delay(
    definition: &SkillDefinition,
    level: SkillLevel,
    caster: &ActorState,
    config: &GameConfig,
    now: Tick,
    in_combo: bool,
    outcome: CastOutcome,
) -> u64 {
    match definition.delay_exemption {
        DelayExemption::InCombo if in_combo => return 0,
        DelayExemption::OnFailure if outcome == CastOutcome::Failed => return 0,
        _ => {}
    }

    let mut delay = definition.delay.get(level);
    if config.delay_depends_on_dex && !definition.flags.contains(SkillFlags::IGNORE_DEX_DELAY) {
        delay = scale_by_dex(delay, caster, config);
    }
    delay = percent(delay, config.delay_rate);
    delay = reduce(delay, reduction_percent(caster, now, false));

    delay.max(config.min_delay_ms)
}

fn scale_by_dex(value: u64, caster: &ActorState, config: &GameConfig) -> u64 {
    let scale = u64::from(config.dex_cast_scale);
    if scale == 0 {
        return value;
    }
    let dex = u64::from(caster.stats.dexterity).min(scale);
    value * (scale - dex) / scale
}

fn percent(value: u64, rate: u32) -> u64 {
    value.saturating_mul(u64::from(rate)) / 100
}

/// Combined reduction in percent, clamped to `0..=100`.
///
/// The `CastReduction` status shortens both cast and delay; the equipment
/// bonus only applies to the cast.
fn reduction_percent(caster: &ActorState, now: Tick, casting: bool) -> u64 {
    let mut total = i64::from(caster.statuses.value_of(StatusKind::CastReduction, now));
    if casting {
        total += i64::from(caster.bonuses.cast_reduction);
    }
    total.clamp(0, 100) as u64
}

fn reduce(value: u64, reduction: u64) -> u64 {
    value * (100 - reduction) / 100
}
