//! Combat math used by the effect resolver: elements, hit chance, damage,
//! status resistance and knockback.
pub mod damage;
pub mod element;
pub mod hit;
pub mod knockback;

pub use damage::{DamageBreakdown, DamageInput, DamageKind, base_damage, calculate};
pub use element::{Element, Race, Size, element_modifier};
pub use hit::{calculate_hit_chance, check_hit};
pub use knockback::{Knockback, KnockbackDirection, knockback_heading, slide};

use crate::state::{ActorState, StatusKind};

/// Status chance after the target's resistance, in per-mille.
///
/// Stun-type ailments are resisted by vitality, mind-affecting ones by
/// intelligence, everything else by luck. One point of the stat removes one
/// percent of the chance.
pub fn resisted_chance(base_permille: u32, kind: StatusKind, target: &ActorState) -> u32 {
    if !kind.is_ailment() {
        return base_permille;
    }
    let stats = &target.stats;
    let resist = match kind {
        StatusKind::Stunned | StatusKind::Frozen | StatusKind::Poisoned => stats.vitality,
        StatusKind::Sleep | StatusKind::Silenced | StatusKind::Blind => stats.intelligence,
        _ => stats.luck,
    };
    let resist = u32::from(resist).min(100);
    base_permille * (100 - resist) / 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ActorKind, ActorStats, EntityId, Position};

    #[test]
    fn vitality_resists_stun() {
        let target = ActorState::new(EntityId(1), ActorKind::Monster, Position::ORIGIN).with_stats(
            ActorStats {
                vitality: 40,
                ..ActorStats::default()
            },
        );
        assert_eq!(resisted_chance(500, StatusKind::Stunned, &target), 300);
        assert_eq!(resisted_chance(500, StatusKind::CastReduction, &target), 500);
    }

    #[test]
    fn full_resistance_at_hundred() {
        let target = ActorState::new(EntityId(1), ActorKind::Monster, Position::ORIGIN).with_stats(
            ActorStats {
                intelligence: 130,
                ..ActorStats::default()
            },
        );
        assert_eq!(resisted_chance(1000, StatusKind::Sleep, &target), 0);
    }
}
