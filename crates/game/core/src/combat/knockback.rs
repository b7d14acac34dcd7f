//! Knockback direction and sliding.

use crate::env::MapOracle;
use crate::state::{Direction, Position};

/// Which way a skill pushes its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KnockbackDirection {
    /// Away from the caster (or from the footprint cell for ground skills).
    #[default]
    AwayFromSource,
    /// Towards the target's back, regardless of where the hit came from.
    BehindTarget,
}

/// Resolved knockback for one target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Knockback {
    pub from: Position,
    pub to: Position,
    pub heading: Direction,
}

/// Heading of the push.
///
/// A source standing on the target's own cell has no direction to push away
/// from; the target then slides backwards from its facing.
pub fn knockback_heading(
    mode: KnockbackDirection,
    source: Position,
    target: Position,
    target_facing: Direction,
) -> Direction {
    match mode {
        KnockbackDirection::AwayFromSource => {
            Direction::between(source, target).unwrap_or(target_facing.opposite())
        }
        KnockbackDirection::BehindTarget => target_facing.opposite(),
    }
}

/// Slides `cells` steps along `heading`, stopping before the first blocked cell.
pub fn slide(map: &dyn MapOracle, start: Position, heading: Direction, cells: u8) -> Position {
    let mut current = start;
    for _ in 0..cells {
        let next = current.step(heading);
        if !map.contains(next) || !map.is_walkable(next) {
            break;
        }
        current = next;
    }
    current
}
