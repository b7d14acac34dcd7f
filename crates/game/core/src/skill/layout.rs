//! Footprint layouts for ground skills.

use crate::state::Direction;

/// Shape of a ground footprint around its anchor cell.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnitLayout {
    /// Only the anchor cell.
    #[default]
    Single,
    /// `(2r + 1)²` cells centred on the anchor.
    Square { radius: u8 },
    /// Cells with `|dx| + |dy| <= radius`.
    Diamond { radius: u8 },
    /// A wall perpendicular to the caster's facing, `width` rows deep.
    Line { length: u8, width: u8 },
    /// Explicit offsets relative to the anchor, independent of facing.
    Custom(Vec<(i8, i8)>),
}

impl UnitLayout {
    /// Cell offsets relative to the anchor. `facing` only matters for lines.
    pub fn offsets(&self, facing: Direction) -> Vec<(i32, i32)> {
        match self {
            UnitLayout::Single => vec![(0, 0)],
            UnitLayout::Square { radius } => {
                let r = i32::from(*radius);
                let mut cells = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
                for dy in -r..=r {
                    for dx in -r..=r {
                        cells.push((dx, dy));
                    }
                }
                cells
            }
            UnitLayout::Diamond { radius } => {
                let r = i32::from(*radius);
                let mut cells = Vec::new();
                for dy in -r..=r {
                    for dx in -r..=r {
                        if dx.abs() + dy.abs() <= r {
                            cells.push((dx, dy));
                        }
                    }
                }
                cells
            }
            UnitLayout::Line { length, width } => {
                let (px, py) = facing.perpendicular().delta();
                let (fx, fy) = facing.delta();
                let half = i32::from(*length) / 2;
                let mut cells = Vec::with_capacity(usize::from(*length) * usize::from(*width));
                for row in 0..i32::from((*width).max(1)) {
                    for i in 0..i32::from(*length) {
                        let k = i - half;
                        cells.push((px * k + fx * row, py * k + fy * row));
                    }
                }
                cells
            }
            UnitLayout::Custom(offsets) => offsets
                .iter()
                .map(|&(dx, dy)| (i32::from(dx), i32::from(dy)))
                .collect(),
        }
    }

    pub fn cell_count(&self) -> usize {
        self.offsets(Direction::South).len()
    }
}
