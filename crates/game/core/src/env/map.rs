use bitflags::bitflags;

use crate::state::Position;

/// Static map oracle exposing immutable layout information.
///
/// Pathfinding is outside the skill system; it is consumed only through
/// [`MapOracle::is_reachable`].
pub trait MapOracle: Send + Sync {
    fn dimensions(&self) -> MapDimensions;
    fn tile(&self, position: Position) -> Option<StaticTile>;

    fn contains(&self, position: Position) -> bool {
        self.dimensions().contains(position)
    }

    fn is_walkable(&self, position: Position) -> bool {
        self.tile(position).is_some_and(StaticTile::is_passable)
    }

    /// Zone restrictions in effect at `position`.
    fn zone(&self, _position: Position) -> ZoneFlags {
        ZoneFlags::empty()
    }

    /// Whether `to` can be reached from `from` without crossing blocked cells.
    ///
    /// The default walks a straight line and requires every cell on it to be
    /// walkable, which is what ground footprints with path checks need.
    fn is_reachable(&self, from: Position, to: Position) -> bool {
        line_between(from, to)
            .into_iter()
            .all(|cell| self.is_walkable(cell))
    }
}

/// Cells on the straight line from `from` to `to`, both ends included.
pub fn line_between(from: Position, to: Position) -> Vec<Position> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let mut current = from;
    let mut cells = vec![current];

    while current != to {
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            current.x += sx;
        }
        if e2 <= dx {
            err += dx;
            current.y += sy;
        }
        cells.push(current);
    }
    cells
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapDimensions {
    pub width: u32,
    pub height: u32,
}

impl MapDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < self.width as i32
            && position.y < self.height as i32
    }
}

/// Immutable descriptor for a tile in the static layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StaticTile {
    terrain: TerrainKind,
}

impl StaticTile {
    pub const fn new(terrain: TerrainKind) -> Self {
        Self { terrain }
    }

    pub fn terrain(self) -> TerrainKind {
        self.terrain
    }

    pub fn is_passable(self) -> bool {
        self.terrain.is_passable()
    }
}

/// Canonical terrain classes for static map tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerrainKind {
    Floor,
    /// Shallow water; walkable.
    Water,
    Wall,
    Cliff,
}

impl TerrainKind {
    pub fn is_passable(self) -> bool {
        matches!(self, TerrainKind::Floor | TerrainKind::Water)
    }

    /// Map glyph used by map layouts.
    pub fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' => Some(TerrainKind::Floor),
            '~' => Some(TerrainKind::Water),
            '#' => Some(TerrainKind::Wall),
            '^' => Some(TerrainKind::Cliff),
            _ => None,
        }
    }
}

bitflags! {
    /// Per-cell zone restrictions.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ZoneFlags: u16 {
        /// No skills at all.
        const NO_SKILL = 1 << 0;
        /// No ground footprints.
        const NO_GROUND_SKILL = 1 << 1;
        /// No traps.
        const NO_TRAP = 1 << 2;
        /// Town rules (offensive skills disabled).
        const TOWN = 1 << 3;
        /// Player-versus-player allowed.
        const PVP = 1 << 4;
    }
}
