//! Static map layout served through [`game_core::MapOracle`].
use game_content::MapData;
use game_core::{MapDimensions, MapOracle, Position, StaticTile, TerrainKind, ZoneFlags};
use std::collections::HashMap;

/// MapOracle implementation with static map data
///
/// Holds immutable terrain and zone restrictions. Cells missing from the tile
/// table are treated as outside the map.
pub struct MapOracleImpl {
    dimensions: MapDimensions,
    tiles: HashMap<Position, StaticTile>,
    zones: HashMap<Position, ZoneFlags>,
}

impl MapOracleImpl {
    pub fn new(
        dimensions: MapDimensions,
        tiles: HashMap<Position, StaticTile>,
        zones: HashMap<Position, ZoneFlags>,
    ) -> Self {
        Self {
            dimensions,
            tiles,
            zones,
        }
    }

    /// Creates a map of floor tiles with no zone restrictions
    pub fn open_field(width: u32, height: u32) -> Self {
        let dimensions = MapDimensions::new(width, height);
        let mut tiles = HashMap::new();
        for x in 0..width as i32 {
            for y in 0..height as i32 {
                tiles.insert(Position::new(x, y), StaticTile::new(TerrainKind::Floor));
            }
        }
        Self::new(dimensions, tiles, HashMap::new())
    }
}

impl From<MapData> for MapOracleImpl {
    fn from(data: MapData) -> Self {
        Self::new(data.dimensions, data.tiles, data.zones)
    }
}

impl MapOracle for MapOracleImpl {
    fn dimensions(&self) -> MapDimensions {
        self.dimensions
    }

    fn tile(&self, position: Position) -> Option<StaticTile> {
        self.tiles.get(&position).copied()
    }

    fn zone(&self, position: Position) -> ZoneFlags {
        self.zones.get(&position).copied().unwrap_or_default()
    }
}
