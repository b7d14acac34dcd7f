//! Map data loader.
//!
//! Loads static terrain and zone restrictions from map RON files. A map is a
//! grid of glyph rows (see [`TerrainKind::from_glyph`]) plus zone rectangles.

use std::collections::HashMap;
use std::path::Path;

use game_core::{MapDimensions, Position, StaticTile, TerrainKind, ZoneFlags};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

const BUILTIN_MAP: &str = include_str!("../../data/maps/training_field.ron");

/// Map data structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MapDataRon {
    rows: Vec<String>,
    #[serde(default)]
    zones: Vec<ZoneRon>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ZoneRon {
    from: (i32, i32),
    to: (i32, i32),
    flags: ZoneFlags,
}

/// Terrain and zone flags of one map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapData {
    pub dimensions: MapDimensions,
    pub tiles: HashMap<Position, StaticTile>,
    /// Only cells with at least one flag are present.
    pub zones: HashMap<Position, ZoneFlags>,
}

/// Loader for map data from RON files.
pub struct MapLoader;

impl MapLoader {
    /// The map compiled into this crate.
    pub fn builtin() -> LoadResult<MapData> {
        Self::parse(BUILTIN_MAP)
            .map_err(|e| anyhow::anyhow!("Failed to parse builtin map: {}", e))
    }

    /// Load map data from a RON file.
    pub fn load(path: &Path) -> LoadResult<MapData> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse map RON at {}: {}", path.display(), e))
    }

    pub fn parse(source: &str) -> LoadResult<MapData> {
        let data: MapDataRon = ron::from_str(source)?;

        let height = data.rows.len();
        let width = data.rows.first().map_or(0, |row| row.chars().count());
        if width == 0 {
            anyhow::bail!("map has no cells");
        }
        let dimensions = MapDimensions::new(width as u32, height as u32);

        let mut tiles = HashMap::with_capacity(width * height);
        for (y, row) in data.rows.iter().enumerate() {
            let row_width = row.chars().count();
            if row_width != width {
                anyhow::bail!("row {} is {} cells wide, expected {}", y, row_width, width);
            }
            for (x, glyph) in row.chars().enumerate() {
                let terrain = TerrainKind::from_glyph(glyph)
                    .ok_or_else(|| anyhow::anyhow!("unknown glyph {:?} at ({}, {})", glyph, x, y))?;
                tiles.insert(Position::new(x as i32, y as i32), StaticTile::new(terrain));
            }
        }

        let mut zones: HashMap<Position, ZoneFlags> = HashMap::new();
        for zone in data.zones {
            let (x0, x1) = (zone.from.0.min(zone.to.0), zone.from.0.max(zone.to.0));
            let (y0, y1) = (zone.from.1.min(zone.to.1), zone.from.1.max(zone.to.1));
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let position = Position::new(x, y);
                    if !dimensions.contains(position) {
                        anyhow::bail!("zone cell ({}, {}) lies outside the map", x, y);
                    }
                    *zones.entry(position).or_default() |= zone.flags;
                }
            }
        }

        Ok(MapData {
            dimensions,
            tiles,
            zones,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r##"(
        rows: [
            "#~.",
            "..^",
        ],
        zones: [
            (from: (1, 1), to: (2, 1), flags: "NO_TRAP"),
            (from: (2, 1), to: (2, 1), flags: "TOWN"),
        ],
    )"##;

    #[test]
    fn glyphs_and_zones_are_read() {
        let map = MapLoader::parse(SMALL).unwrap();
        assert_eq!(map.dimensions, MapDimensions::new(3, 2));
        assert_eq!(
            map.tiles[&Position::new(0, 0)].terrain(),
            TerrainKind::Wall
        );
        assert_eq!(
            map.tiles[&Position::new(1, 0)].terrain(),
            TerrainKind::Water
        );
        assert_eq!(
            map.tiles[&Position::new(2, 1)].terrain(),
            TerrainKind::Cliff
        );
        assert_eq!(map.zones[&Position::new(1, 1)], ZoneFlags::NO_TRAP);
        assert_eq!(
            map.zones[&Position::new(2, 1)],
            ZoneFlags::NO_TRAP | ZoneFlags::TOWN
        );
        assert!(!map.zones.contains_key(&Position::new(0, 1)));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let error = MapLoader::parse(r#"(rows: ["...", ".."])"#).unwrap_err();
        assert!(error.to_string().contains("row 1"));
    }

    #[test]
    fn unknown_glyphs_are_rejected() {
        assert!(MapLoader::parse(r#"(rows: [".x."])"#).is_err());
    }

    #[test]
    fn builtin_map_is_walled_in() {
        let map = MapLoader::builtin().unwrap();
        let width = map.dimensions.width as i32;
        for x in 0..width {
            assert!(!map.tiles[&Position::new(x, 0)].is_passable());
        }
        assert!(map.tiles[&Position::new(1, 1)].is_passable());
    }

    #[test]
    fn load_reads_a_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.ron");
        std::fs::write(&path, SMALL).unwrap();
        let map = MapLoader::load(&path).unwrap();
        assert_eq!(map.tiles.len(), 6);
    }
}
