//! Content factory for loading everything a world needs from a data directory.

use std::path::{Path, PathBuf};

use game_core::{GameConfig, SkillTable};

use crate::loaders::{ConfigLoader, LoadResult, MapData, MapLoader, SkillTableLoader};

/// Content factory that loads all game content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── game.toml
/// ├── skills/
/// │   ├── first_class.ron
/// │   └── second_class.ron
/// └── maps/
///     └── training_field.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load game configuration from `game.toml`.
    pub fn load_config(&self) -> LoadResult<GameConfig> {
        let path = self.data_dir.join("game.toml");
        ConfigLoader::load(&path)
    }

    /// Load and validate every skill file under `skills/`.
    pub fn load_skills(&self) -> LoadResult<SkillTable> {
        let dir = self.data_dir.join("skills");
        SkillTableLoader::load_dir(&dir)
    }

    /// Load a map from `maps/{map_name}.ron`.
    pub fn load_map(&self, map_name: &str) -> LoadResult<MapData> {
        let path = self.data_dir.join("maps").join(format!("{}.ron", map_name));
        MapLoader::load(&path)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn loads_a_complete_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("skills")).unwrap();
        fs::create_dir_all(root.join("maps")).unwrap();
        fs::write(root.join("game.toml"), "tick_ms = 40\n").unwrap();
        fs::write(
            root.join("skills/heal.ron"),
            r#"[(id: 28, name: "Heal", max_level: 10, target: "FRIEND", damage: Some((kind: Heal, ratio: [200])))]"#,
        )
        .unwrap();
        fs::write(root.join("maps/room.ron"), r#"(rows: ["...", "..."])"#).unwrap();

        let factory = ContentFactory::new(root);
        assert_eq!(factory.load_config().unwrap().tick_ms, 40);
        assert_eq!(factory.load_skills().unwrap().len(), 1);
        assert_eq!(factory.load_map("room").unwrap().tiles.len(), 6);
        assert!(factory.load_map("missing").is_err());
    }
}
