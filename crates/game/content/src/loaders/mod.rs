//! Content loaders for reading game data from files.
//!
//! Every loader has a path-based entry point and a `parse` entry point over a
//! string, which is what the embedded defaults go through.

pub mod config;
pub mod factory;
pub mod map;
pub mod skills;

pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use map::{MapData, MapLoader};
pub use skills::SkillTableLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
