//! Skill table loader.
//!
//! A skill file is a RON list of [`SkillDefinition`]s. Fields left out take
//! their defaults, and a level table with a single value applies to every
//! level. The table is validated as a whole once every file is read, so a
//! duplicate id across two files is reported like one inside a single file.

use std::path::Path;

use game_core::SkillTable;
use game_core::skill::SkillDefinition;

use crate::loaders::{LoadResult, read_file};

const BUILTIN: [(&str, &str); 2] = [
    (
        "first_class.ron",
        include_str!("../../data/skills/first_class.ron"),
    ),
    (
        "second_class.ron",
        include_str!("../../data/skills/second_class.ron"),
    ),
];

/// Loader for skill tables from RON files.
pub struct SkillTableLoader;

impl SkillTableLoader {
    /// Table built from the skill files compiled into this crate.
    pub fn builtin() -> LoadResult<SkillTable> {
        let mut definitions = Vec::new();
        for (name, source) in BUILTIN {
            let parsed = Self::parse(source)
                .map_err(|e| anyhow::anyhow!("Failed to parse builtin {}: {}", name, e))?;
            definitions.extend(parsed);
        }
        Self::build(definitions)
    }

    /// Load a single skill file.
    pub fn load(path: &Path) -> LoadResult<SkillTable> {
        let definitions = Self::load_definitions(path)?;
        Self::build(definitions)
    }

    /// Load every `*.ron` file in `dir`, in file name order.
    pub fn load_dir(dir: &Path) -> LoadResult<SkillTable> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| anyhow::anyhow!("Failed to read skill directory {}: {}", dir.display(), e))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| anyhow::anyhow!("Failed to list {}: {}", dir.display(), e))?
                .path();
            if path.extension().is_some_and(|ext| ext == "ron") {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            anyhow::bail!("No skill files found in {}", dir.display());
        }

        let mut definitions = Vec::new();
        for path in &files {
            definitions.extend(Self::load_definitions(path)?);
        }
        let table = Self::build(definitions)?;
        tracing::info!(
            target: "content::skills",
            dir = %dir.display(),
            files = files.len(),
            skills = table.len(),
            "loaded skill tables"
        );
        Ok(table)
    }

    /// Read the definitions in one file without validating them.
    pub fn load_definitions(path: &Path) -> LoadResult<Vec<SkillDefinition>> {
        let content = read_file(path)?;
        let definitions = Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse skill RON at {}: {}", path.display(), e))?;
        tracing::debug!(
            target: "content::skills",
            path = %path.display(),
            count = definitions.len(),
            "read skill file"
        );
        Ok(definitions)
    }

    pub fn parse(source: &str) -> LoadResult<Vec<SkillDefinition>> {
        let definitions: Vec<SkillDefinition> = ron::from_str(source)?;
        Ok(definitions)
    }

    fn build(definitions: Vec<SkillDefinition>) -> LoadResult<SkillTable> {
        SkillTable::from_definitions(definitions)
            .map_err(|e| anyhow::anyhow!("Invalid skill table: {}", e))
    }
}
