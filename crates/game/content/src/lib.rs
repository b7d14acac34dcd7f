//! Data-driven skill content and loaders.
//!
//! This crate houses the static content the skill system runs on and the
//! loaders that read it:
//! - Skill tables (RON, one list of definitions per file)
//! - Map layouts (RON glyph grids with zone rectangles)
//! - Game configuration (TOML)
//!
//! A default skill table, map and configuration are embedded in the binary so
//! the runtime can start without a data directory. Content is consumed by the
//! runtime when it builds a [`game_core::World`] and never appears in actor
//! state.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, MapData, MapLoader, SkillTableLoader};
