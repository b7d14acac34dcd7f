//! Traits describing read-only data the skill system consumes from outside.
//!
//! The world holds its oracles behind `Arc` so runtimes can share one map
//! between several worlds or swap in test doubles.
mod map;
mod rng;

use std::sync::Arc;

pub use map::{MapDimensions, MapOracle, StaticTile, TerrainKind, ZoneFlags, line_between};
pub use rng::{PcgRng, RngOracle, RollContext, compute_seed};

/// Oracle bundle handed to a [`World`](crate::world::World).
#[derive(Clone)]
pub struct GameEnv {
    map: Arc<dyn MapOracle>,
    rng: Arc<dyn RngOracle>,
}

impl GameEnv {
    pub fn new(map: Arc<dyn MapOracle>, rng: Arc<dyn RngOracle>) -> Self {
        Self { map, rng }
    }

    /// Uses the default PCG generator.
    pub fn with_map(map: Arc<dyn MapOracle>) -> Self {
        Self::new(map, Arc::new(PcgRng))
    }

    pub fn map(&self) -> &dyn MapOracle {
        self.map.as_ref()
    }

    pub fn rng(&self) -> &dyn RngOracle {
        self.rng.as_ref()
    }
}

impl std::fmt::Debug for GameEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEnv")
            .field("dimensions", &self.map.dimensions())
            .finish_non_exhaustive()
    }
}
