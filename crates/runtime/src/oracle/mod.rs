//! Runtime wrappers around static content oracles.
//!
//! These implementations expose `game-core` oracle traits and bundle them into
//! an [`OracleManager`] so the runtime can build a [`game_core::GameEnv`] for
//! its world. The data is immutable at runtime; dynamic state lives in the
//! world.
mod map;

use game_core::{GameEnv, PcgRng, RngOracle};
use std::sync::Arc;

pub use map::MapOracleImpl;

/// Manages all oracle implementations and provides unified access
#[derive(Clone)]
pub struct OracleManager {
    pub(crate) map: Arc<MapOracleImpl>,
    pub(crate) rng: Arc<dyn RngOracle>,
}

impl OracleManager {
    /// Creates a new oracle manager with the stateless PCG generator
    pub fn new(map: Arc<MapOracleImpl>) -> Self {
        Self {
            map,
            rng: Arc::new(PcgRng),
        }
    }

    /// Replaces the random source, e.g. with a fixed-roll test double
    pub fn with_rng(mut self, rng: Arc<dyn RngOracle>) -> Self {
        self.rng = rng;
        self
    }

    /// Converts the oracle manager into a GameEnv for game-core
    pub fn as_game_env(&self) -> GameEnv {
        GameEnv::new(self.map.clone(), self.rng.clone())
    }

    pub fn map(&self) -> &MapOracleImpl {
        &self.map
    }
}
