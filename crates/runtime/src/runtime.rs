//! High-level runtime orchestrator.
//!
//! The runtime owns the simulation worker, wires up command/event channels,
//! and exposes a builder-based API for clients to drive the world.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use game_content::{MapLoader, SkillTableLoader};
use game_core::{ActorState, BehaviorTable, GameConfig, SkillTable, World};

use crate::api::{CastProvider, Result, RuntimeError, RuntimeHandle};
use crate::events::EventBus;
use crate::oracle::{MapOracleImpl, OracleManager};
use crate::workers::{Command, SimulationWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub game_config: GameConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Advance the world by one `tick_ms` per wall-clock tick. When false the
    /// clock only moves through [`RuntimeHandle::advance`].
    pub auto_tick: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            game_config: GameConfig::default(),
            event_buffer_size: 256,
            command_buffer_size: 32,
            auto_tick: false,
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(source: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    fn tick_period(&self) -> Option<Duration> {
        self.auto_tick
            .then(|| Duration::from_millis(self.game_config.tick_ms.max(1)))
    }
}

/// Main runtime that orchestrates the skill simulation
///
/// Runtime owns the worker and the optional AI provider.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    cast_provider: Option<Box<dyn CastProvider>>,
    worker: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Build a runtime from the skill table and map compiled into
    /// `game-content`.
    pub async fn with_builtin_content(config: RuntimeConfig) -> Result<Self> {
        let skills =
            SkillTableLoader::builtin().map_err(|e| RuntimeError::Content(e.to_string()))?;
        let map = MapLoader::builtin().map_err(|e| RuntimeError::Content(e.to_string()))?;

        Self::builder()
            .config(config)
            .skills(skills)
            .oracles(OracleManager::new(Arc::new(MapOracleImpl::from(map))))
            .build()
            .await
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Set the provider that decides casts for AI-driven actors
    pub fn set_cast_provider(&mut self, provider: impl CastProvider + 'static) {
        self.cast_provider = Some(Box::new(provider));
    }

    /// Ask the cast provider for a decision for every actor it controls that
    /// is free to act, and submit each one like a player request.
    ///
    /// Returns how many casts the world accepted. Rejected casts are logged
    /// and skipped.
    pub async fn step_providers(&self) -> Result<usize> {
        let Some(provider) = self.cast_provider.as_ref() else {
            return Ok(0);
        };

        let (now, ready) = self
            .handle
            .query(|world| {
                let ready: Vec<ActorState> = world
                    .entities()
                    .iter()
                    .filter(|actor| !world.is_blocked(actor.id))
                    .cloned()
                    .collect();
                (world.clock(), ready)
            })
            .await?;

        let mut accepted = 0;
        for actor in ready.iter().filter(|actor| provider.controls(actor)) {
            let Some(request) = provider.provide_cast(actor, now).await? else {
                continue;
            };
            match self.handle.cast(request).await {
                Ok(_) => accepted += 1,
                Err(error) if error.is_rejection() => {
                    debug!(
                        target: "runtime::worker",
                        actor = %actor.id,
                        skill = %request.skill,
                        %error,
                        "provider cast rejected"
                    );
                }
                Err(error) => return Err(error),
            }
        }
        Ok(accepted)
    }

    /// Shutdown the runtime gracefully
    ///
    /// The world cancels every cast and removes every ground unit before the
    /// worker stops, so subscribers still receive those events.
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await?;
        drop(self.handle);

        self.worker.await.map_err(RuntimeError::WorkerJoin)?;

        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    skills: Option<SkillTable>,
    oracles: Option<OracleManager>,
    behaviors: Option<BehaviorTable>,
    actors: Vec<ActorState>,
    cast_provider: Option<Box<dyn CastProvider>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            skills: None,
            oracles: None,
            behaviors: None,
            actors: Vec::new(),
            cast_provider: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Skill table the world starts with (empty if not set)
    pub fn skills(mut self, table: SkillTable) -> Self {
        self.skills = Some(table);
        self
    }

    /// Set required oracle manager
    pub fn oracles(mut self, oracles: OracleManager) -> Self {
        self.oracles = Some(oracles);
        self
    }

    /// Shorthand for [`Self::oracles`] with the default random source
    pub fn map(self, map: MapOracleImpl) -> Self {
        self.oracles(OracleManager::new(Arc::new(map)))
    }

    /// Replace the builtin skill behaviors
    pub fn behaviors(mut self, behaviors: BehaviorTable) -> Self {
        self.behaviors = Some(behaviors);
        self
    }

    /// Actors spawned before the worker starts
    pub fn actors(mut self, actors: impl IntoIterator<Item = ActorState>) -> Self {
        self.actors.extend(actors);
        self
    }

    /// Set the AI cast provider (optional)
    pub fn cast_provider(mut self, provider: impl CastProvider + 'static) -> Self {
        self.cast_provider = Some(Box::new(provider));
        self
    }

    /// Build the runtime
    pub async fn build(self) -> Result<Runtime> {
        let oracles = self.oracles.ok_or(RuntimeError::MissingMap)?;
        let skills = self.skills.unwrap_or_else(SkillTable::empty);

        let mut world = World::new(
            self.config.game_config.clone(),
            skills,
            oracles.as_game_env(),
        );
        if let Some(behaviors) = self.behaviors {
            world = world.with_behaviors(behaviors);
        }
        for actor in self.actors {
            world.spawn_actor(actor)?;
        }
        // Spawns of the initial roster are not news to anyone.
        world.drain_events();

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let handle = RuntimeHandle::new(command_tx, event_bus.clone());

        let worker = SimulationWorker::new(
            world,
            command_rx,
            event_bus,
            self.config.tick_period(),
        );
        let worker = tokio::spawn(async move {
            worker.run().await;
        });

        info!(
            target: "runtime::worker",
            auto_tick = self.config.auto_tick,
            tick_ms = self.config.game_config.tick_ms,
            "runtime started"
        );

        Ok(Runtime {
            handle,
            cast_provider: self.cast_provider,
            worker,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_reads_partial_toml() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            auto_tick = true
            command_buffer_size = 8

            [game_config]
            tick_ms = 50
            "#,
        )
        .unwrap();

        assert!(config.auto_tick);
        assert_eq!(config.command_buffer_size, 8);
        assert_eq!(config.event_buffer_size, 256);
        assert_eq!(config.game_config.tick_ms, 50);
        assert_eq!(config.tick_period(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn manual_stepping_has_no_tick_period() {
        assert_eq!(RuntimeConfig::default().tick_period(), None);
    }

    #[tokio::test]
    async fn build_requires_a_map() {
        let result = Runtime::builder().build().await;
        assert!(matches!(result, Err(RuntimeError::MissingMap)));
    }
}
