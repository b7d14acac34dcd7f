//! Skill server binary.
//!
//! Composition root: reads `.env` and the server TOML, installs logging,
//! loads skill and map content, builds the [`runtime::Runtime`] and keeps it
//! ticking until Ctrl-C.
//!
//! # Examples
//!
//! ```bash
//! GAME_SERVER_CONFIG=server.toml RUST_LOG=skill=debug,info cargo run -p game-server
//! ```

mod config;
mod logging;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use game_content::{ContentFactory, MapLoader, SkillTableLoader};
use game_core::SkillTable;
use runtime::{EventBus, FileEventLog, MapOracleImpl, OracleManager, Runtime, Topic};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = ServerConfig::from_env()?;
    let _log_guard = logging::init(&config.log)?;

    tracing::info!("Starting game server");

    let (skills, map) = load_content(&mut config)?;
    if config.runtime.game_config.world_seed == 0 {
        config.runtime.game_config.world_seed = rand::random();
    }
    tracing::info!(
        skills = skills.len(),
        seed = config.runtime.game_config.world_seed,
        tick_ms = config.runtime.game_config.tick_ms,
        "Content loaded"
    );

    let runtime = Runtime::builder()
        .config(config.runtime.clone())
        .skills(skills)
        .oracles(OracleManager::new(Arc::new(map)))
        .build()
        .await?;
    let handle = runtime.handle();

    let event_log = if config.event_log {
        Some(spawn_event_log(handle.event_bus())?)
    } else {
        None
    };

    tracing::info!("Server running, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    tracing::info!("Shutdown requested");

    let diagnostics = handle.query(|world| world.diagnostics()).await?;
    tracing::info!(?diagnostics, "World diagnostics");

    drop(handle);
    runtime.shutdown().await?;

    if let Some(task) = event_log {
        task.await.context("Event log task failed")?;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Content from `data_dir` when configured, otherwise the builtin set.
fn load_content(config: &mut ServerConfig) -> Result<(SkillTable, MapOracleImpl)> {
    match &config.data_dir {
        Some(dir) => {
            let factory = ContentFactory::new(dir);
            tracing::info!("Loading content from {}", factory.data_dir().display());

            config.runtime.game_config = factory.load_config()?;
            let skills = factory.load_skills()?;
            let map = factory.load_map(&config.map)?;
            Ok((skills, MapOracleImpl::from(map)))
        }
        None => {
            tracing::info!("Using builtin content");
            Ok((
                SkillTableLoader::builtin()?,
                MapOracleImpl::from(MapLoader::builtin()?),
            ))
        }
    }
}

/// Appends every published event to a fresh JSON lines file until the bus
/// closes.
fn spawn_event_log(bus: &EventBus) -> Result<JoinHandle<()>> {
    let started = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    let dir = logging::default_data_dir().join("events");
    let mut log = FileEventLog::create(&dir, format!("events_{}.jsonl", started))
        .context("Failed to create event log")?;
    tracing::info!("Event log: {}", log.path().display());

    let mut cast_rx = bus.subscribe(Topic::Cast);
    let mut combat_rx = bus.subscribe(Topic::Combat);
    let mut unit_rx = bus.subscribe(Topic::Unit);

    Ok(tokio::spawn(async move {
        let (mut cast_open, mut combat_open, mut unit_open) = (true, true, true);
        while cast_open || combat_open || unit_open {
            let (topic, received) = tokio::select! {
                event = cast_rx.recv(), if cast_open => (Topic::Cast, event),
                event = combat_rx.recv(), if combat_open => (Topic::Combat, event),
                event = unit_rx.recv(), if unit_open => (Topic::Unit, event),
            };
            match received {
                Ok(event) => {
                    if let Err(error) = log.append(&event) {
                        tracing::error!(%error, "Event log write failed; stopping");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(?topic, skipped, "Event log fell behind the bus");
                }
                Err(RecvError::Closed) => match topic {
                    Topic::Cast => cast_open = false,
                    Topic::Combat => combat_open = false,
                    Topic::Unit => unit_open = false,
                },
            }
        }
        if let Err(error) = log.flush() {
            tracing::error!(%error, "Event log flush failed");
        }
        tracing::info!(written = log.written(), "Event log closed");
    }))
}
