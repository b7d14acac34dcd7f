//! Deterministic skill rules shared by the runtime and offline tools.
//!
//! `game-core` owns everything that happens between "an actor asks to use a
//! skill" and "the effects landed": condition checks and costs, cast timing,
//! the damage pipeline, ground footprints and the timers that drive them.
//! All state mutation flows through [`world::World`], and supporting crates
//! depend on the types re-exported here.
pub mod cast;
pub mod combat;
pub mod condition;
pub mod config;
pub mod env;
pub mod error;
pub mod events;
pub mod skill;
pub mod state;
pub mod timer;
pub mod unit;
pub mod world;

#[cfg(test)]
mod testing;

pub use cast::{CancelReason, CastSession, CastState, CastTarget, SessionId};
pub use combat::{DamageKind, Element, Knockback};
pub use condition::{ConditionChecker, ConditionError, ConditionRequest};
pub use config::GameConfig;
pub use env::{
    GameEnv, MapDimensions, MapOracle, PcgRng, RngOracle, StaticTile, TerrainKind, ZoneFlags,
};
pub use error::{ErrorContext, ErrorSeverity, GameError};
pub use events::{GroupRemoval, SkillEvent};
pub use skill::{
    BehaviorTable, CastKind, SkillBehavior, SkillDefinition, SkillId, SkillLevel, SkillRegistry,
    SkillTable,
};
pub use state::{
    ActorKind, ActorState, ActorStats, Direction, EntitiesState, EntityId, Position,
    ResourceMeter, StatusEffect, StatusKind, Tick,
};
pub use timer::{TimerId, TimerScheduler, TimerTask};
pub use unit::{GroupHandle, PlacementError, UnitGroup};
pub use world::{
    ActionBlock, CastRequest, CastTicket, Diagnostics, ExhaustionError, MoveKind, SkillError,
    World,
};
