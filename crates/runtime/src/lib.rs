//! Runtime orchestration for the skill simulation.
//!
//! This crate wires together the cast provider abstraction, oracle access,
//! the event log, and the simulation worker into a cohesive runtime API.
//! Consumers embed [`Runtime`] to drive the world, subscribe to events, and
//! submit casts through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`workers`] keeps background tasks internal to the crate
//! - [`oracle`] and [`repository`] provide data adapters reused by other crates
pub mod api;
pub mod events;
pub mod oracle;
pub mod repository;
pub mod runtime;

mod workers;

pub use api::{
    CastProvider, IdleCastProvider, Result, RuntimeError, RuntimeHandle, ScriptedCastProvider,
};
pub use events::{Event, EventBus, Topic};
pub use oracle::{MapOracleImpl, OracleManager};
pub use repository::{FileEventLog, RepositoryError};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
