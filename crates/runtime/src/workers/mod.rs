//! Worker tasks that back the runtime orchestration.
//!
//! The simulation worker is the only task that touches the world; everything
//! else reaches it through [`Command`]s.

mod simulation;

pub use simulation::{Command, SimulationWorker};
