//! Actor state consumed and mutated by the skill system.
//!
//! Actors are an external collaborator in the wider server; this module keeps
//! only what casting, damage resolution and ground units need: resource pools,
//! stats, affiliation, inventory costs, statuses, cooldowns and the post-cast
//! lockout.
mod types;

pub use types::*;
