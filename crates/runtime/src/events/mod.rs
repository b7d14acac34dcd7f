//! Topic-based event bus for world events.
//!
//! The simulation worker drains the world's outbox after every command and
//! tick, stamps each event with the world clock, and publishes it to the
//! topic its kind belongs to. Consumers subscribe only to the topics they
//! need.

mod bus;

pub use bus::{Event, EventBus, Topic};
