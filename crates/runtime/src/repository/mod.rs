//! Repository layer for data the runtime writes while it runs.
//!
//! Static game content (skills, maps, configuration) is handled by the
//! content crate and oracles, not repositories.

mod error;
mod event_log;

pub use error::{RepositoryError, Result};
pub use event_log::FileEventLog;
