//! Monotonic, single-threaded timer dispatch.
//!
//! Everything that waits in the skill system (cast completion, follow-up hits,
//! ground footprint intervals) is a [`TimerTask`] owned by the
//! [`TimerScheduler`]. The world drives dispatch one pass at a time: the batch
//! of due timers is frozen when the pass begins, cancellations during the pass
//! are deferred until it ends, and anything scheduled during the pass lands on
//! a later tick.
mod scheduler;
mod task;

pub use scheduler::{Fired, TimerScheduler};
pub use task::{TaskOutcome, TimerId, TimerOwner, TimerTask};
