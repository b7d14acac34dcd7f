//! Per-caster cast lifecycle.
//!
//! A [`CastSession`] moves `Idle -> Casting -> Completed | Cancelled` and is
//! dropped from the [`SessionTable`] when it reaches a terminal state, which is
//! how the caster returns to idle. Durations come from [`timing`].
mod session;
mod table;
pub mod timing;

pub use session::{CancelReason, CastSession, CastState, CastTarget, SessionId};
pub use table::SessionTable;
pub use timing::{CastOutcome, cast_time, post_cast_delay};
