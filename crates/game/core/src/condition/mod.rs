//! Resource and condition checks for skill use.
//!
//! [`ConditionChecker::check_and_commit`] is the only way costs leave a
//! caster: it validates every requirement first and, when asked to commit,
//! deducts all of them in the same call. There is no separate "pay" step a
//! cancellation could race against.
mod checker;
mod error;

pub use checker::{CheckPhase, CheckTarget, ConditionChecker, ConditionRequest, Deduction, TargetView};
pub use error::ConditionError;
