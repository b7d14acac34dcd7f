//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories, and the skill world
//! so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use game_core::SkillError;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("simulation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Skill(#[from] SkillError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("runtime requires a map before building")]
    MissingMap,

    #[error("cast provider failed: {0}")]
    Provider(String),

    #[error("failed to load content: {0}")]
    Content(String),
}

impl RuntimeError {
    /// The world refused the request; the runtime itself is healthy.
    pub fn is_rejection(&self) -> bool {
        matches!(self, RuntimeError::Skill(_))
    }
}
