//! Common error infrastructure for game-core.
//!
//! Domain errors live next to the subsystem that produces them
//! ([`ConditionError`](crate::condition::ConditionError),
//! [`PlacementError`](crate::unit::PlacementError), ...). This module holds the
//! shared classification every one of them implements.
//!
//! # Failure classes
//!
//! - **Validation failures** (cost, range, actor state) are returned to the
//!   requester and never mutate state.
//! - **Placement failures** roll the whole ground footprint back.
//! - **Timer consistency failures** (a callback firing for something that no
//!   longer exists) are absorbed and counted, never returned.
//! - **Resource exhaustion** fails the new request and leaves existing state alone.

use crate::state::{EntityId, Position, Tick};

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: may succeed later (out of range, not enough SP yet)
/// - **Validation**: the request itself is malformed and should not be retried
/// - **Internal**: an unexpected inconsistency that needs investigation
/// - **Fatal**: the world cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - can retry with same or alternative request.
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    Validation,

    /// Internal error - unexpected state inconsistency.
    Internal,

    /// Fatal error - world state corrupted, cannot continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Contextual information attached to errors for debugging and diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorContext {
    /// Entity that triggered the error (if applicable).
    pub actor: Option<EntityId>,

    /// Position where the error occurred (if applicable).
    pub position: Option<Position>,

    /// World clock when the error was produced.
    pub tick: Tick,

    /// Optional static message providing additional context.
    pub message: Option<&'static str>,
}

impl ErrorContext {
    /// Creates a new error context stamped with the given tick.
    #[must_use]
    pub const fn new(tick: Tick) -> Self {
        Self {
            actor: None,
            position: None,
            tick,
            message: None,
        }
    }

    /// Attaches an actor to this context (builder pattern).
    #[must_use]
    pub const fn with_actor(mut self, actor: EntityId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Attaches a position to this context (builder pattern).
    #[must_use]
    pub const fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Attaches a static message to this context (builder pattern).
    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

/// Common trait for all game-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Return SCREAMING_SNAKE codes from [`GameError::error_code`] so clients can
///   map failures to UI messages without parsing text
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns the context information for this error, if available.
    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
