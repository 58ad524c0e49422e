//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// Optimistic concurrency conflict.
    #[error(
        "concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual} (reload and retry)"
    )]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The version the writer last read.
        expected: i64,
        /// The version found in the store (`-1` for no stream).
        actual: i64,
    },

    /// A business rule rejected the operation.
    #[error("rule violation: {0}")]
    RuleViolation(String),

    /// Malformed or out-of-range command input.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// An append batch does not continue from its expected version.
    #[error(
        "invalid event sequence for aggregate {aggregate_id}: expected version {expected}, found {found}"
    )]
    InvalidEventSequence {
        /// The stream being appended to.
        aggregate_id: Uuid,
        /// The version the next event should carry.
        expected: i64,
        /// The version it actually carried.
        found: i64,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Returns `true` if reloading the aggregate and retrying may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

/// Failure raised by a projection while handling a dispatched event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("projection {projection} failed: {message}")]
pub struct ProjectionError {
    /// Name of the failing projection.
    pub projection: &'static str,
    /// Human-readable failure description.
    pub message: String,
}

impl ProjectionError {
    /// Creates a new projection error.
    #[must_use]
    pub fn new(projection: &'static str, message: impl Into<String>) -> Self {
        Self {
            projection,
            message: message.into(),
        }
    }
}
