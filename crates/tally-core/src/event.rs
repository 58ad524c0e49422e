//! Domain event abstractions.

use std::fmt::Debug;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Version of a stream that has no events yet.
pub const NO_VERSION: i64 = -1;

/// Metadata attached to every domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate/stream this event belongs to.
    pub aggregate_id: Uuid,
    /// Position within the aggregate stream, starting at 0.
    pub version: i64,
    /// Correlation ID for tracing a command through its effects.
    pub correlation_id: Uuid,
    /// Causation ID linking this event to the event/command that caused it.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    /// Builds metadata for a new event caused directly by a command.
    #[must_use]
    pub fn new(
        aggregate_id: Uuid,
        version: i64,
        correlation_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            aggregate_id,
            version,
            correlation_id,
            causation_id: correlation_id,
            occurred_at,
        }
    }
}

/// Trait that all domain events implement.
///
/// Each aggregate type owns a closed set of event kinds. `Kind` is the
/// fieldless discriminant of that set and is what the dispatcher routes on.
pub trait DomainEvent: Clone + Send + Sync + Debug + 'static {
    /// Discriminant of the event payload.
    type Kind: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// Returns the kind of this event.
    fn kind(&self) -> Self::Kind;

    /// Returns the event type name (used for logging).
    fn event_type(&self) -> &'static str;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;

    /// Returns the aggregate this event belongs to.
    fn aggregate_id(&self) -> Uuid {
        self.metadata().aggregate_id
    }

    /// Returns the stream version of this event.
    fn version(&self) -> i64 {
        self.metadata().version
    }
}
