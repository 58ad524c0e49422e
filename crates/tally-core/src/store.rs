//! Event store abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::DomainEvent;

/// Append-only, per-aggregate event storage with optimistic concurrency.
#[async_trait]
pub trait EventStore<E: DomainEvent>: Send + Sync {
    /// Load all events for a given aggregate, ordered by version.
    /// Returns an empty list when the stream does not exist.
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<E>, DomainError>;

    /// Append new events to an aggregate stream with optimistic concurrency.
    /// `expected_version` is the last version the caller read (`-1` for a
    /// new stream). An empty batch is a no-op.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[E],
    ) -> Result<(), DomainError>;

    /// Returns the version of the last event in the stream, if any.
    async fn stream_version(&self, aggregate_id: Uuid) -> Result<Option<i64>, DomainError>;
}

/// Checks that `events` belong to `aggregate_id` and continue the stream
/// contiguously from `expected_version`.
///
/// # Errors
///
/// Returns `DomainError::InvalidEventSequence` for the first event whose
/// version breaks the sequence, and `DomainError::Infrastructure` if an event
/// targets a different aggregate.
pub fn check_sequence<E: DomainEvent>(
    aggregate_id: Uuid,
    expected_version: i64,
    events: &[E],
) -> Result<(), DomainError> {
    let mut next = expected_version + 1;
    for event in events {
        if event.aggregate_id() != aggregate_id {
            return Err(DomainError::Infrastructure(format!(
                "event {} belongs to aggregate {}, not {aggregate_id}",
                event.metadata().event_id,
                event.aggregate_id()
            )));
        }
        if event.version() != next {
            return Err(DomainError::InvalidEventSequence {
                aggregate_id,
                expected: next,
                found: event.version(),
            });
        }
        next += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventMetadata;
    use chrono::Utc;

    #[derive(Debug, Clone)]
    struct Ping(EventMetadata);

    impl DomainEvent for Ping {
        type Kind = ();

        fn kind(&self) -> Self::Kind {}

        fn event_type(&self) -> &'static str {
            "test.ping"
        }

        fn metadata(&self) -> &EventMetadata {
            &self.0
        }
    }

    fn ping(id: Uuid, version: i64) -> Ping {
        Ping(EventMetadata::new(id, version, Uuid::nil(), Utc::now()))
    }

    #[test]
    fn test_check_sequence_accepts_contiguous_batch() {
        let id = Uuid::new_v4();
        let events = vec![ping(id, 3), ping(id, 4), ping(id, 5)];
        assert!(check_sequence(id, 2, &events).is_ok());
    }

    #[test]
    fn test_check_sequence_accepts_new_stream() {
        let id = Uuid::new_v4();
        assert!(check_sequence(id, -1, &[ping(id, 0)]).is_ok());
    }

    #[test]
    fn test_check_sequence_rejects_gap() {
        // Arrange
        let id = Uuid::new_v4();
        let events = vec![ping(id, 3), ping(id, 5)];

        // Act
        let result = check_sequence(id, 2, &events);

        // Assert
        assert_eq!(
            result.unwrap_err(),
            DomainError::InvalidEventSequence {
                aggregate_id: id,
                expected: 4,
                found: 5,
            }
        );
    }

    #[test]
    fn test_check_sequence_rejects_foreign_event() {
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let result = check_sequence(id, -1, &[ping(other, 0)]);
        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
