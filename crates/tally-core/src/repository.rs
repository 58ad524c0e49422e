//! Event-sourcing repository.
//!
//! Bridges an [`EventStore`] and live aggregates: loading replays the stream,
//! saving appends the pending events with the version the aggregate was
//! loaded at.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::aggregate::AggregateRoot;
use crate::error::DomainError;
use crate::store::EventStore;

/// Loads and saves aggregates of type `A`.
pub struct Repository<A: AggregateRoot> {
    store: Arc<dyn EventStore<A::Event>>,
}

impl<A: AggregateRoot> Repository<A> {
    /// Creates a repository over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore<A::Event>>) -> Self {
        Self { store }
    }

    /// Rebuilds the aggregate by replaying its stream.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the stream is empty, or
    /// whatever the store returns on load failure.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, aggregate_id: Uuid) -> Result<A, DomainError> {
        let history = self.store.load_events(aggregate_id).await?;
        if history.is_empty() {
            return Err(DomainError::AggregateNotFound(aggregate_id));
        }
        tracing::debug!(events = history.len(), "replaying aggregate");
        Ok(A::from_history(aggregate_id, &history))
    }

    /// Persists the aggregate's uncommitted events.
    ///
    /// The buffer is cleared only after the store accepted the append; on any
    /// error it is left intact so the caller can inspect it or retry.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if the stream moved since
    /// the aggregate was loaded, or any other store error.
    #[tracing::instrument(skip(self, aggregate), fields(aggregate_id = %aggregate.aggregate_id()))]
    pub async fn save(&self, aggregate: &mut A) -> Result<(), DomainError> {
        if aggregate.uncommitted_events().is_empty() {
            return Ok(());
        }
        let expected_version = aggregate.committed_version();
        self.store
            .append_events(
                aggregate.aggregate_id(),
                expected_version,
                aggregate.uncommitted_events(),
            )
            .await?;
        aggregate.clear_uncommitted_events();
        Ok(())
    }
}

impl<A: AggregateRoot> Clone for Repository<A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<A: AggregateRoot> fmt::Debug for Repository<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository").finish_non_exhaustive()
    }
}
