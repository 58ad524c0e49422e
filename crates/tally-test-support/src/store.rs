//! Test stores: mock `EventStore` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use tally_core::error::DomainError;
use tally_core::event::DomainEvent;
use tally_core::store::EventStore;
use uuid::Uuid;

/// An event store that returns a fixed history from `load_events` and records
/// every `append_events` call without checking versions.
#[derive(Debug)]
pub struct RecordingEventStore<E: DomainEvent> {
    history: Vec<E>,
    appended: Mutex<Vec<(Uuid, i64, Vec<E>)>>,
}

impl<E: DomainEvent> RecordingEventStore<E> {
    /// Create a store whose every `load_events` call returns `history`.
    #[must_use]
    pub fn new(history: Vec<E>) -> Self {
        Self {
            history,
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Create a store with no history.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Returns a snapshot of all appends as `(aggregate_id, expected_version, events)`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<(Uuid, i64, Vec<E>)> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl<E: DomainEvent> EventStore<E> for RecordingEventStore<E> {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<E>, DomainError> {
        Ok(self.history.clone())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[E],
    ) -> Result<(), DomainError> {
        self.appended
            .lock()
            .unwrap()
            .push((aggregate_id, expected_version, events.to_vec()));
        Ok(())
    }

    async fn stream_version(&self, _aggregate_id: Uuid) -> Result<Option<i64>, DomainError> {
        Ok(self.history.last().map(DomainEvent::version))
    }
}

/// An event store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingEventStore;

#[async_trait]
impl<E: DomainEvent> EventStore<E> for FailingEventStore {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<E>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[E],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn stream_version(&self, _aggregate_id: Uuid) -> Result<Option<i64>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
