//! In-memory implementation of the `EventStore` trait.
//!
//! Streams live in a map guarded by an `RwLock`; each stream carries its own
//! `Mutex`. The version check, the append and the dispatch of the new events
//! all happen under that per-stream mutex, so only writers to the same stream
//! contend and every stream's events are published in append order.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use async_trait::async_trait;
use tally_core::error::DomainError;
use tally_core::event::{DomainEvent, NO_VERSION};
use tally_core::store::{EventStore, check_sequence};
use uuid::Uuid;

use crate::dispatcher::EventDispatcher;

type Stream<E> = Arc<Mutex<Vec<E>>>;

/// Append-only event store held entirely in memory.
pub struct InMemoryEventStore<E: DomainEvent> {
    streams: RwLock<HashMap<Uuid, Stream<E>>>,
    dispatcher: Arc<EventDispatcher<E>>,
}

impl<E: DomainEvent> InMemoryEventStore<E> {
    /// Creates an empty store that publishes committed events to `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: Arc<EventDispatcher<E>>) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            dispatcher,
        }
    }

    /// Returns the dispatcher this store publishes to.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<EventDispatcher<E>> {
        &self.dispatcher
    }

    /// Returns the ids of every stream, in no particular order.
    #[must_use]
    pub fn stream_ids(&self) -> Vec<Uuid> {
        self.streams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    fn existing_stream(&self, aggregate_id: Uuid) -> Option<Stream<E>> {
        self.streams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&aggregate_id)
            .cloned()
    }

    /// Returns the stream to append to. A stream entry is only created for
    /// an append that starts a new stream.
    fn stream_for_append(&self, aggregate_id: Uuid, expected_version: i64) -> Option<Stream<E>> {
        if let Some(stream) = self.existing_stream(aggregate_id) {
            return Some(stream);
        }
        if expected_version != NO_VERSION {
            return None;
        }
        let mut streams = self.streams.write().unwrap_or_else(PoisonError::into_inner);
        Some(Arc::clone(streams.entry(aggregate_id).or_default()))
    }

    fn lock(stream: &Stream<E>) -> MutexGuard<'_, Vec<E>> {
        // Appends validate before mutating, so a poisoned stream is still
        // consistent.
        stream.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append_locked(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[E],
    ) -> Result<(), DomainError> {
        let Some(stream) = self.stream_for_append(aggregate_id, expected_version) else {
            return Err(Self::conflict(aggregate_id, expected_version, NO_VERSION));
        };
        let mut guard = Self::lock(&stream);

        let actual = guard.last().map_or(NO_VERSION, DomainEvent::version);
        if actual != expected_version {
            return Err(Self::conflict(aggregate_id, expected_version, actual));
        }

        guard.extend_from_slice(events);
        tracing::debug!(
            %aggregate_id,
            appended = events.len(),
            version = guard.last().map_or(NO_VERSION, DomainEvent::version),
            "events appended"
        );

        for event in events {
            self.dispatcher.publish(event);
        }
        Ok(())
    }

    fn conflict(aggregate_id: Uuid, expected_version: i64, actual: i64) -> DomainError {
        tracing::warn!(
            %aggregate_id,
            expected_version,
            actual_version = actual,
            "rejecting append: concurrency conflict"
        );
        DomainError::ConcurrencyConflict {
            aggregate_id,
            expected: expected_version,
            actual,
        }
    }
}

#[async_trait]
impl<E: DomainEvent> EventStore<E> for InMemoryEventStore<E> {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<E>, DomainError> {
        Ok(self
            .existing_stream(aggregate_id)
            .map(|stream| Self::lock(&stream).clone())
            .unwrap_or_default())
    }

    #[tracing::instrument(skip(self, events), fields(event_count = events.len()))]
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[E],
    ) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }
        check_sequence(aggregate_id, expected_version, events)?;
        self.append_locked(aggregate_id, expected_version, events)
    }

    async fn stream_version(&self, aggregate_id: Uuid) -> Result<Option<i64>, DomainError> {
        Ok(self
            .existing_stream(aggregate_id)
            .and_then(|stream| Self::lock(&stream).last().map(DomainEvent::version)))
    }
}

impl<E: DomainEvent> fmt::Debug for InMemoryEventStore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let streams = self
            .streams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("InMemoryEventStore")
            .field("streams", &streams)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}
