//! Concurrency tests for `InMemoryEventStore`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use tally_core::error::DomainError;
use tally_core::event::{DomainEvent, EventMetadata, NO_VERSION};
use tally_core::store::EventStore;
use tally_event_store::{EventDispatcher, InMemoryEventStore};
use tokio::sync::Barrier;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Bumped {
    metadata: EventMetadata,
    writer: usize,
}

impl DomainEvent for Bumped {
    type Kind = ();

    fn kind(&self) -> Self::Kind {}

    fn event_type(&self) -> &'static str {
        "test.bumped"
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

fn batch(id: Uuid, expected_version: i64, len: i64, writer: usize) -> Vec<Bumped> {
    (1..=len)
        .map(|offset| Bumped {
            metadata: EventMetadata::new(id, expected_version + offset, Uuid::new_v4(), Utc::now()),
            writer,
        })
        .collect()
}

async fn seeded_store(id: Uuid, up_to: i64) -> Arc<InMemoryEventStore<Bumped>> {
    let store = Arc::new(InMemoryEventStore::new(Arc::new(EventDispatcher::new())));
    store
        .append_events(id, NO_VERSION, &batch(id, NO_VERSION, up_to + 1, usize::MAX))
        .await
        .unwrap();
    store
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_appends_at_same_version_have_exactly_one_winner() {
    for _ in 0..50 {
        // Arrange
        let id = Uuid::new_v4();
        let store = seeded_store(id, 2).await;
        let barrier = Arc::new(Barrier::new(2));

        // Act
        let mut handles = Vec::new();
        for writer in 0..2 {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            let events = batch(id, 2, 3, writer);
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                store.append_events(id, 2, &events).await
            }));
        }
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        // Assert
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(
            loser,
            DomainError::ConcurrencyConflict {
                expected: 2,
                actual: 5,
                ..
            }
        ));

        let stream = store.load_events(id).await.unwrap();
        assert_eq!(stream.len(), 6);
        let versions: Vec<i64> = stream.iter().map(DomainEvent::version).collect();
        assert_eq!(versions, vec![0, 1, 2, 3, 4, 5]);
        let tail_writers: Vec<usize> = stream[3..].iter().map(|e| e.writer).collect();
        assert!(tail_writers.windows(2).all(|w| w[0] == w[1]));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_appends_to_different_streams_do_not_conflict() {
    // Arrange
    let dispatched = Arc::new(AtomicUsize::new(0));
    let dispatcher = Arc::new(EventDispatcher::new());
    let counter = Arc::clone(&dispatched);
    dispatcher.register_handler((), move |_: &Bumped| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let store = Arc::new(InMemoryEventStore::new(dispatcher));
    let ids: Vec<Uuid> = (0..16).map(|_| Uuid::new_v4()).collect();

    // Act
    let mut handles = Vec::new();
    for (writer, id) in ids.iter().copied().enumerate() {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            for version in 0..10 {
                store
                    .append_events(id, version - 1, &batch(id, version - 1, 1, writer))
                    .await?;
            }
            Ok::<_, DomainError>(())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Assert
    for id in ids {
        assert_eq!(store.stream_version(id).await.unwrap(), Some(9));
    }
    assert_eq!(dispatched.load(Ordering::SeqCst), 160);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_retry_after_conflict_eventually_applies_every_writer() {
    // Arrange
    let id = Uuid::new_v4();
    let store = seeded_store(id, 0).await;
    let writers = 8;

    // Act: each writer re-reads the version until its single event lands.
    let mut handles = Vec::new();
    for writer in 0..writers {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            loop {
                let current = store.stream_version(id).await?.unwrap_or(NO_VERSION);
                match store
                    .append_events(id, current, &batch(id, current, 1, writer))
                    .await
                {
                    Ok(()) => return Ok::<_, DomainError>(()),
                    Err(err) if err.is_retryable() => tokio::task::yield_now().await,
                    Err(err) => return Err(err),
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Assert
    let stream = store.load_events(id).await.unwrap();
    assert_eq!(stream.len(), writers + 1);
    let mut seen: Vec<usize> = stream[1..].iter().map(|e| e.writer).collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..writers).collect::<Vec<_>>());
}
