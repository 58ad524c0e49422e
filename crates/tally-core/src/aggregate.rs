//! Aggregate root abstraction.
//!
//! An aggregate is split in two: a domain-owned [`AggregateState`] that holds
//! the business fields and knows how to evolve them from one event, and the
//! generic [`Aggregate`] envelope that tracks identity, version and the
//! uncommitted-event buffer. The envelope only hands out `&S`, so the state
//! can change through event application and nothing else.

use uuid::Uuid;

use crate::event::{DomainEvent, NO_VERSION};

/// Domain state evolved exclusively by applying events.
pub trait AggregateState: Default + Send + Sync {
    /// The event type this state consumes.
    type Event: DomainEvent;

    /// Evolve the state by one event. Must be deterministic and infallible.
    fn when(&mut self, event: &Self::Event);
}

/// Trait the repository uses to rebuild and persist aggregates.
pub trait AggregateRoot: Send + Sync + Sized {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Rebuilds an aggregate by replaying its full history.
    fn from_history(id: Uuid, history: &[Self::Event]) -> Self;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the version of the last applied event (`-1` if none).
    fn version(&self) -> i64;

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self);

    /// Returns the stream version before the uncommitted events were applied.
    #[allow(clippy::cast_possible_wrap)]
    fn committed_version(&self) -> i64 {
        self.version() - self.uncommitted_events().len() as i64
    }
}

/// Generic event-sourced aggregate envelope.
#[derive(Debug, Clone)]
pub struct Aggregate<S: AggregateState> {
    id: Uuid,
    version: i64,
    state: S,
    uncommitted_events: Vec<S::Event>,
}

impl<S: AggregateState> Aggregate<S> {
    /// Creates an empty, unversioned aggregate.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: NO_VERSION,
            state: S::default(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns the aggregate identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the version of the last applied event.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns the version the next event must carry.
    #[must_use]
    pub fn next_version(&self) -> i64 {
        self.version + 1
    }

    /// Read-only view of the domain state.
    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Applies a freshly produced event and buffers it for persistence.
    pub fn apply_change(&mut self, event: S::Event) {
        self.state.when(&event);
        self.version = event.version();
        self.uncommitted_events.push(event);
    }

    /// Replays persisted events without buffering them.
    pub fn load_from_history<'a, I>(&mut self, history: I)
    where
        I: IntoIterator<Item = &'a S::Event>,
    {
        for event in history {
            self.state.when(event);
            self.version = event.version();
        }
    }

    /// Returns events applied since the last save.
    #[must_use]
    pub fn uncommitted_events(&self) -> &[S::Event] {
        &self.uncommitted_events
    }

    /// Drops the uncommitted buffer after a successful save.
    pub fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

impl<S: AggregateState> AggregateRoot for Aggregate<S> {
    type Event = S::Event;

    fn from_history(id: Uuid, history: &[Self::Event]) -> Self {
        let mut aggregate = Self::new(id);
        aggregate.load_from_history(history);
        aggregate
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
