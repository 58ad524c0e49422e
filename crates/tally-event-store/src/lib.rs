//! Tally Event Store: in-memory event storage and dispatch.
//!
//! [`InMemoryEventStore`] keeps one append-only stream per aggregate and
//! publishes every committed event through an [`EventDispatcher`] before
//! the append returns.

pub mod dispatcher;
pub mod in_memory;

pub use dispatcher::{DispatchOutcome, EventDispatcher};
pub use in_memory::InMemoryEventStore;
