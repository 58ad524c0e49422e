//! Shared test doubles for the Tally engine.

mod clock;
mod store;

pub use clock::{FixedClock, fixed_now};
pub use store::{FailingEventStore, RecordingEventStore};
