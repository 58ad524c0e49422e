//! Read-side projection abstraction.

use crate::error::ProjectionError;
use crate::event::DomainEvent;

/// Consumes dispatched events to maintain a query-optimized view.
///
/// Handlers run on the writer's call stack after the events are committed,
/// so they must not block and must not call back into the event store for
/// the stream being appended. Delivery is in stream order; duplicate or
/// out-of-order delivery is not expected.
pub trait Projection<E: DomainEvent>: Send + Sync {
    /// Name used in logs and in [`ProjectionError`].
    fn name(&self) -> &'static str;

    /// Event kinds this projection wants delivered.
    fn interests(&self) -> &'static [E::Kind];

    /// Applies one committed event to the view.
    ///
    /// # Errors
    ///
    /// Returns `ProjectionError` if the view could not be updated. The event
    /// stays committed regardless.
    fn handle(&self, event: &E) -> Result<(), ProjectionError>;
}
