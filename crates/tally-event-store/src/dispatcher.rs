//! Kind-routed event dispatcher.
//!
//! Handlers are keyed on the event's [`DomainEvent::Kind`] discriminant.
//! A failing or panicking handler is logged and counted; it never stops the
//! remaining handlers and never reaches the writer that committed the event.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock};

use tally_core::error::ProjectionError;
use tally_core::event::DomainEvent;
use tally_core::projection::Projection;

type Handler<E> = Arc<dyn Fn(&E) -> Result<(), ProjectionError> + Send + Sync>;

/// Result of publishing one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Number of handlers invoked.
    pub invoked: usize,
    /// Number of handlers that returned an error.
    pub failed: usize,
}

impl DispatchOutcome {
    /// Returns `true` if every invoked handler succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Delivers committed events to the handlers registered for their kind.
pub struct EventDispatcher<E: DomainEvent> {
    handlers: RwLock<HashMap<E::Kind, Vec<Handler<E>>>>,
}

impl<E: DomainEvent> EventDispatcher<E> {
    /// Creates a dispatcher with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a handler for one event kind. Handlers for the same kind
    /// run in registration order.
    pub fn register_handler<F>(&self, kind: E::Kind, handler: F)
    where
        F: Fn(&E) -> Result<(), ProjectionError> + Send + Sync + 'static,
    {
        self.write_handlers()
            .entry(kind)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Registers `projection` for every kind it is interested in.
    pub fn register_projection<P>(&self, projection: Arc<P>)
    where
        P: Projection<E> + 'static,
    {
        for &kind in projection.interests() {
            let projection = Arc::clone(&projection);
            self.register_handler(kind, move |event| projection.handle(event));
        }
        tracing::debug!(projection = projection.name(), "projection registered");
    }

    /// Returns the number of handlers registered for `kind`.
    #[must_use]
    pub fn handler_count(&self, kind: E::Kind) -> usize {
        self.read_handlers().get(&kind).map_or(0, Vec::len)
    }

    /// Delivers `event` to every handler registered for its kind.
    ///
    /// Handler errors and panics are logged and counted in the returned
    /// outcome.
    pub fn publish(&self, event: &E) -> DispatchOutcome {
        // Snapshot so handlers run without holding the registry lock.
        let handlers: Vec<Handler<E>> = self
            .read_handlers()
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();

        let mut outcome = DispatchOutcome::default();
        for handler in &handlers {
            outcome.invoked += 1;
            let error = match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(payload) => format!("handler panicked: {}", panic_message(&*payload)),
            };
            outcome.failed += 1;
            tracing::error!(
                %error,
                event_type = event.event_type(),
                aggregate_id = %event.aggregate_id(),
                version = event.version(),
                "projection handler failed"
            );
        }
        tracing::trace!(
            event_type = event.event_type(),
            invoked = outcome.invoked,
            failed = outcome.failed,
            "event dispatched"
        );
        outcome
    }

    fn read_handlers(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<E::Kind, Vec<Handler<E>>>> {
        // Handlers never run under this lock, so poisoning cannot leave the
        // registry half-updated.
        self.handlers
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_handlers(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<E::Kind, Vec<Handler<E>>>> {
        self.handlers
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl<E: DomainEvent> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: DomainEvent> fmt::Debug for EventDispatcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds = self.read_handlers().len();
        f.debug_struct("EventDispatcher")
            .field("kinds", &kinds)
            .finish_non_exhaustive()
    }
}
