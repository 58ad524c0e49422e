//! Wiring for a self-contained, in-memory account context.

use std::sync::Arc;

use tally_core::clock::Clock;
use tally_core::repository::Repository;
use tally_event_store::{EventDispatcher, InMemoryEventStore};

use crate::application::command_handlers::AccountCommandService;
use crate::application::projections::{AccountProjection, AccountReadModelStore};
use crate::domain::aggregates::BankAccount;
use crate::domain::events::AccountEvent;

/// Every component of the account context, connected.
///
/// Writes go through `commands`; the store dispatches committed events to
/// the projection, which keeps `read_models` current.
#[derive(Debug, Clone)]
pub struct AccountContext {
    /// Dispatcher shared with the event store. Extra handlers may be
    /// registered here.
    pub dispatcher: Arc<EventDispatcher<AccountEvent>>,
    /// The event store holding every account stream.
    pub event_store: Arc<InMemoryEventStore<AccountEvent>>,
    /// Read models maintained by [`AccountProjection`].
    pub read_models: Arc<AccountReadModelStore>,
    /// Write-side command handlers.
    pub commands: AccountCommandService,
}

impl AccountContext {
    /// Builds the context over fresh in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        let dispatcher: Arc<EventDispatcher<AccountEvent>> = Arc::new(EventDispatcher::new());
        let read_models = Arc::new(AccountReadModelStore::new());
        dispatcher.register_projection(Arc::new(AccountProjection::new(Arc::clone(
            &read_models,
        ))));

        let event_store = Arc::new(InMemoryEventStore::new(Arc::clone(&dispatcher)));
        let repository = Repository::<BankAccount>::new(event_store.clone());
        let commands = AccountCommandService::new(repository, clock);

        tracing::debug!("account context wired");
        Self {
            dispatcher,
            event_store,
            read_models,
            commands,
        }
    }
}
