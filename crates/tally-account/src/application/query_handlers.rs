//! Query handlers for the bank account context.
//!
//! Queries read only from the projected read models; they never touch the
//! event store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tally_core::error::DomainError;
use uuid::Uuid;

use crate::application::projections::{AccountReadModel, AccountReadModelStore};

/// Read-only view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    /// The account identifier.
    pub account_id: Uuid,
    /// Name of the account holder.
    pub owner_name: String,
    /// Current balance.
    pub balance: Decimal,
    /// Whether the account has been closed.
    pub closed: bool,
    /// Version of the last projected event.
    pub version: i64,
    /// Time of the last projected event.
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<AccountReadModel> for AccountView {
    fn from(model: AccountReadModel) -> Self {
        Self {
            account_id: model.account_id,
            owner_name: model.owner_name,
            balance: model.balance,
            closed: model.closed,
            version: model.version,
            updated_at: model.updated_at,
        }
    }
}

/// Retrieves an account by its ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the account has not been
/// projected.
pub fn get_account_by_id(
    account_id: Uuid,
    read_models: &AccountReadModelStore,
) -> Result<AccountView, DomainError> {
    read_models.get(account_id).map(AccountView::from)
}

/// Lists every projected account in the order they were opened.
#[must_use]
pub fn list_accounts(read_models: &AccountReadModelStore) -> Vec<AccountView> {
    read_models
        .all()
        .into_iter()
        .map(AccountView::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tally_core::event::EventMetadata;
    use tally_core::projection::Projection;
    use tally_test_support::fixed_now;

    use super::*;
    use crate::application::projections::AccountProjection;
    use crate::domain::events::{AccountEvent, AccountEventKind, AccountOpened};

    fn project_opened(store: &Arc<AccountReadModelStore>, owner: &str) -> Uuid {
        let account_id = Uuid::new_v4();
        let event = AccountEvent {
            metadata: EventMetadata::new(account_id, 0, Uuid::new_v4(), fixed_now()),
            kind: AccountEventKind::AccountOpened(AccountOpened {
                account_id,
                owner_name: owner.into(),
                initial_balance: Decimal::from(40),
            }),
        };
        AccountProjection::new(Arc::clone(store))
            .handle(&event)
            .unwrap();
        account_id
    }

    #[test]
    fn test_get_account_by_id_returns_view() {
        // Arrange
        let store = Arc::new(AccountReadModelStore::new());
        let account_id = project_opened(&store, "Alice");

        // Act
        let view = get_account_by_id(account_id, &store).unwrap();

        // Assert
        assert_eq!(view.account_id, account_id);
        assert_eq!(view.owner_name, "Alice");
        assert_eq!(view.balance, Decimal::from(40));
        assert!(!view.closed);
        assert_eq!(view.version, 0);
        assert_eq!(view.updated_at, Some(fixed_now()));
    }

    #[test]
    fn test_get_account_by_id_returns_not_found() {
        let store = AccountReadModelStore::new();
        let account_id = Uuid::new_v4();

        let result = get_account_by_id(account_id, &store);

        match result.unwrap_err() {
            DomainError::AggregateNotFound(id) => assert_eq!(id, account_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_list_accounts_preserves_open_order() {
        let store = Arc::new(AccountReadModelStore::new());
        let alice = project_opened(&store, "Alice");
        let bob = project_opened(&store, "Bob");

        let views = list_accounts(&store);

        let ids: Vec<Uuid> = views.iter().map(|v| v.account_id).collect();
        assert_eq!(ids, vec![alice, bob]);
    }

    #[test]
    fn test_view_serializes_balance() {
        let store = Arc::new(AccountReadModelStore::new());
        let account_id = project_opened(&store, "Alice");

        let json = serde_json::to_value(get_account_by_id(account_id, &store).unwrap()).unwrap();

        assert_eq!(json["owner_name"], "Alice");
        assert_eq!(json["closed"], false);
    }
}
