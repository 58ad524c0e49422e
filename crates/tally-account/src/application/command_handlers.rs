//! Command handlers for the bank account context.
//!
//! Each handler validates the command, loads the account (except on open),
//! runs the domain method, and saves the resulting events through the
//! repository.

use std::fmt;
use std::sync::Arc;

use tally_core::aggregate::AggregateRoot;
use tally_core::clock::Clock;
use tally_core::error::DomainError;
use tally_core::repository::Repository;
use uuid::Uuid;

use crate::domain::aggregates::BankAccount;
use crate::domain::commands::{CloseAccount, DepositMoney, OpenAccount, WithdrawMoney};
use crate::domain::events::AccountEvent;

/// Result of a successfully handled command.
#[derive(Debug, Clone)]
pub struct AccountCommandResult {
    /// The aggregate ID affected by the command.
    pub aggregate_id: Uuid,
    /// Version of the account after the command committed.
    pub version: i64,
    /// The events produced and persisted.
    pub events: Vec<AccountEvent>,
}

/// Write-side entry point for account commands.
#[derive(Clone)]
pub struct AccountCommandService {
    repository: Repository<BankAccount>,
    clock: Arc<dyn Clock>,
}

impl AccountCommandService {
    /// Creates a service that persists through `repository` and stamps
    /// events with `clock`.
    #[must_use]
    pub fn new(repository: Repository<BankAccount>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Handles the `OpenAccount` command.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCommand` for malformed input,
    /// `DomainError::ConcurrencyConflict` if the account id is already taken,
    /// or a store error.
    #[tracing::instrument(
        skip(self, command),
        fields(command = "account.open", account_id = %command.account_id, correlation_id = %command.correlation_id)
    )]
    pub async fn handle_open_account(
        &self,
        command: &OpenAccount,
    ) -> Result<AccountCommandResult, DomainError> {
        command.validate()?;
        let account = BankAccount::open(
            command.account_id,
            &command.owner_name,
            command.initial_balance,
            command.correlation_id,
            self.clock.as_ref(),
        )?;
        self.commit(account).await
    }

    /// Handles the `DepositMoney` command.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCommand` for a non-positive amount,
    /// `DomainError::AggregateNotFound` for an unknown account,
    /// `DomainError::RuleViolation` if the account is closed, or
    /// `DomainError::ConcurrencyConflict` if the account moved meanwhile.
    #[tracing::instrument(
        skip(self, command),
        fields(command = "account.deposit", account_id = %command.account_id, correlation_id = %command.correlation_id)
    )]
    pub async fn handle_deposit(
        &self,
        command: &DepositMoney,
    ) -> Result<AccountCommandResult, DomainError> {
        command.validate()?;
        let mut account = self.repository.get_by_id(command.account_id).await?;
        account.deposit(command.amount, command.correlation_id, self.clock.as_ref())?;
        self.commit(account).await
    }

    /// Handles the `WithdrawMoney` command.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCommand` for a non-positive amount,
    /// `DomainError::AggregateNotFound` for an unknown account,
    /// `DomainError::RuleViolation` if the account is closed or lacks funds,
    /// or `DomainError::ConcurrencyConflict` if the account moved meanwhile.
    #[tracing::instrument(
        skip(self, command),
        fields(command = "account.withdraw", account_id = %command.account_id, correlation_id = %command.correlation_id)
    )]
    pub async fn handle_withdraw(
        &self,
        command: &WithdrawMoney,
    ) -> Result<AccountCommandResult, DomainError> {
        command.validate()?;
        let mut account = self.repository.get_by_id(command.account_id).await?;
        account.withdraw(command.amount, command.correlation_id, self.clock.as_ref())?;
        self.commit(account).await
    }

    /// Handles the `CloseAccount` command.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` for an unknown account,
    /// `DomainError::RuleViolation` if it is already closed, or
    /// `DomainError::ConcurrencyConflict` if the account moved meanwhile.
    #[tracing::instrument(
        skip(self, command),
        fields(command = "account.close", account_id = %command.account_id, correlation_id = %command.correlation_id)
    )]
    pub async fn handle_close_account(
        &self,
        command: &CloseAccount,
    ) -> Result<AccountCommandResult, DomainError> {
        let mut account = self.repository.get_by_id(command.account_id).await?;
        account.close(command.correlation_id, self.clock.as_ref())?;
        self.commit(account).await
    }

    async fn commit(&self, mut account: BankAccount) -> Result<AccountCommandResult, DomainError> {
        let events = account.uncommitted_events().to_vec();
        if let Err(error) = self.repository.save(&mut account).await {
            if error.is_retryable() {
                tracing::warn!(%error, "account changed concurrently; reload and retry");
            }
            return Err(error);
        }
        tracing::info!(version = account.version(), events = events.len(), "command committed");
        Ok(AccountCommandResult {
            aggregate_id: account.id(),
            version: account.version(),
            events,
        })
    }
}

impl fmt::Debug for AccountCommandService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCommandService")
            .field("repository", &self.repository)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use tally_core::event::{DomainEvent, EventMetadata};
    use tally_test_support::{FailingEventStore, FixedClock, RecordingEventStore, fixed_now};

    use super::*;
    use crate::domain::events::{AccountEventKind, AccountEventType, AccountOpened};

    fn service_over(store: Arc<RecordingEventStore<AccountEvent>>) -> AccountCommandService {
        AccountCommandService::new(
            Repository::<BankAccount>::new(store),
            Arc::new(FixedClock::default()),
        )
    }

    fn opened_event(account_id: Uuid, balance: i64) -> AccountEvent {
        AccountEvent {
            metadata: EventMetadata::new(account_id, 0, Uuid::new_v4(), fixed_now()),
            kind: AccountEventKind::AccountOpened(AccountOpened {
                account_id,
                owner_name: "Alice".into(),
                initial_balance: Decimal::from(balance),
            }),
        }
    }

    #[tokio::test]
    async fn test_handle_open_account_appends_opened_event_at_version_zero() {
        // Arrange
        let store = Arc::new(RecordingEventStore::empty());
        let service = service_over(Arc::clone(&store));
        let command = OpenAccount {
            correlation_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            owner_name: "Alice".into(),
            initial_balance: Decimal::from(1000),
        };

        // Act
        let result = service.handle_open_account(&command).await.unwrap();

        // Assert
        assert_eq!(result.aggregate_id, command.account_id);
        assert_eq!(result.version, 0);
        assert_eq!(result.events.len(), 1);

        let appended = store.appended_events();
        assert_eq!(appended.len(), 1);
        let (aggregate_id, expected_version, events) = &appended[0];
        assert_eq!(*aggregate_id, command.account_id);
        assert_eq!(*expected_version, -1);

        let event = &events[0];
        assert_eq!(event.kind(), AccountEventType::Opened);
        assert_eq!(event.metadata().correlation_id, command.correlation_id);
        assert_eq!(event.metadata().causation_id, command.correlation_id);
        assert_eq!(event.metadata().occurred_at, fixed_now());
    }

    #[tokio::test]
    async fn test_handle_deposit_appends_after_loaded_version() {
        // Arrange
        let account_id = Uuid::new_v4();
        let store = Arc::new(RecordingEventStore::new(vec![opened_event(account_id, 100)]));
        let service = service_over(Arc::clone(&store));
        let command = DepositMoney {
            correlation_id: Uuid::new_v4(),
            account_id,
            amount: Decimal::from(25),
        };

        // Act
        let result = service.handle_deposit(&command).await.unwrap();

        // Assert
        assert_eq!(result.version, 1);
        let appended = store.appended_events();
        let (_, expected_version, events) = &appended[0];
        assert_eq!(*expected_version, 0);
        assert_eq!(events[0].version(), 1);
        match &events[0].kind {
            AccountEventKind::MoneyDeposited(deposit) => {
                assert_eq!(deposit.amount, Decimal::from(25));
            }
            other => panic!("expected MoneyDeposited payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_withdraw_rejects_overdraft_without_appending() {
        // Arrange
        let account_id = Uuid::new_v4();
        let store = Arc::new(RecordingEventStore::new(vec![opened_event(account_id, 10)]));
        let service = service_over(Arc::clone(&store));
        let command = WithdrawMoney {
            correlation_id: Uuid::new_v4(),
            account_id,
            amount: Decimal::from(11),
        };

        // Act
        let result = service.handle_withdraw(&command).await;

        // Assert
        assert!(matches!(result, Err(DomainError::RuleViolation(_))));
        assert!(store.appended_events().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_command_never_reaches_store() {
        // Arrange
        let service = AccountCommandService::new(
            Repository::<BankAccount>::new(Arc::new(FailingEventStore)),
            Arc::new(FixedClock::default()),
        );
        let command = DepositMoney {
            correlation_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            amount: Decimal::ZERO,
        };

        // Act
        let result = service.handle_deposit(&command).await;

        // Assert
        assert!(matches!(result, Err(DomainError::InvalidCommand(_))));
    }

    #[tokio::test]
    async fn test_handle_close_account_returns_not_found_for_unknown_account() {
        let service = service_over(Arc::new(RecordingEventStore::empty()));
        let account_id = Uuid::new_v4();
        let command = CloseAccount {
            correlation_id: Uuid::new_v4(),
            account_id,
        };

        let result = service.handle_close_account(&command).await;

        assert_eq!(result.unwrap_err(), DomainError::AggregateNotFound(account_id));
    }

    #[tokio::test]
    async fn test_store_failure_is_propagated() {
        let service = AccountCommandService::new(
            Repository::<BankAccount>::new(Arc::new(FailingEventStore)),
            Arc::new(FixedClock::default()),
        );
        let command = OpenAccount {
            correlation_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            owner_name: "Bob".into(),
            initial_balance: Decimal::ZERO,
        };

        let result = service.handle_open_account(&command).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
