//! Aggregate roots for the bank account context.

use rust_decimal::Decimal;
use tally_core::aggregate::{Aggregate, AggregateRoot, AggregateState};
use tally_core::clock::Clock;
use tally_core::error::DomainError;
use tally_core::event::EventMetadata;
use uuid::Uuid;

use super::events::{
    AccountClosed, AccountEvent, AccountEventKind, AccountOpened, MoneyDeposited, MoneyWithdrawn,
};

/// Account fields, derived solely from the account's events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountState {
    owner_name: String,
    balance: Decimal,
    closed: bool,
}

impl AccountState {
    /// Name of the account holder.
    #[must_use]
    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    /// Current balance.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Whether the account has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl AggregateState for AccountState {
    type Event = AccountEvent;

    fn when(&mut self, event: &Self::Event) {
        match &event.kind {
            AccountEventKind::AccountOpened(payload) => {
                self.owner_name.clone_from(&payload.owner_name);
                self.balance = payload.initial_balance;
                self.closed = false;
            }
            AccountEventKind::MoneyDeposited(payload) => {
                self.balance += payload.amount;
            }
            AccountEventKind::MoneyWithdrawn(payload) => {
                self.balance -= payload.amount;
            }
            AccountEventKind::AccountClosed(_) => {
                self.closed = true;
            }
        }
    }
}

/// The aggregate root for a bank account.
#[derive(Debug, Clone)]
pub struct BankAccount {
    inner: Aggregate<AccountState>,
}

impl BankAccount {
    /// Opens a new account, producing an `AccountOpened` event at version 0.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::RuleViolation` if the owner name is blank or the
    /// initial balance is negative.
    pub fn open(
        id: Uuid,
        owner_name: &str,
        initial_balance: Decimal,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        if owner_name.trim().is_empty() {
            return Err(DomainError::RuleViolation(format!(
                "account {id} needs an owner name"
            )));
        }
        if initial_balance < Decimal::ZERO {
            return Err(DomainError::RuleViolation(format!(
                "initial balance must not be negative, got {initial_balance}"
            )));
        }

        let mut account = Self {
            inner: Aggregate::new(id),
        };
        let metadata = account.next_metadata(correlation_id, clock);
        account.inner.apply_change(AccountEvent {
            metadata,
            kind: AccountEventKind::AccountOpened(AccountOpened {
                account_id: id,
                owner_name: owner_name.trim().to_owned(),
                initial_balance,
            }),
        });
        Ok(account)
    }

    /// Deposits money, producing a `MoneyDeposited` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::RuleViolation` if the account is closed, the
    /// amount is not positive, or the new balance would overflow.
    pub fn deposit(
        &mut self,
        amount: Decimal,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_open()?;
        Self::ensure_positive("deposit", amount)?;
        if self.balance().checked_add(amount).is_none() {
            return Err(DomainError::RuleViolation(format!(
                "deposit of {amount} would overflow the balance of account {}",
                self.id()
            )));
        }

        let metadata = self.next_metadata(correlation_id, clock);
        self.inner.apply_change(AccountEvent {
            metadata,
            kind: AccountEventKind::MoneyDeposited(MoneyDeposited {
                account_id: self.id(),
                amount,
            }),
        });
        Ok(())
    }

    /// Withdraws money, producing a `MoneyWithdrawn` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::RuleViolation` if the account is closed, the
    /// amount is not positive, or the balance does not cover it.
    pub fn withdraw(
        &mut self,
        amount: Decimal,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_open()?;
        Self::ensure_positive("withdrawal", amount)?;
        if amount > self.balance() {
            return Err(DomainError::RuleViolation(format!(
                "insufficient funds in account {}: balance {}, requested {amount}",
                self.id(),
                self.balance()
            )));
        }

        let metadata = self.next_metadata(correlation_id, clock);
        self.inner.apply_change(AccountEvent {
            metadata,
            kind: AccountEventKind::MoneyWithdrawn(MoneyWithdrawn {
                account_id: self.id(),
                amount,
            }),
        });
        Ok(())
    }

    /// Closes the account, producing an `AccountClosed` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::RuleViolation` if the account is already closed.
    pub fn close(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_open()?;

        let metadata = self.next_metadata(correlation_id, clock);
        self.inner.apply_change(AccountEvent {
            metadata,
            kind: AccountEventKind::AccountClosed(AccountClosed {
                account_id: self.id(),
            }),
        });
        Ok(())
    }

    /// Returns the account identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.inner.id()
    }

    /// Returns the version of the last applied event.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.inner.version()
    }

    /// Read-only view of the account fields.
    #[must_use]
    pub fn state(&self) -> &AccountState {
        self.inner.state()
    }

    /// Current balance.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.inner.state().balance()
    }

    /// Whether the account has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.state().is_closed()
    }

    fn next_metadata(&self, correlation_id: Uuid, clock: &dyn Clock) -> EventMetadata {
        EventMetadata::new(
            self.id(),
            self.inner.next_version(),
            correlation_id,
            clock.now(),
        )
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.is_closed() {
            return Err(DomainError::RuleViolation(format!(
                "account {} is closed",
                self.id()
            )));
        }
        Ok(())
    }

    fn ensure_positive(operation: &str, amount: Decimal) -> Result<(), DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::RuleViolation(format!(
                "{operation} amount must be positive, got {amount}"
            )));
        }
        Ok(())
    }
}

impl AggregateRoot for BankAccount {
    type Event = AccountEvent;

    fn from_history(id: Uuid, history: &[Self::Event]) -> Self {
        Self {
            inner: Aggregate::from_history(id, history),
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.inner.id()
    }

    fn version(&self) -> i64 {
        self.inner.version()
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        self.inner.uncommitted_events()
    }

    fn clear_uncommitted_events(&mut self) {
        self.inner.clear_uncommitted_events();
    }
}
