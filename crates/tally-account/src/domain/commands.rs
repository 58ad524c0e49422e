//! Commands for the bank account context.
//!
//! `validate` checks the shape of the input before any aggregate is touched;
//! business rules that depend on account state live on the aggregate.

use rust_decimal::Decimal;
use tally_core::command::Command;
use tally_core::error::DomainError;
use uuid::Uuid;

/// Command to open a new account.
#[derive(Debug, Clone)]
pub struct OpenAccount {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The account identifier.
    pub account_id: Uuid,
    /// Name of the account holder.
    pub owner_name: String,
    /// Balance the account starts with.
    pub initial_balance: Decimal,
}

impl OpenAccount {
    /// Checks the command input.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCommand` for a blank owner name or a
    /// negative initial balance.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.owner_name.trim().is_empty() {
            return Err(DomainError::InvalidCommand(
                "owner_name must not be blank".into(),
            ));
        }
        if self.initial_balance < Decimal::ZERO {
            return Err(DomainError::InvalidCommand(format!(
                "initial_balance must not be negative, got {}",
                self.initial_balance
            )));
        }
        Ok(())
    }
}

/// Command to deposit money into an account.
#[derive(Debug, Clone)]
pub struct DepositMoney {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The account identifier.
    pub account_id: Uuid,
    /// Amount to deposit.
    pub amount: Decimal,
}

impl DepositMoney {
    /// Checks the command input.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCommand` if the amount is not positive.
    pub fn validate(&self) -> Result<(), DomainError> {
        require_positive_amount(self.amount)
    }
}

/// Command to withdraw money from an account.
#[derive(Debug, Clone)]
pub struct WithdrawMoney {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The account identifier.
    pub account_id: Uuid,
    /// Amount to withdraw.
    pub amount: Decimal,
}

impl WithdrawMoney {
    /// Checks the command input.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCommand` if the amount is not positive.
    pub fn validate(&self) -> Result<(), DomainError> {
        require_positive_amount(self.amount)
    }
}

/// Command to close an account.
#[derive(Debug, Clone)]
pub struct CloseAccount {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The account identifier.
    pub account_id: Uuid,
}

fn require_positive_amount(amount: Decimal) -> Result<(), DomainError> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::InvalidCommand(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

macro_rules! impl_command {
    ($command:ty, $name:literal) => {
        impl Command for $command {
            fn command_type(&self) -> &'static str {
                $name
            }

            fn aggregate_id(&self) -> Uuid {
                self.account_id
            }

            fn correlation_id(&self) -> Uuid {
                self.correlation_id
            }
        }
    };
}

impl_command!(OpenAccount, "account.open");
impl_command!(DepositMoney, "account.deposit");
impl_command!(WithdrawMoney, "account.withdraw");
impl_command!(CloseAccount, "account.close");
