//! The scripted scenario the demo runs against a fresh context.

use rust_decimal::Decimal;
use tally_account::application::command_handlers::AccountCommandService;
use tally_account::domain::commands::{CloseAccount, DepositMoney, OpenAccount, WithdrawMoney};
use uuid::Uuid;

use crate::error::AppError;

/// Ids of the accounts created by [`seed_accounts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededAccounts {
    /// Opened with 1000, then +500 and −300.
    pub alice: Uuid,
    /// Opened empty, then +200, then closed.
    pub bob: Uuid,
}

/// Opens and operates the two demo accounts. All commands of one run share
/// a correlation id.
///
/// # Errors
///
/// Returns `AppError::Domain` if any command is rejected.
pub async fn seed_accounts(commands: &AccountCommandService) -> Result<SeededAccounts, AppError> {
    let correlation_id = Uuid::now_v7();
    let alice = Uuid::now_v7();
    let bob = Uuid::now_v7();
    tracing::info!(%correlation_id, %alice, %bob, "seeding accounts");

    commands
        .handle_open_account(&OpenAccount {
            correlation_id,
            account_id: alice,
            owner_name: "Alice".into(),
            initial_balance: Decimal::from(1000),
        })
        .await?;
    commands
        .handle_deposit(&DepositMoney {
            correlation_id,
            account_id: alice,
            amount: Decimal::from(500),
        })
        .await?;
    commands
        .handle_withdraw(&WithdrawMoney {
            correlation_id,
            account_id: alice,
            amount: Decimal::from(300),
        })
        .await?;

    commands
        .handle_open_account(&OpenAccount {
            correlation_id,
            account_id: bob,
            owner_name: "Bob".into(),
            initial_balance: Decimal::ZERO,
        })
        .await?;
    commands
        .handle_deposit(&DepositMoney {
            correlation_id,
            account_id: bob,
            amount: Decimal::from(200),
        })
        .await?;
    commands
        .handle_close_account(&CloseAccount {
            correlation_id,
            account_id: bob,
        })
        .await?;

    Ok(SeededAccounts { alice, bob })
}
