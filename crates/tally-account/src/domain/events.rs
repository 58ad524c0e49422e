//! Domain events for the bank account context.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::event::{DomainEvent, EventMetadata};
use uuid::Uuid;

/// Event type name for [`AccountOpened`].
pub const ACCOUNT_OPENED_EVENT_TYPE: &str = "account.opened";
/// Event type name for [`MoneyDeposited`].
pub const MONEY_DEPOSITED_EVENT_TYPE: &str = "account.money_deposited";
/// Event type name for [`MoneyWithdrawn`].
pub const MONEY_WITHDRAWN_EVENT_TYPE: &str = "account.money_withdrawn";
/// Event type name for [`AccountClosed`].
pub const ACCOUNT_CLOSED_EVENT_TYPE: &str = "account.closed";

/// Emitted when an account is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOpened {
    /// The account identifier.
    pub account_id: Uuid,
    /// Name of the account holder.
    pub owner_name: String,
    /// Balance the account starts with.
    pub initial_balance: Decimal,
}

/// Emitted when money is deposited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyDeposited {
    /// The account identifier.
    pub account_id: Uuid,
    /// Amount deposited (always positive).
    pub amount: Decimal,
}

/// Emitted when money is withdrawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyWithdrawn {
    /// The account identifier.
    pub account_id: Uuid,
    /// Amount withdrawn (always positive).
    pub amount: Decimal,
}

/// Emitted when an account is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountClosed {
    /// The account identifier.
    pub account_id: Uuid,
}

/// Event payload variants for the bank account context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountEventKind {
    /// The account has been opened.
    AccountOpened(AccountOpened),
    /// Money has been deposited.
    MoneyDeposited(MoneyDeposited),
    /// Money has been withdrawn.
    MoneyWithdrawn(MoneyWithdrawn),
    /// The account has been closed.
    AccountClosed(AccountClosed),
}

/// Payload-free discriminant of [`AccountEventKind`], used for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountEventType {
    /// See [`AccountOpened`].
    Opened,
    /// See [`MoneyDeposited`].
    Deposited,
    /// See [`MoneyWithdrawn`].
    Withdrawn,
    /// See [`AccountClosed`].
    Closed,
}

impl AccountEventType {
    /// Every account event type.
    pub const ALL: [Self; 4] = [Self::Opened, Self::Deposited, Self::Withdrawn, Self::Closed];

    /// Returns the event type name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opened => ACCOUNT_OPENED_EVENT_TYPE,
            Self::Deposited => MONEY_DEPOSITED_EVENT_TYPE,
            Self::Withdrawn => MONEY_WITHDRAWN_EVENT_TYPE,
            Self::Closed => ACCOUNT_CLOSED_EVENT_TYPE,
        }
    }
}

impl AccountEventKind {
    /// Returns the routing discriminant of this payload.
    #[must_use]
    pub fn event_type(&self) -> AccountEventType {
        match self {
            Self::AccountOpened(_) => AccountEventType::Opened,
            Self::MoneyDeposited(_) => AccountEventType::Deposited,
            Self::MoneyWithdrawn(_) => AccountEventType::Withdrawn,
            Self::AccountClosed(_) => AccountEventType::Closed,
        }
    }
}

/// Domain event envelope for the bank account context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: AccountEventKind,
}

impl DomainEvent for AccountEvent {
    type Kind = AccountEventType;

    fn kind(&self) -> Self::Kind {
        self.kind.event_type()
    }

    fn event_type(&self) -> &'static str {
        self.kind.event_type().as_str()
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_event_type_follows_payload() {
        let account_id = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let event = AccountEvent {
            metadata: EventMetadata::new(account_id, 1, Uuid::new_v4(), now),
            kind: AccountEventKind::MoneyDeposited(MoneyDeposited {
                account_id,
                amount: Decimal::from(5),
            }),
        };

        assert_eq!(event.kind(), AccountEventType::Deposited);
        assert_eq!(event.event_type(), MONEY_DEPOSITED_EVENT_TYPE);
        assert_eq!(event.version(), 1);
        assert_eq!(event.aggregate_id(), account_id);
    }

    #[test]
    fn test_all_event_types_have_distinct_names() {
        let mut names: Vec<&str> = AccountEventType::ALL.iter().map(|t| t.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), AccountEventType::ALL.len());
    }

    #[test]
    fn test_payload_serializes_with_variant_tag() {
        let account_id = Uuid::new_v4();
        let kind = AccountEventKind::AccountClosed(AccountClosed { account_id });

        let json = serde_json::to_value(&kind).unwrap();

        assert_eq!(json["AccountClosed"]["account_id"], account_id.to_string());
    }
}
