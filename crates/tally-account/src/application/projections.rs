//! Read side of the bank account context.
//!
//! `AccountProjection` is the only writer of `AccountReadModelStore`; it is
//! registered with the event dispatcher and updates one record per account
//! as committed events arrive.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tally_core::error::{DomainError, ProjectionError};
use tally_core::event::{DomainEvent, EventMetadata, NO_VERSION};
use tally_core::projection::Projection;
use uuid::Uuid;

use crate::domain::events::{AccountEvent, AccountEventKind, AccountEventType};

const PROJECTION_NAME: &str = "account_read_model";

/// Query-optimized view of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountReadModel {
    /// The account identifier.
    pub account_id: Uuid,
    /// Name of the account holder.
    pub owner_name: String,
    /// Current balance.
    pub balance: Decimal,
    /// Whether the account has been closed.
    pub closed: bool,
    /// Version of the last event applied to this record.
    pub version: i64,
    /// Timestamp of the last event applied to this record.
    pub updated_at: Option<DateTime<Utc>>,
}

impl AccountReadModel {
    fn new(account_id: Uuid) -> Self {
        Self {
            account_id,
            owner_name: String::new(),
            balance: Decimal::ZERO,
            closed: false,
            version: NO_VERSION,
            updated_at: None,
        }
    }
}

impl fmt::Display for AccountReadModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Id={}, Owner={}, Balance={}, Closed={}",
            self.account_id, self.owner_name, self.balance, self.closed
        )
    }
}

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<Uuid, AccountReadModel>,
    // Creation order, for stable enumeration.
    order: Vec<Uuid>,
}

impl Records {
    fn entry(&mut self, account_id: Uuid) -> &mut AccountReadModel {
        if !self.by_id.contains_key(&account_id) {
            self.order.push(account_id);
        }
        self.by_id
            .entry(account_id)
            .or_insert_with(|| AccountReadModel::new(account_id))
    }
}

/// In-memory store of account read models.
#[derive(Debug, Default)]
pub struct AccountReadModelStore {
    records: RwLock<Records>,
}

impl AccountReadModelStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `account_id`, creating an empty one on first
    /// access.
    pub fn get_or_create(&self, account_id: Uuid) -> AccountReadModel {
        self.write().entry(account_id).clone()
    }

    /// Returns the record for `account_id`, if any event created it.
    #[must_use]
    pub fn find(&self, account_id: Uuid) -> Option<AccountReadModel> {
        self.read().by_id.get(&account_id).cloned()
    }

    /// Returns the record for `account_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if no record exists.
    pub fn get(&self, account_id: Uuid) -> Result<AccountReadModel, DomainError> {
        self.find(account_id)
            .ok_or(DomainError::AggregateNotFound(account_id))
    }

    /// Returns every record in creation order.
    #[must_use]
    pub fn all(&self) -> Vec<AccountReadModel> {
        let records = self.read();
        records
            .order
            .iter()
            .filter_map(|id| records.by_id.get(id).cloned())
            .collect()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().by_id.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update<F>(&self, account_id: Uuid, apply: F) -> Result<(), ProjectionError>
    where
        F: FnOnce(&mut AccountReadModel) -> Result<(), ProjectionError>,
    {
        let mut records = self.write();
        // Work on a copy so a rejected event neither changes nor creates a
        // record.
        let mut next = records
            .by_id
            .get(&account_id)
            .cloned()
            .unwrap_or_else(|| AccountReadModel::new(account_id));
        apply(&mut next)?;
        *records.entry(account_id) = next;
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Records> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Records> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps `AccountReadModelStore` in step with committed account events.
#[derive(Debug, Clone)]
pub struct AccountProjection {
    store: Arc<AccountReadModelStore>,
}

impl AccountProjection {
    /// Creates a projection writing into `store`.
    #[must_use]
    pub fn new(store: Arc<AccountReadModelStore>) -> Self {
        Self { store }
    }

    /// Applies a full, ordered event history. Used to rebuild a store from
    /// the event log.
    ///
    /// # Errors
    ///
    /// Returns the first `ProjectionError` raised; later events are not
    /// applied.
    pub fn replay(&self, history: &[AccountEvent]) -> Result<(), ProjectionError> {
        history.iter().try_for_each(|event| self.handle(event))
    }

    fn on_event<F>(&self, meta: &EventMetadata, apply: F) -> Result<(), ProjectionError>
    where
        F: FnOnce(&mut AccountReadModel) -> Result<(), ProjectionError>,
    {
        self.store.update(meta.aggregate_id, |model| {
            if meta.version != model.version + 1 {
                return Err(ProjectionError::new(
                    PROJECTION_NAME,
                    format!(
                        "account {} expected version {}, got {}",
                        meta.aggregate_id,
                        model.version + 1,
                        meta.version
                    ),
                ));
            }
            apply(model)?;
            model.version = meta.version;
            model.updated_at = Some(meta.occurred_at);
            Ok(())
        })
    }
}

impl Projection<AccountEvent> for AccountProjection {
    fn name(&self) -> &'static str {
        PROJECTION_NAME
    }

    fn interests(&self) -> &'static [AccountEventType] {
        &AccountEventType::ALL
    }

    fn handle(&self, event: &AccountEvent) -> Result<(), ProjectionError> {
        let meta = event.metadata();
        match &event.kind {
            AccountEventKind::AccountOpened(payload) => self.on_event(meta, |model| {
                model.owner_name.clone_from(&payload.owner_name);
                model.balance = payload.initial_balance;
                model.closed = false;
                Ok(())
            }),
            AccountEventKind::MoneyDeposited(payload) => self.on_event(meta, |model| {
                model.balance = model.balance.checked_add(payload.amount).ok_or_else(|| {
                    ProjectionError::new(
                        PROJECTION_NAME,
                        format!(
                            "deposit of {} overflows projected balance {} of account {}",
                            payload.amount, model.balance, model.account_id
                        ),
                    )
                })?;
                Ok(())
            }),
            AccountEventKind::MoneyWithdrawn(payload) => self.on_event(meta, |model| {
                if payload.amount > model.balance {
                    return Err(ProjectionError::new(
                        PROJECTION_NAME,
                        format!(
                            "withdrawal of {} exceeds projected balance {} of account {}",
                            payload.amount, model.balance, model.account_id
                        ),
                    ));
                }
                model.balance -= payload.amount;
                Ok(())
            }),
            AccountEventKind::AccountClosed(_) => self.on_event(meta, |model| {
                model.closed = true;
                Ok(())
            }),
        }
    }
}
