//! Tally: bank account bounded context.
//!
//! Write side: the `BankAccount` aggregate and `AccountCommandService`.
//! Read side: `AccountProjection` keeping an `AccountReadModelStore` current
//! from dispatched events, and query handlers that only read that store.

pub mod application;
pub mod context;
pub mod domain;
