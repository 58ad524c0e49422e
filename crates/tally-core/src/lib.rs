//! Tally Core: event-sourcing abstractions.
//!
//! This crate defines the traits and types every bounded context builds on:
//! events, aggregates, the event store contract, the repository, and
//! projections. It contains no storage implementation.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod projection;
pub mod repository;
pub mod store;
