//! Tally demo: composition root.
//!
//! Wires the in-memory account context, runs the seeded scenario and renders
//! the resulting read models.

pub mod config;
pub mod error;
pub mod seed;
pub mod telemetry;

use tally_account::context::AccountContext;
use tally_core::store::EventStore;

use crate::error::AppError;

/// Renders every read model, one line per account, in the order the
/// accounts were opened.
#[must_use]
pub fn render_read_models(ctx: &AccountContext) -> Vec<String> {
    ctx.read_models
        .all()
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Renders every stored event as one JSON line, grouped by stream in the
/// order the streams were created.
///
/// # Errors
///
/// Returns `AppError::Domain` if a stream cannot be loaded, or
/// `AppError::Serialization` if an event cannot be encoded.
pub async fn render_events(ctx: &AccountContext) -> Result<Vec<String>, AppError> {
    let mut account_ids = ctx.event_store.stream_ids();
    // v7 ids sort by creation time.
    account_ids.sort_unstable();
    let mut lines = Vec::new();
    for account_id in account_ids {
        for event in ctx.event_store.load_events(account_id).await? {
            lines.push(serde_json::to_string(&event)?);
        }
    }
    Ok(lines)
}
