//! Runs the demo scenario against a deterministic context.

use std::sync::Arc;

use rust_decimal::Decimal;
use tally_account::context::AccountContext;
use tally_demo::seed::seed_accounts;
use tally_demo::{render_events, render_read_models};
use tally_test_support::FixedClock;

fn context() -> AccountContext {
    AccountContext::in_memory(Arc::new(FixedClock::default()))
}

#[tokio::test]
async fn test_seed_produces_expected_read_models() {
    // Arrange
    let ctx = context();

    // Act
    let seeded = seed_accounts(&ctx.commands).await.unwrap();

    // Assert
    let alice = ctx.read_models.get(seeded.alice).unwrap();
    assert_eq!(alice.owner_name, "Alice");
    assert_eq!(alice.balance, Decimal::from(1200));
    assert!(!alice.closed);
    assert_eq!(alice.version, 2);

    let bob = ctx.read_models.get(seeded.bob).unwrap();
    assert_eq!(bob.balance, Decimal::from(200));
    assert!(bob.closed);
    assert_eq!(bob.version, 2);
}

#[tokio::test]
async fn test_read_models_render_in_open_order() {
    let ctx = context();
    let seeded = seed_accounts(&ctx.commands).await.unwrap();

    let lines = render_read_models(&ctx);

    assert_eq!(
        lines,
        vec![
            format!("Id={}, Owner=Alice, Balance=1200, Closed=false", seeded.alice),
            format!("Id={}, Owner=Bob, Balance=200, Closed=true", seeded.bob),
        ]
    );
}

#[tokio::test]
async fn test_events_render_as_json_lines() {
    let ctx = context();
    let seeded = seed_accounts(&ctx.commands).await.unwrap();

    let lines = render_events(&ctx).await.unwrap();

    assert_eq!(lines.len(), 6);
    let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(first["metadata"]["aggregate_id"], seeded.alice.to_string());
    assert_eq!(first["metadata"]["version"], 0);
    assert!(first["kind"]["AccountOpened"].is_object());
}
