//! OTP login flow over real HTTP, including the per-identity repricing
//! that rides on the hub session cookie.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use hubcart_core::{Phone, ProductId};
use hubcart_integration_tests::StubHub;
use hubcart_storefront::hub::HubClient;
use hubcart_storefront::models::PersistedState;
use hubcart_storefront::nav::NavState;
use hubcart_storefront::session::{Engine, LoginOutcome};

fn engine_for(hub: &StubHub) -> Engine {
    let client = HubClient::new(&hub.config).unwrap();
    Engine::new(
        Arc::new(client),
        &PersistedState::default(),
        Duration::from_millis(20),
    )
}

fn phone() -> Phone {
    Phone::new("+79001234567").unwrap()
}

#[tokio::test]
async fn test_otp_login_reprices_cart() {
    let hub = StubHub::spawn().await;
    let engine = engine_for(&hub);

    engine.navigate("/", None, &NavState::default()).await;
    engine.add_to_cart(ProductId::new(1)).await;
    assert_eq!(engine.cart_summary().subtotal_cents, 100_000);

    assert!(engine.send_otp(&phone()).await);
    let outcome = engine.login(&phone(), "123456").await;
    let LoginOutcome::LoggedIn(user) = outcome else {
        panic!("expected login to succeed, got {outcome:?}");
    };
    assert_eq!(user.name, "Анна");

    // Same cart, authenticated price tier
    assert_eq!(engine.cart_summary().subtotal_cents, 80_000);
    assert_eq!(engine.cart_summary().item_count, 1);
}

#[tokio::test]
async fn test_wrong_code_is_rejected_and_changes_nothing() {
    let hub = StubHub::spawn().await;
    let engine = engine_for(&hub);

    assert!(engine.send_otp(&phone()).await);
    let outcome = engine.login(&phone(), "000000").await;
    assert!(matches!(outcome, LoginOutcome::Rejected));
    assert!(engine.user().is_none());
}

#[tokio::test]
async fn test_logout_reverts_to_anonymous_prices() {
    let hub = StubHub::spawn().await;
    let engine = engine_for(&hub);

    engine.navigate("/", None, &NavState::default()).await;
    engine.add_to_cart(ProductId::new(1)).await;

    let outcome = engine.login(&phone(), "123456").await;
    assert!(matches!(outcome, LoginOutcome::LoggedIn(_)));
    assert_eq!(engine.cart_summary().subtotal_cents, 80_000);

    engine.logout().await;

    assert!(engine.user().is_none());
    assert_eq!(engine.cart_summary().subtotal_cents, 100_000);
}
