//! Checkout and order editing over real HTTP, including the optimistic
//! edit rollback on hub rejection.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use hubcart_core::{OrderId, Phone, ProductId};
use hubcart_integration_tests::StubHub;
use hubcart_storefront::hub::HubClient;
use hubcart_storefront::models::PersistedState;
use hubcart_storefront::nav::NavState;
use hubcart_storefront::session::{CheckoutOutcome, Engine, LoginOutcome};
use hubcart_storefront::sync::{OrderDraft, SaveOutcome};

fn engine_for(hub: &StubHub) -> Engine {
    let client = HubClient::new(&hub.config).unwrap();
    Engine::new(
        Arc::new(client),
        &PersistedState::default(),
        Duration::from_millis(20),
    )
}

/// Log in and put one unit of product 1 in the cart.
async fn signed_in_with_cart(hub: &StubHub) -> Engine {
    let engine = engine_for(hub);
    engine.navigate("/", None, &NavState::default()).await;
    engine.add_to_cart(ProductId::new(1)).await;

    let phone = Phone::new("+79001234567").unwrap();
    let outcome = engine.login(&phone, "123456").await;
    assert!(matches!(outcome, LoginOutcome::LoggedIn(_)));
    engine
}

#[tokio::test]
async fn test_checkout_places_order_and_clears_cart() {
    let hub = StubHub::spawn().await;
    let engine = signed_in_with_cart(&hub).await;

    assert_eq!(engine.checkout().await, CheckoutOutcome::Placed);

    assert_eq!(hub.orders().len(), 1);
    assert_eq!(engine.cart_summary().item_count, 0);

    engine.navigate("/orders", None, &NavState::default()).await;
    let snapshot = engine.orders();
    assert_eq!(snapshot.orders.len(), 1);
    assert_eq!(snapshot.orders[0].items.len(), 1);
    assert_eq!(snapshot.orders[0].items[0].quantity, 1);
}

#[tokio::test]
async fn test_rejected_checkout_keeps_cart_and_surfaces_message() {
    let hub = StubHub::spawn().await;
    let engine = signed_in_with_cart(&hub).await;

    hub.reject_orders_with("Минимальная сумма заказа 5000 ₽");

    assert_eq!(engine.checkout().await, CheckoutOutcome::Rejected);

    assert_eq!(engine.cart_summary().item_count, 1);
    assert!(hub.orders().is_empty());
    assert!(
        engine
            .toasts()
            .iter()
            .any(|t| t.message == "Минимальная сумма заказа 5000 ₽")
    );
}

#[tokio::test]
async fn test_order_details_edit_saves() {
    let hub = StubHub::spawn().await;
    let engine = signed_in_with_cart(&hub).await;
    assert_eq!(engine.checkout().await, CheckoutOutcome::Placed);
    engine.navigate("/orders", None, &NavState::default()).await;

    let draft = OrderDraft {
        shipping_address: "Москва, ул. Ленина 1".to_string(),
        consignee: "ООО Ромашка".to_string(),
        delivery_notes: String::new(),
        payer: String::new(),
    };
    let outcome = engine.save_order_details(OrderId::new(1), &draft).await;
    assert_eq!(outcome, SaveOutcome::Saved);

    let snapshot = engine.orders();
    assert_eq!(
        snapshot.orders[0].shipping_address.as_deref(),
        Some("Москва, ул. Ленина 1")
    );
    assert_eq!(snapshot.orders[0].consignee.as_deref(), Some("ООО Ромашка"));
    assert_eq!(snapshot.orders[0].delivery_notes, None);
}

#[tokio::test]
async fn test_rejected_edit_rolls_back() {
    let hub = StubHub::spawn().await;
    let engine = signed_in_with_cart(&hub).await;
    assert_eq!(engine.checkout().await, CheckoutOutcome::Placed);
    engine.navigate("/orders", None, &NavState::default()).await;

    hub.reject_orders_with("Заказ уже передан в доставку");

    let draft = OrderDraft {
        shipping_address: "Новый адрес".to_string(),
        ..OrderDraft::default()
    };
    let outcome = engine.save_order_details(OrderId::new(1), &draft).await;
    assert_eq!(outcome, SaveOutcome::RolledBack);

    let snapshot = engine.orders();
    assert_eq!(snapshot.orders[0].shipping_address, None);
    assert!(
        engine
            .toasts()
            .iter()
            .any(|t| t.message == "Заказ уже передан в доставку")
    );
}
