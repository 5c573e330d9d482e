//! Order history synchronizer, including optimistic detail edits.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use hubcart_core::OrderId;
use tracing::{instrument, warn};

use crate::hub::{HubApi, HubError, OrderDetailsUpdate};
use crate::models::{Order, User};
use crate::notify::{Notifier, Severity};

use super::RefreshOutcome;

/// Form values for an order's delivery metadata.
///
/// Fields arrive as raw form strings; whitespace-only input clears the
/// stored value rather than saving blanks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderDraft {
    pub shipping_address: String,
    pub consignee: String,
    pub delivery_notes: String,
    pub payer: String,
}

impl OrderDraft {
    fn normalize(value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    #[must_use]
    pub fn to_update(&self) -> OrderDetailsUpdate {
        OrderDetailsUpdate {
            shipping_address: Self::normalize(&self.shipping_address),
            consignee: Self::normalize(&self.consignee),
            delivery_notes: Self::normalize(&self.delivery_notes),
            payer: Self::normalize(&self.payer),
        }
    }
}

/// Result of a detail save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The hub rejected the save; local state was rolled back to the
    /// pre-edit snapshot and the user was told why.
    RolledBack,
    /// The order is not in local state; nothing was sent.
    UnknownOrder,
}

#[derive(Debug, Clone, Default)]
pub struct OrdersSnapshot {
    pub orders: Vec<Order>,
    pub is_loading: bool,
}

pub struct OrdersSynchronizer {
    seq: AtomicU64,
    state: Mutex<OrdersSnapshot>,
    notifier: Notifier,
}

impl OrdersSynchronizer {
    #[must_use]
    pub fn new(notifier: Notifier) -> Self {
        Self {
            seq: AtomicU64::new(0),
            state: Mutex::new(OrdersSnapshot::default()),
            notifier,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> OrdersSnapshot {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Load the order history for the authenticated user, newest first.
    ///
    /// With no user there is nothing to ask the hub for: the list commits
    /// empty without a request.
    #[instrument(skip_all, fields(authenticated = user.is_some()))]
    pub async fn refresh(&self, api: &dyn HubApi, user: Option<&User>) -> RefreshOutcome {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;

        if user.is_none() {
            return self.commit(seq, |state| {
                state.orders.clear();
                state.is_loading = false;
            });
        }

        if self.commit(seq, |state| state.is_loading = true) == RefreshOutcome::Superseded {
            return RefreshOutcome::Superseded;
        }

        match api.fetch_orders().await {
            Ok(mut orders) => {
                orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                self.commit(seq, |state| {
                    state.orders = orders;
                    state.is_loading = false;
                })
            }
            Err(e) => {
                warn!(error = %e, "order history fetch failed");
                let outcome = self.commit(seq, |state| {
                    state.orders.clear();
                    state.is_loading = false;
                });
                if outcome == RefreshOutcome::Committed {
                    self.notifier
                        .publish("Не удалось загрузить заказы.", Severity::Error);
                }
                outcome
            }
        }
    }

    /// Save edited delivery metadata for one order.
    ///
    /// The edit applies to local state immediately; if the hub rejects it
    /// the pre-edit snapshot is restored and the hub's reason (for a
    /// validation failure, verbatim) is shown. On success the hub's
    /// returned order replaces the optimistic one, then the whole list is
    /// re-fetched best-effort to reconcile anything the save changed
    /// server-side.
    #[instrument(skip(self, api, draft), fields(order_id = %id))]
    pub async fn save_details(
        &self,
        api: &dyn HubApi,
        id: OrderId,
        draft: &OrderDraft,
    ) -> SaveOutcome {
        let update = draft.to_update();

        let Some(previous) = self.apply_optimistic(id, &update) else {
            return SaveOutcome::UnknownOrder;
        };

        match api.update_order_details(id, &update).await {
            Ok(saved) => {
                self.replace(id, saved);
                self.notifier
                    .publish("Данные заказа обновлены.", Severity::Info);
                self.reconcile(api).await;
                SaveOutcome::Saved
            }
            Err(e) => {
                self.replace(id, previous);
                let message = match e {
                    HubError::Validation(message) => message,
                    other => {
                        warn!(error = %other, "order detail save failed");
                        "Не удалось обновить данные заказа.".to_string()
                    }
                };
                self.notifier.publish(message, Severity::Error);
                SaveOutcome::RolledBack
            }
        }
    }

    /// Apply the update in place, returning the pre-edit order for rollback.
    fn apply_optimistic(&self, id: OrderId, update: &OrderDetailsUpdate) -> Option<Order> {
        let mut state = self.state.lock().ok()?;
        let order = state.orders.iter_mut().find(|o| o.id == id)?;
        let previous = order.clone();
        order.shipping_address.clone_from(&update.shipping_address);
        order.consignee.clone_from(&update.consignee);
        order.delivery_notes.clone_from(&update.delivery_notes);
        order.payer.clone_from(&update.payer);
        Some(previous)
    }

    fn replace(&self, id: OrderId, order: Order) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(slot) = state.orders.iter_mut().find(|o| o.id == id) {
                *slot = order;
            }
        }
    }

    async fn reconcile(&self, api: &dyn HubApi) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        match api.fetch_orders().await {
            Ok(mut orders) => {
                orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                self.commit(seq, |state| state.orders = orders);
            }
            // The save already succeeded; a failed reconcile only means
            // the list may be momentarily stale.
            Err(e) => warn!(error = %e, "post-save order refetch failed"),
        }
    }

    fn commit(&self, seq: u64, apply: impl FnOnce(&mut OrdersSnapshot)) -> RefreshOutcome {
        let Ok(mut state) = self.state.lock() else {
            return RefreshOutcome::Superseded;
        };
        if self.seq.load(Ordering::SeqCst) != seq {
            return RefreshOutcome::Superseded;
        }
        apply(&mut state);
        RefreshOutcome::Committed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hub::testing::MockHub;
    use chrono::{TimeZone, Utc};
    use hubcart_core::{HubId, OrderStatus, UserId};

    fn order(id: i32, day: u32) -> Order {
        Order {
            id: OrderId::new(id),
            status: OrderStatus::new("processing"),
            currency: "RUB".to_string(),
            total_cents: Some(10_000),
            created_at: Utc.with_ymd_and_hms(2026, 5, day, 12, 0, 0).unwrap(),
            items: Vec::new(),
            shipping_address: Some("Москва".to_string()),
            consignee: None,
            delivery_notes: None,
            payer: None,
        }
    }

    fn user() -> User {
        User {
            id: UserId::new(1),
            hub_id: HubId::new(1),
            name: "Тест".to_string(),
            email: None,
            phone: "+79001234567".to_string(),
        }
    }

    #[tokio::test]
    async fn test_no_user_commits_empty_without_request() {
        let hub = MockHub::new();
        hub.set_orders(vec![order(1, 1)]);

        let sync = OrdersSynchronizer::new(Notifier::new());
        sync.refresh(&hub, None).await;

        assert!(sync.snapshot().orders.is_empty());
        assert_eq!(hub.orders_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_orders_sorted_newest_first() {
        let hub = MockHub::new();
        hub.set_orders(vec![order(1, 3), order(2, 20), order(3, 10)]);

        let sync = OrdersSynchronizer::new(Notifier::new());
        sync.refresh(&hub, Some(&user())).await;

        let ids: Vec<i32> = sync
            .snapshot()
            .orders
            .iter()
            .map(|o| o.id.as_i32())
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_save_success_replaces_and_reconciles() {
        let hub = MockHub::new();
        hub.set_orders(vec![order(1, 1)]);

        let mut saved = order(1, 1);
        saved.shipping_address = Some("Казань".to_string());
        hub.set_updated_order(saved.clone());
        // Reconcile fetch returns the saved version too.
        hub.set_orders(vec![saved]);

        let notifier = Notifier::new();
        let sync = OrdersSynchronizer::new(notifier.clone());
        sync.refresh(&hub, Some(&user())).await;

        let draft = OrderDraft {
            shipping_address: "  Казань  ".to_string(),
            ..OrderDraft::default()
        };
        let outcome = sync.save_details(&hub, OrderId::new(1), &draft).await;

        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(
            sync.snapshot().orders[0].shipping_address.as_deref(),
            Some("Казань")
        );
        let sent = hub.last_details().unwrap();
        assert_eq!(sent.1.shipping_address.as_deref(), Some("Казань"));
        assert_eq!(sent.1.consignee, None);
        assert!(
            notifier
                .active()
                .iter()
                .any(|t| t.message == "Данные заказа обновлены.")
        );
    }

    #[tokio::test]
    async fn test_save_failure_rolls_back() {
        let hub = MockHub::new();
        hub.set_orders(vec![order(1, 1)]);
        hub.fail("update_order");

        let notifier = Notifier::new();
        let sync = OrdersSynchronizer::new(notifier.clone());
        sync.refresh(&hub, Some(&user())).await;

        let draft = OrderDraft {
            shipping_address: "Казань".to_string(),
            ..OrderDraft::default()
        };
        let outcome = sync.save_details(&hub, OrderId::new(1), &draft).await;

        assert_eq!(outcome, SaveOutcome::RolledBack);
        assert_eq!(
            sync.snapshot().orders[0].shipping_address.as_deref(),
            Some("Москва")
        );
        assert!(
            notifier
                .active()
                .iter()
                .any(|t| t.message == "Не удалось обновить данные заказа.")
        );
    }

    #[tokio::test]
    async fn test_validation_rejection_shows_server_message() {
        let hub = MockHub::new();
        hub.set_orders(vec![order(1, 1)]);
        hub.reject_orders_with("Грузополучатель обязателен");

        let notifier = Notifier::new();
        let sync = OrdersSynchronizer::new(notifier.clone());
        sync.refresh(&hub, Some(&user())).await;

        let outcome = sync
            .save_details(&hub, OrderId::new(1), &OrderDraft::default())
            .await;

        assert_eq!(outcome, SaveOutcome::RolledBack);
        assert!(
            notifier
                .active()
                .iter()
                .any(|t| t.message == "Грузополучатель обязателен")
        );
    }

    #[tokio::test]
    async fn test_unknown_order_sends_nothing() {
        let hub = MockHub::new();
        let sync = OrdersSynchronizer::new(Notifier::new());

        let outcome = sync
            .save_details(&hub, OrderId::new(404), &OrderDraft::default())
            .await;

        assert_eq!(outcome, SaveOutcome::UnknownOrder);
        assert!(hub.last_details().is_none());
    }
}
