//! Client-side cart.
//!
//! The cart lives entirely in the session engine; the hub only learns
//! about it at checkout. Prices inside the cart are snapshots of the
//! product at the time it was added, and are re-fetched when the
//! authenticated identity changes so tier pricing applies.

use std::sync::{Arc, Mutex};

use hubcart_core::ProductId;
use tokio::task::JoinSet;
use tracing::warn;

use crate::hub::HubApi;
use crate::models::Product;

/// One cart line: a product snapshot plus a quantity.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

/// Derived totals over the current cart contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    /// Sum of all quantities.
    pub item_count: u64,
    /// Subtotal over priced items only, in minor units.
    pub subtotal_cents: i64,
    /// Currency of the first priced item, if any.
    pub currency: Option<String>,
    /// True when at least one item has no price; the subtotal is then a
    /// lower bound and is labeled accordingly.
    pub has_unpriced_items: bool,
}

#[derive(Default)]
pub struct CartStore {
    items: Mutex<Vec<CartItem>>,
}

impl CartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of a product. Adding a product already in the cart
    /// increments its quantity instead of creating a second line.
    pub fn add(&self, product: Product) {
        if let Ok(mut items) = self.items.lock() {
            if let Some(item) = items.iter_mut().find(|i| i.product.id == product.id) {
                item.quantity = item.quantity.saturating_add(1);
            } else {
                items.push(CartItem {
                    product,
                    quantity: 1,
                });
            }
        }
    }

    /// Set the quantity for a product. Zero or negative removes the line.
    pub fn set_quantity(&self, id: ProductId, quantity: i64) {
        if let Ok(mut items) = self.items.lock() {
            if quantity <= 0 {
                items.retain(|i| i.product.id != id);
            } else if let Some(item) = items.iter_mut().find(|i| i.product.id == id) {
                item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            }
        }
    }

    pub fn remove(&self, id: ProductId) {
        if let Ok(mut items) = self.items.lock() {
            items.retain(|i| i.product.id != id);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut items) = self.items.lock() {
            items.clear();
        }
    }

    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.items.lock().map(|i| i.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        let items = self.items();
        let mut subtotal: i64 = 0;
        let mut currency = None;
        let mut has_unpriced = false;
        for item in &items {
            match item.product.price_cents {
                Some(price) => {
                    subtotal += price * i64::from(item.quantity);
                    if currency.is_none() {
                        currency = Some(item.product.currency.clone());
                    }
                }
                None => has_unpriced = true,
            }
        }
        CartSummary {
            item_count: items.iter().map(|i| u64::from(i.quantity)).sum(),
            subtotal_cents: subtotal,
            currency,
            has_unpriced_items: has_unpriced,
        }
    }

    /// Re-fetch every cart product so prices reflect the current identity.
    ///
    /// Each line refreshes independently: one failed lookup keeps that
    /// line's old snapshot and never disturbs the others. Quantities are
    /// preserved across the refresh.
    pub async fn refresh_prices(&self, api: Arc<dyn HubApi>) {
        let ids: Vec<ProductId> = self
            .items()
            .iter()
            .map(|item| item.product.id)
            .collect();
        if ids.is_empty() {
            return;
        }

        let mut set = JoinSet::new();
        for id in ids {
            let api = Arc::clone(&api);
            set.spawn(async move { (id, api.fetch_product(id).await) });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((id, Ok(Some(fresh)))) => {
                    if let Ok(mut items) = self.items.lock() {
                        if let Some(item) = items.iter_mut().find(|i| i.product.id == id) {
                            item.product = fresh;
                        }
                    }
                }
                Ok((id, Ok(None))) => {
                    warn!(product_id = %id, "cart product no longer exists, keeping snapshot");
                }
                Ok((id, Err(e))) => {
                    warn!(product_id = %id, error = %e, "cart price refresh failed for item");
                }
                Err(e) => warn!(error = %e, "cart refresh task panicked"),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hub::testing::MockHub;

    fn product(id: i32, price: Option<i64>) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: None,
            name: format!("Товар {id}"),
            sku: None,
            description: String::new(),
            units: None,
            currency: "RUB".to_string(),
            price_cents: price,
            base_price_cents: None,
            tags: Vec::new(),
            image_urls: Vec::new(),
            amount: None,
        }
    }

    #[test]
    fn test_add_same_product_increments_quantity() {
        let cart = CartStore::new();
        cart.add(product(1, Some(100)));
        cart.add(product(1, Some(100)));
        cart.add(product(2, Some(50)));

        let items = cart.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(cart.summary().item_count, 3);
    }

    #[test]
    fn test_zero_quantity_removes_line() {
        let cart = CartStore::new();
        cart.add(product(1, Some(100)));
        cart.set_quantity(ProductId::new(1), 0);
        assert!(cart.items().is_empty());

        cart.add(product(2, Some(100)));
        cart.set_quantity(ProductId::new(2), -5);
        assert!(cart.items().is_empty());
    }

    #[test]
    fn test_summary_skips_unpriced_items() {
        let cart = CartStore::new();
        cart.add(product(1, Some(2500)));
        cart.set_quantity(ProductId::new(1), 3);
        cart.add(product(2, None));

        let summary = cart.summary();
        assert_eq!(summary.subtotal_cents, 7500);
        assert_eq!(summary.currency.as_deref(), Some("RUB"));
        assert!(summary.has_unpriced_items);
        assert_eq!(summary.item_count, 4);
    }

    #[tokio::test]
    async fn test_refresh_updates_prices_and_preserves_quantities() {
        let cart = CartStore::new();
        cart.add(product(1, Some(100)));
        cart.set_quantity(ProductId::new(1), 4);
        cart.add(product(2, Some(200)));

        let hub = Arc::new(MockHub::new());
        hub.set_products(vec![product(1, Some(80)), product(2, Some(150))]);

        cart.refresh_prices(hub).await;

        let items = cart.items();
        let first = items.iter().find(|i| i.product.id == ProductId::new(1)).unwrap();
        assert_eq!(first.product.price_cents, Some(80));
        assert_eq!(first.quantity, 4);
        let second = items.iter().find(|i| i.product.id == ProductId::new(2)).unwrap();
        assert_eq!(second.product.price_cents, Some(150));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_old_snapshot() {
        let cart = CartStore::new();
        cart.add(product(1, Some(100)));

        let hub = Arc::new(MockHub::new());
        hub.fail("product");

        cart.refresh_prices(hub).await;

        assert_eq!(cart.items()[0].product.price_cents, Some(100));
    }
}
