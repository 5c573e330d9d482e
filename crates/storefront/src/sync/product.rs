//! Product detail synchronizer.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use hubcart_core::ProductId;
use tracing::{instrument, warn};

use crate::hub::HubApi;
use crate::models::{Category, Product};
use crate::notify::{Notifier, Severity};

use super::RefreshOutcome;

/// Detail-page state: the product plus the full category list used to
/// render its breadcrumb.
#[derive(Debug, Clone, Default)]
pub struct ProductDetailSnapshot {
    pub product: Option<Product>,
    pub categories: Vec<Category>,
    pub is_loading: bool,
}

pub struct ProductDetailSynchronizer {
    seq: AtomicU64,
    state: Mutex<ProductDetailSnapshot>,
    notifier: Notifier,
}

impl ProductDetailSynchronizer {
    #[must_use]
    pub fn new(notifier: Notifier) -> Self {
        Self {
            seq: AtomicU64::new(0),
            state: Mutex::new(ProductDetailSnapshot::default()),
            notifier,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> ProductDetailSnapshot {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Load the detail page for `id`, or clear it when leaving the page.
    ///
    /// A missing product (hub 404) commits as `product: None` without a
    /// toast; the page renders a not-found message. A transport failure
    /// commits the same empty state but also notifies.
    #[instrument(skip(self, api))]
    pub async fn refresh(&self, api: &dyn HubApi, id: Option<ProductId>) -> RefreshOutcome {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(id) = id else {
            return self.commit(seq, |state| {
                state.product = None;
                state.is_loading = false;
            });
        };

        if self.commit(seq, |state| state.is_loading = true) == RefreshOutcome::Superseded {
            return RefreshOutcome::Superseded;
        }

        let (product, categories) = tokio::join!(api.fetch_product(id), api.fetch_categories(None));

        // Breadcrumb categories are decoration; a failure there never
        // blocks the product itself.
        let categories = categories.unwrap_or_else(|e| {
            warn!(error = %e, "breadcrumb category fetch failed");
            Vec::new()
        });

        match product {
            Ok(product) => self.commit(seq, |state| {
                state.product = product;
                state.categories = categories;
                state.is_loading = false;
            }),
            Err(e) => {
                warn!(error = %e, "product detail fetch failed");
                let outcome = self.commit(seq, |state| {
                    state.product = None;
                    state.categories = categories;
                    state.is_loading = false;
                });
                if outcome == RefreshOutcome::Committed {
                    self.notifier
                        .publish("Не удалось загрузить товар.", Severity::Error);
                }
                outcome
            }
        }
    }

    fn commit(&self, seq: u64, apply: impl FnOnce(&mut ProductDetailSnapshot)) -> RefreshOutcome {
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
