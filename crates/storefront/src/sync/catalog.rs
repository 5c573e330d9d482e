//! Catalog synchronizer: categories, tags, vendors and the product list.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{instrument, warn};

use crate::hub::{HubApi, ProductFilter};
use crate::models::{Category, Product, Tag, Vendor};
use crate::nav::View;
use crate::notify::{Notifier, Severity};

use super::RefreshOutcome;

/// Everything that determines what the catalog should show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogInputs {
    pub view: View,
    pub search: Option<String>,
    pub vendor_id: Option<hubcart_core::VendorId>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

/// Point-in-time copy of the catalog state for rendering.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub vendors: Vec<Vendor>,
    pub products: Vec<Product>,
    pub is_loading: bool,
}

pub struct CatalogSynchronizer {
    seq: AtomicU64,
    state: Mutex<CatalogSnapshot>,
    notifier: Notifier,
}

impl CatalogSynchronizer {
    #[must_use]
    pub fn new(notifier: Notifier) -> Self {
        Self {
            seq: AtomicU64::new(0),
            // Starts loading so the first render shows a placeholder
            // instead of an empty catalog.
            state: Mutex::new(CatalogSnapshot {
                is_loading: true,
                ..CatalogSnapshot::default()
            }),
            notifier,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Reconcile catalog state against the hub for the given inputs.
    ///
    /// Metadata (categories, tags, vendors) commits as soon as it arrives
    /// so the sidebar fills in before the slower product list. Each commit
    /// re-checks the sequence; a refresh that lost the race leaves state
    /// untouched.
    #[instrument(skip_all, fields(view = ?inputs.view))]
    pub async fn refresh(&self, api: &dyn HubApi, inputs: &CatalogInputs) -> RefreshOutcome {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;

        // Detail and orders pages render no catalog; clear without fetching.
        if matches!(inputs.view, View::Product { .. } | View::Orders) {
            return self.commit(seq, |state| {
                state.categories.clear();
                state.tags.clear();
                state.vendors.clear();
                state.products.clear();
                state.is_loading = false;
            });
        }

        if self.commit(seq, |state| state.is_loading = true) == RefreshOutcome::Superseded {
            return RefreshOutcome::Superseded;
        }

        let parent = match inputs.view {
            View::Category { id, .. } => Some(id),
            _ => None,
        };

        let metadata = tokio::try_join!(
            api.fetch_categories(parent),
            api.fetch_tags(),
            api.fetch_vendors()
        );
        let (categories, tags, vendors) = match metadata {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(error = %e, "catalog metadata fetch failed");
                return self.fail(seq, "Не удалось загрузить данные каталога.");
            }
        };
        let committed = self.commit(seq, |state| {
            state.categories = categories;
            state.tags = tags;
            state.vendors = vendors;
        });
        if committed == RefreshOutcome::Superseded {
            return RefreshOutcome::Superseded;
        }

        let filter = ProductFilter {
            category_id: match inputs.view {
                View::Category { id, .. } => Some(id),
                _ => None,
            },
            tag_id: match inputs.view {
                View::Tag { id, .. } => Some(id),
                _ => None,
            },
            search: inputs.search.clone(),
            vendor_id: inputs.vendor_id,
            min_amount: inputs.min_amount,
            max_amount: inputs.max_amount,
        };
        match api.fetch_products(&filter).await {
            Ok(products) => self.commit(seq, |state| {
                state.products = products;
                state.is_loading = false;
            }),
            Err(e) => {
                warn!(error = %e, "product list fetch failed");
                self.fail(seq, "Не удалось загрузить товары.")
            }
        }
    }

    fn commit(&self, seq: u64, apply: impl FnOnce(&mut CatalogSnapshot)) -> RefreshOutcome {
        let Ok(mut state) = self.state.lock() else {
            return RefreshOutcome::Superseded;
        };
        if self.seq.load(Ordering::SeqCst) != seq {
            return RefreshOutcome::Superseded;
        }
        apply(&mut state);
        RefreshOutcome::Committed
    }

    /// Degrade to an empty catalog and tell the user, but only if this
    /// refresh is still the latest; a superseded failure stays silent.
    fn fail(&self, seq: u64, message: &str) -> RefreshOutcome {
        let outcome = self.commit(seq, |state| {
            state.products.clear();
            state.is_loading = false;
        });
        if outcome == RefreshOutcome::Committed {
            self.notifier.publish(message, Severity::Error);
        }
        outcome
    }
}
