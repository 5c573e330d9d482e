//! Per-browser-session engine and the registry that owns them.
//!
//! Each browser session gets one [`Engine`]: the hub client with that
//! session's cookie jar, the cart, the authenticated identity, and the
//! view synchronizers. It outlives individual requests, so in-flight work
//! (debounced search, session restore, cart price refresh) keeps running
//! between page loads. Engines are evicted after 30 minutes idle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use hubcart_core::{OrderId, Phone, ProductId, VendorId};
use moka::future::Cache;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::StorefrontConfig;
use crate::hub::{HubApi, HubClient, HubError, OrderItemPayload};
use crate::models::{PersistedState, Product, ProductLayout, User};
use crate::nav::{self, NavState, View};
use crate::notify::{Notifier, Severity, Toast};
use crate::stores::{CartItem, CartStore, CartSummary, RestoreOutcome, UserStore};
use crate::sync::{
    CatalogInputs, CatalogSnapshot, CatalogSynchronizer, OrderDraft, OrdersSnapshot,
    OrdersSynchronizer, ProductDetailSnapshot, ProductDetailSynchronizer, SaveOutcome,
};

/// How long an idle engine survives before eviction.
const ENGINE_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// Result of an OTP verification attempt, as seen by the login form.
#[derive(Debug)]
pub enum LoginOutcome {
    LoggedIn(User),
    /// The hub rejected the code. Not an error: the form re-renders with
    /// an inline message and existing state is untouched.
    Rejected,
    Failed(HubError),
}

/// Result of submitting the cart as an order.
#[derive(Debug, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Placed,
    EmptyCart,
    Rejected,
    Failed,
}

/// Vendor/amount filters applied to the product list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogFilters {
    pub vendor_id: Option<VendorId>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

#[derive(Debug, Clone, Default)]
struct Prefs {
    layout: ProductLayout,
    amount_preset_id: Option<String>,
}

#[derive(Default)]
struct SearchState {
    committed: Option<String>,
    pending: Option<JoinHandle<()>>,
}

/// One browser session's state and synchronization machinery.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    api: Arc<dyn HubApi>,
    notifier: Notifier,
    users: UserStore,
    cart: CartStore,
    catalog: CatalogSynchronizer,
    product_detail: ProductDetailSynchronizer,
    orders: OrdersSynchronizer,
    view: Mutex<View>,
    search: Mutex<SearchState>,
    filters: Mutex<CatalogFilters>,
    prefs: Mutex<Prefs>,
    debounce: Duration,
}

impl Engine {
    #[must_use]
    pub fn new(api: Arc<dyn HubApi>, persisted: &PersistedState, debounce: Duration) -> Self {
        let notifier = Notifier::new();
        Self {
            inner: Arc::new(EngineInner {
                api,
                users: UserStore::new(persisted.user.clone()),
                cart: CartStore::new(),
                catalog: CatalogSynchronizer::new(notifier.clone()),
                product_detail: ProductDetailSynchronizer::new(notifier.clone()),
                orders: OrdersSynchronizer::new(notifier.clone()),
                notifier,
                view: Mutex::new(View::Home),
                search: Mutex::new(SearchState::default()),
                filters: Mutex::new(CatalogFilters::default()),
                prefs: Mutex::new(Prefs {
                    layout: persisted.product_layout,
                    amount_preset_id: persisted.amount_preset_id.clone(),
                }),
                debounce,
            }),
        }
    }

    /// Kick off background session restore.
    ///
    /// The persisted user (if any) is already applied optimistically; this
    /// confirms it against the hub and, once confirmed, re-fetches cart
    /// prices under the restored identity.
    pub fn start(&self) {
        let engine = self.clone();
        tokio::spawn(async move {
            match engine.inner.users.restore(&*engine.inner.api).await {
                RestoreOutcome::Confirmed(user) => {
                    info!(user_id = %user.id, "session restored");
                    engine
                        .inner
                        .cart
                        .refresh_prices(Arc::clone(&engine.inner.api))
                        .await;
                }
                RestoreOutcome::SignedOut => info!("no upstream session to restore"),
                RestoreOutcome::Superseded => {}
                RestoreOutcome::Failed(e) => {
                    warn!(error = %e, "session restore failed, keeping cached identity");
                }
            }
        });
    }

    // -------------------------------------------------------------------------
    // Navigation and search
    // -------------------------------------------------------------------------

    /// Resolve a location, make it current, and synchronize all state
    /// slices for it.
    ///
    /// A search term arriving in the URL commits immediately; the debounce
    /// window only applies to typed input via [`Self::set_search_input`].
    pub async fn navigate(&self, path: &str, search: Option<&str>, nav_state: &NavState) -> View {
        let view = nav::resolve(path, nav_state);

        if let Ok(mut state) = self.inner.search.lock() {
            if let Some(pending) = state.pending.take() {
                pending.abort();
            }
            state.committed = normalize_search(search.unwrap_or_default());
        }
        if let Ok(mut current) = self.inner.view.lock() {
            current.clone_from(&view);
        }

        self.refresh_for_view(&view).await;
        view
    }

    /// Record typed search input; the catalog refreshes only after the
    /// input has been stable for the debounce window. Each keystroke
    /// cancels the previous timer.
    pub fn set_search_input(&self, input: &str) {
        let normalized = normalize_search(input);

        let Ok(mut state) = self.inner.search.lock() else {
            return;
        };
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        if state.committed == normalized {
            return;
        }

        let engine = self.clone();
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(engine.inner.debounce).await;
            engine.commit_search(normalized).await;
        }));
    }

    async fn commit_search(&self, value: Option<String>) {
        if let Ok(mut state) = self.inner.search.lock() {
            state.committed = value;
            state.pending = None;
        }
        let view = self.view();
        self.refresh_for_view(&view).await;
    }

    #[must_use]
    pub fn view(&self) -> View {
        self.inner
            .view
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn search(&self) -> Option<String> {
        self.inner
            .search
            .lock()
            .ok()
            .and_then(|s| s.committed.clone())
    }

    /// Synchronize every state slice for the given view. The slices are
    /// independent, so they reconcile concurrently.
    async fn refresh_for_view(&self, view: &View) {
        let filters = self.filters();
        let inputs = CatalogInputs {
            view: view.clone(),
            search: self.search(),
            vendor_id: filters.vendor_id,
            min_amount: filters.min_amount,
            max_amount: filters.max_amount,
        };
        let detail_id = match view {
            View::Product { id } => Some(*id),
            _ => None,
        };
        let user = self.inner.users.current();
        let orders_user = if matches!(view, View::Orders) {
            user.as_ref()
        } else {
            None
        };

        tokio::join!(
            self.inner.catalog.refresh(&*self.inner.api, &inputs),
            self.inner.product_detail.refresh(&*self.inner.api, detail_id),
            self.inner.orders.refresh(&*self.inner.api, orders_user),
        );
    }

    // -------------------------------------------------------------------------
    // Authentication
    // -------------------------------------------------------------------------

    /// Request an OTP challenge. A transport failure is reported to the
    /// user and swallowed; the form simply stays on the phone step.
    pub async fn send_otp(&self, phone: &Phone) -> bool {
        match self.inner.api.send_otp(phone).await {
            Ok(sent) => sent,
            Err(e) => {
                warn!(error = %e, "OTP send failed");
                self.inner
                    .notifier
                    .publish("Не удалось отправить код.", Severity::Error);
                false
            }
        }
    }

    /// Verify an OTP code. On success the identity commits and cart
    /// prices re-fetch under it; a rejected code changes nothing.
    #[instrument(skip_all)]
    pub async fn login(&self, phone: &Phone, otp: &str) -> LoginOutcome {
        match self.inner.api.verify_otp(phone, otp).await {
            Ok(verification) => match (verification.success, verification.user) {
                (true, Some(user)) => {
                    self.inner.users.login(user.clone());
                    info!(user_id = %user.id, "customer logged in");
                    self.inner
                        .cart
                        .refresh_prices(Arc::clone(&self.inner.api))
                        .await;
                    LoginOutcome::LoggedIn(user)
                }
                _ => LoginOutcome::Rejected,
            },
            Err(e) => {
                warn!(error = %e, "OTP verification failed");
                LoginOutcome::Failed(e)
            }
        }
    }

    /// Sign out: local identity clears immediately, the upstream session
    /// is invalidated best-effort, and cart prices fall back to the
    /// anonymous tier.
    pub async fn logout(&self) {
        self.inner.users.logout();
        if let Err(e) = self.inner.api.logout().await {
            warn!(error = %e, "upstream logout failed");
        }
        self.inner
            .cart
            .refresh_prices(Arc::clone(&self.inner.api))
            .await;
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.users.current()
    }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    /// Add one unit of a product to the cart.
    ///
    /// The product snapshot comes from whatever list already holds it;
    /// only a cold add (deep link straight to an unknown product) costs a
    /// hub round-trip.
    pub async fn add_to_cart(&self, id: ProductId) {
        if let Some(product) = self.find_product(id) {
            self.inner.cart.add(product);
            return;
        }

        match self.inner.api.fetch_product(id).await {
            Ok(Some(product)) => self.inner.cart.add(product),
            Ok(None) => {
                self.inner
                    .notifier
                    .publish("Товар не найден.", Severity::Error);
            }
            Err(e) => {
                warn!(error = %e, product_id = %id, "add to cart fetch failed");
                self.inner
                    .notifier
                    .publish("Не удалось добавить товар.", Severity::Error);
            }
        }
    }

    fn find_product(&self, id: ProductId) -> Option<Product> {
        let from_catalog = self
            .inner
            .catalog
            .snapshot()
            .products
            .into_iter()
            .find(|p| p.id == id);
        from_catalog.or_else(|| {
            self.inner
                .product_detail
                .snapshot()
                .product
                .filter(|p| p.id == id)
        })
    }

    pub fn set_cart_quantity(&self, id: ProductId, quantity: i64) {
        self.inner.cart.set_quantity(id, quantity);
    }

    pub fn remove_from_cart(&self, id: ProductId) {
        self.inner.cart.remove(id);
    }

    #[must_use]
    pub fn cart_items(&self) -> Vec<CartItem> {
        self.inner.cart.items()
    }

    #[must_use]
    pub fn cart_summary(&self) -> CartSummary {
        self.inner.cart.summary()
    }

    /// Submit the cart as an order.
    ///
    /// On success the cart empties and the user is told; a validation
    /// rejection surfaces the hub's reason verbatim as exactly one toast
    /// and leaves the cart intact for correction.
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> CheckoutOutcome {
        let items: Vec<OrderItemPayload> = self
            .inner
            .cart
            .items()
            .iter()
            .map(|item| OrderItemPayload {
                product_id: item.product.id,
                quantity: item.quantity,
            })
            .collect();
        if items.is_empty() {
            return CheckoutOutcome::EmptyCart;
        }

        match self.inner.api.create_order(&items).await {
            Ok(()) => {
                self.inner.cart.clear();
                self.inner
                    .notifier
                    .publish("Заказ оформлен.", Severity::Info);
                CheckoutOutcome::Placed
            }
            Err(HubError::Validation(message)) => {
                self.inner.notifier.publish(message, Severity::Error);
                CheckoutOutcome::Rejected
            }
            Err(e) => {
                warn!(error = %e, "order creation failed");
                self.inner
                    .notifier
                    .publish("Не удалось оформить заказ.", Severity::Error);
                CheckoutOutcome::Failed
            }
        }
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    pub async fn save_order_details(&self, id: OrderId, draft: &OrderDraft) -> SaveOutcome {
        self.inner
            .orders
            .save_details(&*self.inner.api, id, draft)
            .await
    }

    // -------------------------------------------------------------------------
    // Preferences and filters
    // -------------------------------------------------------------------------

    pub fn set_layout(&self, layout: ProductLayout) {
        if let Ok(mut prefs) = self.inner.prefs.lock() {
            prefs.layout = layout;
        }
    }

    pub fn set_amount_preset(&self, preset_id: Option<String>) {
        if let Ok(mut prefs) = self.inner.prefs.lock() {
            prefs.amount_preset_id = preset_id;
        }
    }

    #[must_use]
    pub fn layout(&self) -> ProductLayout {
        self.inner
            .prefs
            .lock()
            .map(|p| p.layout)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn amount_preset(&self) -> Option<String> {
        self.inner
            .prefs
            .lock()
            .ok()
            .and_then(|p| p.amount_preset_id.clone())
    }

    /// Apply vendor/amount filters and re-synchronize the catalog.
    pub async fn set_filters(&self, filters: CatalogFilters) {
        if let Ok(mut current) = self.inner.filters.lock() {
            if *current == filters {
                return;
            }
            *current = filters;
        }
        let view = self.view();
        self.refresh_for_view(&view).await;
    }

    #[must_use]
    pub fn filters(&self) -> CatalogFilters {
        self.inner
            .filters
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Snapshots for rendering
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn catalog(&self) -> CatalogSnapshot {
        self.inner.catalog.snapshot()
    }

    #[must_use]
    pub fn product_detail(&self) -> ProductDetailSnapshot {
        self.inner.product_detail.snapshot()
    }

    #[must_use]
    pub fn orders(&self) -> OrdersSnapshot {
        self.inner.orders.snapshot()
    }

    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        self.inner.notifier.active()
    }

    pub fn dismiss_toast(&self, id: crate::notify::ToastId) {
        self.inner.notifier.dismiss(id);
    }

    /// The state slice mirrored into the session record after each
    /// mutating request.
    #[must_use]
    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            user: self.user(),
            product_layout: self.layout(),
            amount_preset_id: self.amount_preset(),
        }
    }
}

fn normalize_search(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Owns one [`Engine`] per browser session, keyed by the session id.
///
/// Engines build lazily on first touch and expire after
/// [`ENGINE_IDLE_TTL`] idle, taking their hub cookie jar with them.
#[derive(Clone)]
pub struct EngineRegistry {
    engines: Cache<Uuid, Engine>,
    config: Arc<StorefrontConfig>,
}

impl EngineRegistry {
    #[must_use]
    pub fn new(config: Arc<StorefrontConfig>) -> Self {
        Self {
            engines: Cache::builder().time_to_idle(ENGINE_IDLE_TTL).build(),
            config,
        }
    }

    /// Get or build the engine for a session. A fresh engine immediately
    /// starts background session restore from the persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the hub HTTP client cannot be constructed.
    pub async fn engine_for(
        &self,
        session_id: Uuid,
        persisted: &PersistedState,
    ) -> Result<Engine, Arc<reqwest::Error>> {
        self.engines
            .try_get_with(session_id, async {
                let client = HubClient::new(&self.config.hub)?;
                let engine = Engine::new(
                    Arc::new(client),
                    persisted,
                    self.config.search_debounce,
                );
                engine.start();
                Ok(engine)
            })
            .await
    }
}
