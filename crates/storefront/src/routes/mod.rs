//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home: root categories + full product list
//! GET  /health                 - Health check
//!
//! # Catalog
//! GET  /categories/{id}        - Products in a category (+ subcategories)
//! GET  /tags/{id}              - Products carrying a tag
//! GET  /products/{id}          - Product detail
//! POST /search                 - Debounced live-search input
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add one unit of a product
//! POST /cart/update            - Set line quantity (0 removes)
//! POST /cart/remove            - Remove a line
//! POST /cart/checkout          - Submit cart as an order
//!
//! # Orders (authenticated)
//! GET  /orders                 - Order history, newest first
//! POST /orders/{id}/details    - Save delivery metadata
//!
//! # Auth (rate limited)
//! GET  /auth/login             - Phone / code form
//! POST /auth/otp               - Request an OTP challenge
//! POST /auth/verify            - Verify the code
//! POST /auth/logout            - Sign out
//!
//! # Preferences
//! POST /prefs/layout           - Grid/list toggle
//! POST /prefs/filters          - Vendor + amount filters
//! POST /toasts/{id}/dismiss    - Dismiss a toast early
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod prefs;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware;
use crate::notify::Toast;
use crate::session::Engine;
use crate::state::AppState;

use hubcart_core::format_minor_units;

/// Shown where a product has no price for the current identity.
pub const PRICE_ON_REQUEST: &str = "Цена по запросу";

/// Format a minor-unit amount for display, falling back to the
/// price-on-request label.
#[must_use]
pub fn price_label(cents: Option<i64>, currency: &str) -> String {
    format_minor_units(cents, currency, PRICE_ON_REQUEST)
}

/// Redirect back to where the form came from.
///
/// Only same-site paths are honored; anything else falls back, so a
/// tampered `return_to` can never leave the storefront.
#[must_use]
pub fn redirect_back(return_to: Option<&str>, fallback: &str) -> axum::response::Redirect {
    let target = return_to
        .filter(|t| t.starts_with('/') && !t.starts_with("//"))
        .unwrap_or(fallback);
    axum::response::Redirect::to(target)
}

/// Toast display data for templates.
#[derive(Clone)]
pub struct ToastView {
    pub id: String,
    pub message: String,
    pub severity: &'static str,
}

impl From<&Toast> for ToastView {
    fn from(toast: &Toast) -> Self {
        Self {
            id: toast.id.to_string(),
            message: toast.message.clone(),
            severity: toast.severity.as_str(),
        }
    }
}

/// Header/footer data every page needs.
#[derive(Clone)]
pub struct PageContext {
    pub user_name: Option<String>,
    pub cart_count: u64,
    pub search: String,
    pub toasts: Vec<ToastView>,
}

impl PageContext {
    #[must_use]
    pub fn from_engine(engine: &Engine) -> Self {
        Self {
            user_name: engine.user().map(|u| u.name),
            cart_count: engine.cart_summary().item_count,
            search: engine.search().unwrap_or_default(),
            toasts: engine.toasts().iter().map(ToastView::from).collect(),
        }
    }
}

/// Create the auth routes router (rate limited).
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page))
        .route("/otp", post(auth::send_otp))
        .route("/verify", post(auth::verify))
        .route("/logout", post(auth::logout))
        .layer(middleware::auth_rate_limiter())
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/checkout", post(cart::checkout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::home))
        .route("/categories/{id}", get(catalog::category))
        .route("/tags/{id}", get(catalog::tag))
        .route("/products/{id}", get(products::show))
        .route("/search", post(catalog::live_search))
        .nest("/cart", cart_routes())
        .route("/orders", get(orders::index))
        .route("/orders/{id}/details", post(orders::save_details))
        .nest("/auth", auth_routes())
        .route("/prefs/layout", post(prefs::set_layout))
        .route("/prefs/filters", post(prefs::set_filters))
        .route("/toasts/{id}/dismiss", post(prefs::dismiss_toast))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::header;
    use axum::response::IntoResponse;

    use super::*;

    fn location(redirect: axum::response::Redirect) -> String {
        redirect
            .into_response()
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_price_label_falls_back_when_absent() {
        assert_eq!(price_label(None, "RUB"), PRICE_ON_REQUEST);
    }

    #[test]
    fn test_redirect_back_honors_same_site_paths() {
        assert_eq!(location(redirect_back(Some("/cart"), "/")), "/cart");
    }

    #[test]
    fn test_redirect_back_rejects_external_targets() {
        assert_eq!(
            location(redirect_back(Some("https://evil.example"), "/")),
            "/"
        );
        assert_eq!(location(redirect_back(Some("//evil.example"), "/")), "/");
        assert_eq!(location(redirect_back(None, "/cart")), "/cart");
    }
}
