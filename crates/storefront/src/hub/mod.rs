//! Hub API client.
//!
//! # Architecture
//!
//! - The hub is the source of truth - NO local sync, direct REST calls
//! - One client per browser session: the reqwest cookie jar carries the
//!   upstream hub session cookie obtained by OTP verification, so product
//!   prices reflect the authenticated identity's price tier
//! - Identity-independent metadata (tags) is cached in-memory via `moka`
//!   with a short TTL
//!
//! # Error normalization
//!
//! The client resolves expected conditions into values instead of errors:
//! 404 on a product lookup is `Ok(None)`, 401 on the session check is
//! `Ok(None)`, and a 422 on order mutations becomes
//! [`HubError::Validation`] carrying the server's message verbatim.

pub mod client;
#[cfg(test)]
pub mod testing;
pub mod types;

pub use client::HubClient;
pub use types::{OrderDetailsUpdate, OrderItemPayload, ProductFilter};

use async_trait::async_trait;
use thiserror::Error;

use hubcart_core::{CategoryId, OrderId, Phone, ProductId};

use crate::models::{Category, Order, Product, Tag, User, Vendor};

/// Errors that can occur when talking to the hub API.
#[derive(Debug, Error)]
pub enum HubError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected non-2xx status without a structured body.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Domain validation failure (422); the message is the server's,
    /// verbatim, and is shown to the user as-is.
    #[error("{0}")]
    Validation(String),
}

/// Result of an OTP verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpVerification {
    pub success: bool,
    pub user: Option<User>,
}

/// Typed surface of the hub endpoints the storefront consumes.
///
/// [`HubClient`] is the production implementation; tests substitute a mock
/// to drive synchronizer and store behavior without a network.
#[async_trait]
pub trait HubApi: Send + Sync {
    /// List categories, optionally scoped to a parent category.
    ///
    /// No `parent_id` means the full list; the request then carries no
    /// `parentId` query parameter at all.
    async fn fetch_categories(
        &self,
        parent_id: Option<CategoryId>,
    ) -> Result<Vec<Category>, HubError>;

    /// List all tags for the hub.
    async fn fetch_tags(&self) -> Result<Vec<Tag>, HubError>;

    /// List all vendors for the hub.
    async fn fetch_vendors(&self) -> Result<Vec<Vendor>, HubError>;

    /// List products matching the given filters.
    async fn fetch_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, HubError>;

    /// Fetch a single product. 404 resolves to `Ok(None)`.
    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, HubError>;

    /// Load the authenticated customer for the current session cookie.
    /// 401 resolves to `Ok(None)`.
    async fn fetch_session(&self) -> Result<Option<User>, HubError>;

    /// Request an OTP challenge for a phone number.
    async fn send_otp(&self, phone: &Phone) -> Result<bool, HubError>;

    /// Invalidate the upstream hub session.
    async fn logout(&self) -> Result<(), HubError>;

    /// Verify a previously requested OTP code.
    ///
    /// A non-matching code is not an error: the hub reports
    /// `success: false` and no user.
    async fn verify_otp(&self, phone: &Phone, otp: &str) -> Result<OtpVerification, HubError>;

    /// List the authenticated customer's orders.
    async fn fetch_orders(&self) -> Result<Vec<Order>, HubError>;

    /// Create an order from cart line items.
    ///
    /// A 422 response surfaces as [`HubError::Validation`] with the
    /// server's message.
    async fn create_order(&self, items: &[OrderItemPayload]) -> Result<(), HubError>;

    /// Update an order's optional delivery metadata. `None` fields clear
    /// the stored value.
    async fn update_order_details(
        &self,
        id: OrderId,
        details: &OrderDetailsUpdate,
    ) -> Result<Order, HubError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_error_display() {
        let err = HubError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "unexpected status 503: unavailable");
    }

    #[test]
    fn test_validation_error_is_verbatim() {
        let err = HubError::Validation("mixed vendors are not allowed".to_string());
        assert_eq!(err.to_string(), "mixed vendors are not allowed");
    }
}
