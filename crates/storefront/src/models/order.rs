//! Order history domain types.

use chrono::{DateTime, Utc};

use hubcart_core::{OrderId, OrderStatus, ProductId};

/// A placed order.
///
/// Immutable from the client's perspective except for the optional
/// delivery-metadata fields, which support in-place edit-and-save.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub currency: String,
    pub total_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLineItem>,
    pub shipping_address: Option<String>,
    pub consignee: Option<String>,
    pub delivery_notes: Option<String>,
    pub payer: Option<String>,
}

/// A product/quantity pairing inside an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Quantity the hub actually approved, when it differs from requested.
    pub approved_quantity: Option<u32>,
    pub price_cents: Option<i64>,
    pub name: String,
}
