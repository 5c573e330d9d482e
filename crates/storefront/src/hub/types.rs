//! Wire types for the hub REST API.
//!
//! Catalog and order payloads are camelCase JSON; the customer payload uses
//! snake_case (`hub_id`) and may arrive either at the top level or nested
//! under a `customer` key, so it is extracted leniently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hubcart_core::{CategoryId, HubId, OrderId, OrderStatus, ProductId, TagId, UserId, VendorId};

use crate::models::{Category, Order, OrderLineItem, Product, Tag, User, Vendor};

// =============================================================================
// Request payloads
// =============================================================================

/// Filters for the product list endpoint. All combinable; `None` omits the
/// corresponding query parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub tag_id: Option<TagId>,
    pub search: Option<String>,
    pub vendor_id: Option<VendorId>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

/// One line of an order-creation request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Delivery-metadata update payload. `None` is serialized as JSON null and
/// clears the field server-side.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailsUpdate {
    pub shipping_address: Option<String>,
    pub consignee: Option<String>,
    pub delivery_notes: Option<String>,
    pub payer: Option<String>,
}

// =============================================================================
// Response payloads
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: CategoryId,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TagDto {
    pub id: TagId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct VendorDto {
    pub id: VendorId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: ProductId,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub units: Option<String>,
    pub currency: String,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub base_price_cents: Option<i64>,
    #[serde(default)]
    pub tags: Vec<TagDto>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Customer payload; snake_case per the hub's auth service.
#[derive(Debug, Deserialize)]
pub struct CustomerDto {
    pub id: UserId,
    pub hub_id: HubId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub customer: Option<CustomerDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub approved_quantity: Option<u32>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: OrderId,
    pub status: OrderStatus,
    pub currency: String,
    #[serde(default)]
    pub total_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItemDto>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub consignee: Option<String>,
    #[serde(default)]
    pub delivery_notes: Option<String>,
    #[serde(default)]
    pub payer: Option<String>,
}

/// Structured error body the hub sends with 422 responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(alias = "message")]
    pub error: String,
}

/// Extract the customer from a session payload that may nest it under a
/// `customer` key or inline at the top level. Anything malformed is `None`.
#[must_use]
pub fn extract_customer(payload: &serde_json::Value) -> Option<User> {
    let record = payload.get("customer").unwrap_or(payload);
    serde_json::from_value::<CustomerDto>(record.clone())
        .ok()
        .map(User::from)
}

// =============================================================================
// Conversions
// =============================================================================

impl From<CategoryDto> for Category {
    fn from(dto: CategoryDto) -> Self {
        Self {
            id: dto.id,
            parent_id: dto.parent_id,
            name: dto.name,
            description: dto.description,
            image_url: dto.image_url,
        }
    }
}

impl From<TagDto> for Tag {
    fn from(dto: TagDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
        }
    }
}

impl From<VendorDto> for Vendor {
    fn from(dto: VendorDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
        }
    }
}

impl From<ProductDto> for Product {
    fn from(dto: ProductDto) -> Self {
        Self {
            id: dto.id,
            category_id: dto.category_id,
            name: dto.name,
            sku: dto.sku,
            description: dto.description,
            units: dto.units,
            currency: dto.currency,
            price_cents: dto.price_cents,
            base_price_cents: dto.base_price_cents,
            tags: dto.tags.into_iter().map(Tag::from).collect(),
            image_urls: dto.image_urls,
            amount: dto.amount,
        }
    }
}

impl From<CustomerDto> for User {
    fn from(dto: CustomerDto) -> Self {
        Self {
            id: dto.id,
            hub_id: dto.hub_id,
            name: dto.name,
            email: dto.email,
            phone: dto.phone,
        }
    }
}

impl From<OrderItemDto> for OrderLineItem {
    fn from(dto: OrderItemDto) -> Self {
        Self {
            product_id: dto.product_id,
            quantity: dto.quantity,
            approved_quantity: dto.approved_quantity,
            price_cents: dto.price_cents,
            name: dto.name,
        }
    }
}

impl From<OrderDto> for Order {
    fn from(dto: OrderDto) -> Self {
        Self {
            id: dto.id,
            status: dto.status,
            currency: dto.currency,
            total_cents: dto.total_cents,
            created_at: dto.created_at,
            items: dto.items.into_iter().map(OrderLineItem::from).collect(),
            shipping_address: dto.shipping_address,
            consignee: dto.consignee,
            delivery_notes: dto.delivery_notes,
            payer: dto.payer,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_customer_nested() {
        let payload = json!({
            "customer": {
                "id": 5,
                "hub_id": 2,
                "name": "Анна",
                "email": null,
                "phone": "+79001234567"
            }
        });
        let user = extract_customer(&payload).unwrap();
        assert_eq!(user.id, UserId::new(5));
        assert_eq!(user.email, None);
    }

    #[test]
    fn test_extract_customer_top_level() {
        let payload = json!({
            "id": 5,
            "hub_id": 2,
            "name": "Анна",
            "email": "a@example.com",
            "phone": "+79001234567"
        });
        let user = extract_customer(&payload).unwrap();
        assert_eq!(user.email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn test_extract_customer_malformed_is_none() {
        assert!(extract_customer(&json!({"customer": {"id": "oops"}})).is_none());
        assert!(extract_customer(&json!("nonsense")).is_none());
    }

    #[test]
    fn test_product_dto_camel_case() {
        let dto: ProductDto = serde_json::from_value(json!({
            "id": 1,
            "categoryId": 3,
            "name": "Чай зелёный",
            "currency": "RUB",
            "priceCents": 12900,
            "basePriceCents": 14900,
            "imageUrls": ["tea.png"],
            "tags": [{"id": 1, "name": "чай"}]
        }))
        .unwrap();
        let product = Product::from(dto);
        assert_eq!(product.price_cents, Some(12_900));
        assert_eq!(product.category_id, Some(CategoryId::new(3)));
        assert_eq!(product.tags.len(), 1);
    }

    #[test]
    fn test_error_body_accepts_message_alias() {
        let body: ErrorBody = serde_json::from_value(json!({"message": "bad"})).unwrap();
        assert_eq!(body.error, "bad");
        let body: ErrorBody = serde_json::from_value(json!({"error": "worse"})).unwrap();
        assert_eq!(body.error, "worse");
    }

    #[test]
    fn test_details_update_serializes_nulls() {
        let update = OrderDetailsUpdate {
            shipping_address: Some("ул. Ленина, 1".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["shippingAddress"], "ул. Ленина, 1");
        assert!(value["consignee"].is_null());
    }
}
