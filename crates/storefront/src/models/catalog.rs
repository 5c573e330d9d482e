//! Catalog domain types: categories, tags, vendors, products.

use serde::{Deserialize, Serialize};

use hubcart_core::{CategoryId, ProductId, TagId, VendorId};

/// A catalog category. Categories form a tree via `parent_id`; the hub
/// guarantees referential integrity, the client tolerates missing parents.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// A flat product tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// A product vendor, used for the vendor filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
}

/// A catalog product.
///
/// `price_cents` and `base_price_cents` are minor currency units; `None`
/// means "price unavailable". `base_price_cents` is a pre-discount reference
/// price shown struck through when present and distinct from the price.
/// `description` is rich text and must pass through
/// [`crate::sanitize::clean_description`] before rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub sku: Option<String>,
    pub description: String,
    pub units: Option<String>,
    pub currency: String,
    pub price_cents: Option<i64>,
    pub base_price_cents: Option<i64>,
    pub tags: Vec<Tag>,
    pub image_urls: Vec<String>,
    pub amount: Option<f64>,
}

impl Product {
    /// The primary product image, if any (first of the ordered list).
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }

    /// The struck-through reference price, only when it differs from the
    /// current price.
    #[must_use]
    pub fn struck_price_cents(&self) -> Option<i64> {
        match (self.base_price_cents, self.price_cents) {
            (Some(base), Some(price)) if base != price => Some(base),
            (Some(base), None) => Some(base),
            _ => None,
        }
    }
}

/// Product list layout preference, persisted per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductLayout {
    #[default]
    Grid,
    List,
}

impl ProductLayout {
    /// Value used in forms and templates.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::List => "list",
        }
    }

    /// Parse a form value, defaulting to grid for anything unrecognized.
    #[must_use]
    pub fn from_form_value(value: &str) -> Self {
        match value {
            "list" => Self::List,
            _ => Self::Grid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: Option<i64>, base: Option<i64>) -> Product {
        Product {
            id: ProductId::new(1),
            category_id: None,
            name: "Чай".to_string(),
            sku: None,
            description: String::new(),
            units: None,
            currency: "RUB".to_string(),
            price_cents: price,
            base_price_cents: base,
            tags: vec![],
            image_urls: vec![],
            amount: None,
        }
    }

    #[test]
    fn test_struck_price_only_when_distinct() {
        assert_eq!(product(Some(100), Some(150)).struck_price_cents(), Some(150));
        assert_eq!(product(Some(100), Some(100)).struck_price_cents(), None);
        assert_eq!(product(Some(100), None).struck_price_cents(), None);
        assert_eq!(product(None, Some(150)).struck_price_cents(), Some(150));
    }

    #[test]
    fn test_primary_image_is_first() {
        let mut p = product(None, None);
        assert_eq!(p.primary_image(), None);
        p.image_urls = vec!["a.png".to_string(), "b.png".to_string()];
        assert_eq!(p.primary_image(), Some("a.png"));
    }

    #[test]
    fn test_layout_form_roundtrip() {
        assert_eq!(ProductLayout::from_form_value("list"), ProductLayout::List);
        assert_eq!(ProductLayout::from_form_value("grid"), ProductLayout::Grid);
        assert_eq!(ProductLayout::from_form_value("bogus"), ProductLayout::Grid);
    }
}
