//! Hub REST API client implementation.
//!
//! One instance per browser session: the cookie jar holds the upstream hub
//! session cookie, so catalog prices and order history are scoped to the
//! authenticated identity. Tags are cached via `moka` (5-minute TTL); other
//! reads are either parent-scoped or identity-dependent and stay uncached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use hubcart_core::{CategoryId, OrderId, Phone, ProductId};

use crate::config::HubConfig;
use crate::models::{Category, Order, Product, Tag, User, Vendor};

use super::types::{
    CategoryDto, ErrorBody, OrderDto, OrderDetailsUpdate, OrderItemPayload, OtpResponse,
    ProductDto, ProductFilter, TagDto, VendorDto, extract_customer,
};
use super::{HubApi, HubError, OtpVerification};

/// Upstream request timeout; keeps loading state from wedging on a hung
/// upstream.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const TAGS_CACHE_KEY: &str = "tags";
const TAGS_CACHE_TTL: Duration = Duration::from_secs(300);

/// Client for the hub catalog/order/auth API.
#[derive(Clone)]
pub struct HubClient {
    inner: Arc<HubClientInner>,
}

struct HubClientInner {
    client: reqwest::Client,
    /// `{api_url}/{hub_id}`, no trailing slash.
    base: String,
    tags: Cache<&'static str, Vec<Tag>>,
}

impl HubClient {
    /// Create a new hub client with its own cookie jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &HubConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let tags = Cache::builder()
            .max_capacity(1)
            .time_to_live(TAGS_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(HubClientInner {
                client,
                base: format!(
                    "{}/{}",
                    config.api_url.as_str().trim_end_matches('/'),
                    config.hub_id
                ),
                tags,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base)
    }

    /// GET a JSON payload, normalizing transport and status failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, HubError> {
        let response = self
            .inner
            .client
            .get(self.endpoint(path))
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path = %path,
                body = %text.chars().take(500).collect::<String>(),
                "hub returned non-success status"
            );
            return Err(HubError::Status {
                status: status.as_u16(),
                body: text.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                body = %text.chars().take(500).collect::<String>(),
                "failed to parse hub response"
            );
            HubError::Parse(e)
        })
    }

    /// Turn a non-success mutation response into the right error: 422 with
    /// a structured body carries the server's message verbatim.
    fn mutation_error(status: reqwest::StatusCode, body: &str) -> HubError {
        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
            && let Ok(parsed) = serde_json::from_str::<ErrorBody>(body)
        {
            return HubError::Validation(parsed.error);
        }

        HubError::Status {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        }
    }
}

#[async_trait]
impl HubApi for HubClient {
    #[instrument(skip(self))]
    async fn fetch_categories(
        &self,
        parent_id: Option<CategoryId>,
    ) -> Result<Vec<Category>, HubError> {
        let mut query = Vec::new();
        if let Some(parent_id) = parent_id {
            query.push(("parentId", parent_id.to_string()));
        }

        let dtos: Vec<CategoryDto> = self.get_json("/categories", &query).await?;
        Ok(dtos.into_iter().map(Category::from).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_tags(&self) -> Result<Vec<Tag>, HubError> {
        if let Some(tags) = self.inner.tags.get(TAGS_CACHE_KEY).await {
            debug!("cache hit for tags");
            return Ok(tags);
        }

        let dtos: Vec<TagDto> = self.get_json("/tags", &[]).await?;
        let tags: Vec<Tag> = dtos.into_iter().map(Tag::from).collect();
        self.inner.tags.insert(TAGS_CACHE_KEY, tags.clone()).await;
        Ok(tags)
    }

    #[instrument(skip(self))]
    async fn fetch_vendors(&self) -> Result<Vec<Vendor>, HubError> {
        let dtos: Vec<VendorDto> = self.get_json("/vendors", &[]).await?;
        Ok(dtos.into_iter().map(Vendor::from).collect())
    }

    #[instrument(skip(self, filter))]
    async fn fetch_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, HubError> {
        let mut query = Vec::new();
        if let Some(category_id) = filter.category_id {
            query.push(("categoryId", category_id.to_string()));
        }
        if let Some(tag_id) = filter.tag_id {
            query.push(("tagId", tag_id.to_string()));
        }
        if let Some(search) = filter.search.as_deref() {
            let search = search.trim();
            if !search.is_empty() {
                query.push(("search", search.to_string()));
            }
        }
        if let Some(vendor_id) = filter.vendor_id {
            query.push(("vendorId", vendor_id.to_string()));
        }
        if let Some(min_amount) = filter.min_amount {
            query.push(("minAmount", min_amount.to_string()));
        }
        if let Some(max_amount) = filter.max_amount {
            query.push(("maxAmount", max_amount.to_string()));
        }

        let dtos: Vec<ProductDto> = self.get_json("/products", &query).await?;
        Ok(dtos.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, HubError> {
        let response = self
            .inner
            .client
            .get(self.endpoint(&format!("/products/{id}")))
            .header("Accept", "application/json")
            .send()
            .await?;

        // Absent product is a valid outcome, not an error
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(HubError::Status {
                status: status.as_u16(),
                body: text.chars().take(200).collect(),
            });
        }

        let dto: ProductDto = serde_json::from_str(&text)?;
        Ok(Some(Product::from(dto)))
    }

    #[instrument(skip(self))]
    async fn fetch_session(&self) -> Result<Option<User>, HubError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("/auth/session"))
            .header("Accept", "application/json")
            .send()
            .await?;

        // No session cookie or an expired one: signed out, not an error
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(HubError::Status {
                status: status.as_u16(),
                body: text.chars().take(200).collect(),
            });
        }

        let payload: serde_json::Value = serde_json::from_str(&text)?;
        Ok(extract_customer(&payload))
    }

    #[instrument(skip(self, phone))]
    async fn send_otp(&self, phone: &Phone) -> Result<bool, HubError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/auth/otp"))
            .json(&serde_json::json!({ "phone": phone.as_str() }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(HubError::Status {
                status: status.as_u16(),
                body: text.chars().take(200).collect(),
            });
        }

        let parsed: OtpResponse = serde_json::from_str(&text)?;
        Ok(parsed.success)
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> Result<(), HubError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/auth/logout"))
            .send()
            .await?;

        let status = response.status();
        // Already signed out upstream is as good as signed out
        if status.is_success() || status == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(());
        }

        let text = response.text().await?;
        Err(HubError::Status {
            status: status.as_u16(),
            body: text.chars().take(200).collect(),
        })
    }

    #[instrument(skip(self, phone, otp))]
    async fn verify_otp(&self, phone: &Phone, otp: &str) -> Result<OtpVerification, HubError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/auth/otp/verify"))
            .json(&serde_json::json!({ "phone": phone.as_str(), "otp": otp }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(HubError::Status {
                status: status.as_u16(),
                body: text.chars().take(200).collect(),
            });
        }

        let parsed: super::types::VerifyResponse = serde_json::from_str(&text)?;
        Ok(OtpVerification {
            success: parsed.success,
            user: parsed.customer.map(User::from),
        })
    }

    #[instrument(skip(self))]
    async fn fetch_orders(&self) -> Result<Vec<Order>, HubError> {
        let dtos: Vec<OrderDto> = self.get_json("/orders", &[]).await?;
        Ok(dtos.into_iter().map(Order::from).collect())
    }

    #[instrument(skip(self, items))]
    async fn create_order(&self, items: &[OrderItemPayload]) -> Result<(), HubError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/orders"))
            .json(items)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await?;
        Err(Self::mutation_error(status, &text))
    }

    #[instrument(skip(self, details), fields(order_id = %id))]
    async fn update_order_details(
        &self,
        id: OrderId,
        details: &OrderDetailsUpdate,
    ) -> Result<Order, HubError> {
        let response = self
            .inner
            .client
            .patch(self.endpoint(&format!("/orders/{id}")))
            .json(details)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Self::mutation_error(status, &text));
        }

        let dto: OrderDto = serde_json::from_str(&text)?;
        Ok(Order::from(dto))
    }
}
