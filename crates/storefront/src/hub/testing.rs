//! In-process [`HubApi`] mock for store, synchronizer and engine tests.
//!
//! Responses are configured up front; individual endpoints can be failed
//! or gated (blocked until released) to exercise race handling.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use hubcart_core::{CategoryId, OrderId, Phone, ProductId};

use crate::hub::types::{OrderDetailsUpdate, OrderItemPayload, ProductFilter};
use crate::hub::{HubApi, HubError, OtpVerification};
use crate::models::{Category, Order, Product, Tag, User, Vendor};

/// Poll a future exactly once, returning its output if it is ready.
///
/// Lets race tests drive a future up to its suspension point (a gated
/// endpoint) before changing state out from under it.
pub async fn poll_once<F: Future + Unpin>(mut future: F) -> Option<F::Output> {
    use std::task::Poll;
    std::future::poll_fn(|cx| match std::pin::Pin::new(&mut future).poll(cx) {
        Poll::Ready(output) => Poll::Ready(Some(output)),
        Poll::Pending => Poll::Ready(None),
    })
    .await
}

/// A gate that can block callers until explicitly opened.
#[derive(Default)]
struct Gate(Mutex<Option<Arc<Semaphore>>>);

impl Gate {
    fn close(&self) {
        *self.0.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    fn open(&self) {
        if let Some(sem) = self.0.lock().unwrap().take() {
            sem.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    async fn pass(&self) {
        let sem = self.0.lock().unwrap().clone();
        if let Some(sem) = sem {
            let _ = sem.acquire().await;
        }
    }
}

#[derive(Default)]
pub struct MockHub {
    categories: Mutex<Vec<Category>>,
    tags: Mutex<Vec<Tag>>,
    vendors: Mutex<Vec<Vendor>>,
    products: Mutex<Vec<Product>>,
    products_by_id: Mutex<HashMap<ProductId, Product>>,
    session_user: Mutex<Option<User>>,
    orders: Mutex<Vec<Order>>,
    verify_result: Mutex<Option<OtpVerification>>,
    updated_order: Mutex<Option<Order>>,

    failing: Mutex<HashSet<&'static str>>,
    validation_message: Mutex<Option<String>>,

    session_gate: Gate,
    products_gate: Gate,

    pub products_calls: AtomicUsize,
    pub session_calls: AtomicUsize,
    pub orders_calls: AtomicUsize,
    pub otp_sends: AtomicUsize,

    last_filter: Mutex<Option<ProductFilter>>,
    last_category_parent: Mutex<Option<Option<CategoryId>>>,
    last_order_payload: Mutex<Option<Vec<OrderItemPayload>>>,
    last_details: Mutex<Option<(OrderId, OrderDetailsUpdate)>>,
}

impl MockHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_categories(&self, categories: Vec<Category>) {
        *self.categories.lock().unwrap() = categories;
    }

    pub fn set_tags(&self, tags: Vec<Tag>) {
        *self.tags.lock().unwrap() = tags;
    }

    pub fn set_vendors(&self, vendors: Vec<Vendor>) {
        *self.vendors.lock().unwrap() = vendors;
    }

    pub fn set_products(&self, products: Vec<Product>) {
        let mut by_id = self.products_by_id.lock().unwrap();
        for product in &products {
            by_id.insert(product.id, product.clone());
        }
        drop(by_id);
        *self.products.lock().unwrap() = products;
    }

    pub fn set_session_user(&self, user: Option<User>) {
        *self.session_user.lock().unwrap() = user;
    }

    pub fn set_orders(&self, orders: Vec<Order>) {
        *self.orders.lock().unwrap() = orders;
    }

    pub fn set_verify_result(&self, result: OtpVerification) {
        *self.verify_result.lock().unwrap() = Some(result);
    }

    pub fn set_updated_order(&self, order: Order) {
        *self.updated_order.lock().unwrap() = Some(order);
    }

    /// Make the named endpoint return a 500-style error.
    pub fn fail(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().insert(endpoint);
    }

    pub fn recover(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().remove(endpoint);
    }

    /// Make order mutations fail with a domain validation message.
    pub fn reject_orders_with(&self, message: &str) {
        *self.validation_message.lock().unwrap() = Some(message.to_string());
    }

    pub fn gate_session(&self) {
        self.session_gate.close();
    }

    pub fn release_session(&self) {
        self.session_gate.open();
    }

    pub fn gate_products(&self) {
        self.products_gate.close();
    }

    pub fn release_products(&self) {
        self.products_gate.open();
    }

    #[must_use]
    pub fn last_filter(&self) -> Option<ProductFilter> {
        self.last_filter.lock().unwrap().clone()
    }

    /// Parent scope of the most recent category fetch, if any was made.
    #[must_use]
    pub fn last_category_parent(&self) -> Option<Option<CategoryId>> {
        *self.last_category_parent.lock().unwrap()
    }

    #[must_use]
    pub fn last_order_payload(&self) -> Option<Vec<OrderItemPayload>> {
        self.last_order_payload.lock().unwrap().clone()
    }

    #[must_use]
    pub fn last_details(&self) -> Option<(OrderId, OrderDetailsUpdate)> {
        self.last_details.lock().unwrap().clone()
    }

    fn check(&self, endpoint: &'static str) -> Result<(), HubError> {
        if self.failing.lock().unwrap().contains(endpoint) {
            return Err(HubError::Status {
                status: 500,
                body: format!("{endpoint} unavailable"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl HubApi for MockHub {
    async fn fetch_categories(
        &self,
        parent_id: Option<CategoryId>,
    ) -> Result<Vec<Category>, HubError> {
        *self.last_category_parent.lock().unwrap() = Some(parent_id);
        self.check("categories")?;
        Ok(self.categories.lock().unwrap().clone())
    }

    async fn fetch_tags(&self) -> Result<Vec<Tag>, HubError> {
        self.check("tags")?;
        Ok(self.tags.lock().unwrap().clone())
    }

    async fn fetch_vendors(&self) -> Result<Vec<Vendor>, HubError> {
        self.check("vendors")?;
        Ok(self.vendors.lock().unwrap().clone())
    }

    async fn fetch_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, HubError> {
        self.products_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_filter.lock().unwrap() = Some(filter.clone());
        self.products_gate.pass().await;
        self.check("products")?;
        Ok(self.products.lock().unwrap().clone())
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, HubError> {
        self.check("product")?;
        Ok(self.products_by_id.lock().unwrap().get(&id).cloned())
    }

    async fn fetch_session(&self) -> Result<Option<User>, HubError> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        self.session_gate.pass().await;
        self.check("session")?;
        Ok(self.session_user.lock().unwrap().clone())
    }

    async fn send_otp(&self, _phone: &Phone) -> Result<bool, HubError> {
        self.check("otp")?;
        self.otp_sends.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn logout(&self) -> Result<(), HubError> {
        self.check("logout")?;
        *self.session_user.lock().unwrap() = None;
        Ok(())
    }

    async fn verify_otp(&self, _phone: &Phone, _otp: &str) -> Result<OtpVerification, HubError> {
        self.check("verify")?;
        Ok(self
            .verify_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(OtpVerification {
                success: false,
                user: None,
            }))
    }

    async fn fetch_orders(&self) -> Result<Vec<Order>, HubError> {
        self.orders_calls.fetch_add(1, Ordering::SeqCst);
        self.check("orders")?;
        Ok(self.orders.lock().unwrap().clone())
    }

    async fn create_order(&self, items: &[OrderItemPayload]) -> Result<(), HubError> {
        *self.last_order_payload.lock().unwrap() = Some(items.to_vec());
        if let Some(message) = self.validation_message.lock().unwrap().clone() {
            return Err(HubError::Validation(message));
        }
        self.check("create_order")?;
        Ok(())
    }

    async fn update_order_details(
        &self,
        id: OrderId,
        details: &OrderDetailsUpdate,
    ) -> Result<Order, HubError> {
        *self.last_details.lock().unwrap() = Some((id, details.clone()));
        if let Some(message) = self.validation_message.lock().unwrap().clone() {
            return Err(HubError::Validation(message));
        }
        self.check("update_order")?;
        self.updated_order
            .lock()
            .unwrap()
            .clone()
            .ok_or(HubError::Status {
                status: 404,
                body: "no order configured".to_string(),
            })
    }
}
