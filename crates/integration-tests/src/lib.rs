//! End-to-end test harness for the storefront.
//!
//! Spawns a stub hub API on an ephemeral port and hands back a
//! [`HubConfig`] pointing at it, so tests can drive a real
//! [`HubClient`](hubcart_storefront::hub::HubClient) and engine over
//! actual HTTP, cookies included.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use hubcart_storefront::config::HubConfig;

const SESSION_COOKIE: &str = "hub_session=1";

/// Mutable state behind the stub hub endpoints.
pub struct StubState {
    pub categories: Vec<Value>,
    pub tags: Vec<Value>,
    pub vendors: Vec<Value>,
    /// Product list served to anonymous requests.
    pub anon_products: Vec<Value>,
    /// Product list served once the session cookie is present.
    pub auth_products: Vec<Value>,
    pub customer: Value,
    pub otp_code: String,
    pub orders: Mutex<Vec<Value>>,
    /// When set, order creation and updates fail with a 422 carrying
    /// this message.
    pub reject_orders: Mutex<Option<String>>,
    next_order_id: AtomicI32,
}

impl Default for StubState {
    fn default() -> Self {
        let product = |id: i32, name: &str, price: i64| {
            json!({
                "id": id,
                "categoryId": 1,
                "name": name,
                "sku": format!("SKU-{id}"),
                "description": "<p>Описание</p>",
                "units": "шт",
                "currency": "RUB",
                "priceCents": price,
                "tags": [{"id": 1, "name": "Новинки"}],
                "imageUrls": [],
                "amount": 250.0,
            })
        };

        Self {
            categories: vec![json!({"id": 1, "name": "Стекло"})],
            tags: vec![json!({"id": 1, "name": "Новинки"})],
            vendors: vec![json!({"id": 1, "name": "Примлаб"})],
            anon_products: vec![product(1, "Колба коническая", 100_000)],
            auth_products: vec![product(1, "Колба коническая", 80_000)],
            customer: json!({
                "id": 7,
                "hub_id": 1,
                "name": "Анна",
                "email": "anna@example.com",
                "phone": "+79001234567",
            }),
            otp_code: "123456".to_string(),
            orders: Mutex::new(Vec::new()),
            reject_orders: Mutex::new(None),
            next_order_id: AtomicI32::new(1),
        }
    }
}

impl StubState {
    fn products_for(&self, signed_in: bool) -> &[Value] {
        if signed_in {
            &self.auth_products
        } else {
            &self.anon_products
        }
    }

    fn locked_orders(&self) -> std::sync::MutexGuard<'_, Vec<Value>> {
        self.orders.lock().expect("orders lock poisoned")
    }

    fn rejection(&self) -> Option<String> {
        self.reject_orders
            .lock()
            .expect("rejection lock poisoned")
            .clone()
    }
}

/// A running stub hub.
pub struct StubHub {
    pub state: Arc<StubState>,
    pub config: HubConfig,
}

impl StubHub {
    /// Spawn a stub hub with the default catalog.
    pub async fn spawn() -> Self {
        Self::spawn_with(StubState::default()).await
    }

    /// Spawn a stub hub with custom state.
    pub async fn spawn_with(state: StubState) -> Self {
        let state = Arc::new(state);

        let api = Router::new()
            .route("/categories", get(list_categories))
            .route("/tags", get(list_tags))
            .route("/vendors", get(list_vendors))
            .route("/products", get(list_products))
            .route("/products/{id}", get(get_product))
            .route("/auth/session", get(get_session))
            .route("/auth/otp", post(send_otp))
            .route("/auth/otp/verify", post(verify_otp))
            .route("/auth/logout", post(logout))
            .route("/orders", get(list_orders).post(create_order))
            .route("/orders/{id}", patch(update_order))
            .with_state(Arc::clone(&state));

        let app = Router::new().nest("/test-hub", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind stub hub listener");
        let addr = listener.local_addr().expect("failed to read local addr");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("stub hub server failed");
        });

        let api_url = format!("http://{addr}")
            .parse()
            .expect("stub hub address is a valid URL");

        Self {
            state,
            config: HubConfig {
                api_url,
                hub_id: "test-hub".to_string(),
            },
        }
    }

    /// Make subsequent order creation and updates fail with a 422
    /// carrying `message`.
    pub fn reject_orders_with(&self, message: &str) {
        *self
            .state
            .reject_orders
            .lock()
            .expect("rejection lock poisoned") = Some(message.to_string());
    }

    /// Snapshot of the orders the stub currently holds.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        self.state.locked_orders().clone()
    }
}

fn signed_in(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|cookie| cookie.contains(SESSION_COOKIE))
}

async fn list_categories(State(state): State<Arc<StubState>>) -> Json<Vec<Value>> {
    Json(state.categories.clone())
}

async fn list_tags(State(state): State<Arc<StubState>>) -> Json<Vec<Value>> {
    Json(state.tags.clone())
}

async fn list_vendors(State(state): State<Arc<StubState>>) -> Json<Vec<Value>> {
    Json(state.vendors.clone())
}

async fn list_products(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    let needle = query.get("search").map(|s| s.to_lowercase());
    let products = state
        .products_for(signed_in(&headers))
        .iter()
        .filter(|p| {
            needle.as_ref().is_none_or(|needle| {
                p.get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|name| name.to_lowercase().contains(needle))
            })
        })
        .cloned()
        .collect();
    Json(products)
}

async fn get_product(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let found = state
        .products_for(signed_in(&headers))
        .iter()
        .find(|p| p.get("id").and_then(Value::as_i64) == Some(id));
    match found {
        Some(product) => Json(product.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_session(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if signed_in(&headers) {
        Json(json!({"customer": state.customer})).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn send_otp(Json(body): Json<Value>) -> Response {
    if body.get("phone").and_then(Value::as_str).is_some() {
        Json(json!({"success": true})).into_response()
    } else {
        StatusCode::BAD_REQUEST.into_response()
    }
}

async fn verify_otp(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    let otp = body.get("otp").and_then(Value::as_str).unwrap_or_default();
    if otp == state.otp_code {
        (
            [(header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/"))],
            Json(json!({"success": true, "customer": state.customer})),
        )
            .into_response()
    } else {
        Json(json!({"success": false})).into_response()
    }
}

async fn logout() -> Response {
    (
        [(
            header::SET_COOKIE,
            "hub_session=; Path=/; Max-Age=0".to_string(),
        )],
        StatusCode::OK,
    )
        .into_response()
}

async fn list_orders(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if !signed_in(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(state.locked_orders().clone()).into_response()
}

async fn create_order(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(items): Json<Vec<Value>>,
) -> Response {
    if !signed_in(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if let Some(message) = state.rejection() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": message})),
        )
            .into_response();
    }

    let order_items: Vec<Value> = items
        .iter()
        .map(|item| {
            let product_id = item.get("productId").and_then(Value::as_i64);
            let priced = state
                .auth_products
                .iter()
                .find(|p| p.get("id").and_then(Value::as_i64) == product_id);
            json!({
                "productId": product_id,
                "quantity": item.get("quantity"),
                "priceCents": priced.and_then(|p| p.get("priceCents")).cloned(),
                "name": priced
                    .and_then(|p| p.get("name"))
                    .cloned()
                    .unwrap_or_else(|| Value::String("?".to_string())),
            })
        })
        .collect();

    let id = state.next_order_id.fetch_add(1, Ordering::SeqCst);
    state.locked_orders().push(json!({
        "id": id,
        "status": "new",
        "currency": "RUB",
        "totalCents": 80_000,
        "createdAt": chrono::Utc::now().to_rfc3339(),
        "items": order_items,
    }));

    StatusCode::CREATED.into_response()
}

async fn update_order(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(details): Json<Value>,
) -> Response {
    if !signed_in(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if let Some(message) = state.rejection() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": message})),
        )
            .into_response();
    }

    let mut orders = state.locked_orders();
    let Some(order) = orders
        .iter_mut()
        .find(|o| o.get("id").and_then(Value::as_i64) == Some(id))
    else {
        return StatusCode::NOT_FOUND.into_response();
    };

    for field in ["shippingAddress", "consignee", "deliveryNotes", "payer"] {
        if let Some(value) = details.get(field)
            && let Some(object) = order.as_object_mut()
        {
            object.insert(field.to_string(), value.clone());
        }
    }

    Json(order.clone()).into_response()
}
