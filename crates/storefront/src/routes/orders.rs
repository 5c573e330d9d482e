//! Order history page and detail edits.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use hubcart_core::OrderId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::models::Order;
use crate::nav::{self, NavState};
use crate::state::AppState;
use crate::sync::OrderDraft;

use super::{PRICE_ON_REQUEST, PageContext, price_label};

/// Order line display data.
pub struct OrderLineView {
    pub name: String,
    pub target: String,
    pub quantity: u32,
    /// Hub-approved quantity, shown next to the requested one when the
    /// hub trimmed the order.
    pub approved_quantity: Option<u32>,
    pub price: String,
}

/// Order display data, including the editable detail fields as plain
/// form values.
pub struct OrderView {
    pub id: i32,
    pub status: String,
    pub created_at: String,
    pub total: String,
    pub lines: Vec<OrderLineView>,
    pub shipping_address: String,
    pub consignee: String,
    pub delivery_notes: String,
    pub payer: String,
}

impl OrderView {
    fn build(order: &Order) -> Self {
        Self {
            id: order.id.as_i32(),
            status: order.status.to_string(),
            created_at: order.created_at.format("%d.%m.%Y %H:%M").to_string(),
            total: match order.total_cents {
                Some(cents) => price_label(Some(cents), &order.currency),
                None => PRICE_ON_REQUEST.to_string(),
            },
            lines: order
                .items
                .iter()
                .map(|item| OrderLineView {
                    name: item.name.clone(),
                    target: nav::product_target(item.product_id),
                    quantity: item.quantity,
                    approved_quantity: item.approved_quantity.filter(|&q| q != item.quantity),
                    price: price_label(item.price_cents, &order.currency),
                })
                .collect(),
            shipping_address: order.shipping_address.clone().unwrap_or_default(),
            consignee: order.consignee.clone().unwrap_or_default(),
            delivery_notes: order.delivery_notes.clone().unwrap_or_default(),
            payer: order.payer.clone().unwrap_or_default(),
        }
    }
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<OrderView>,
    pub is_loading: bool,
}

/// Query parameters for the order history page.
#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub search: Option<String>,
}

/// Display the order history, newest first. Anonymous visitors are
/// sent to the login page.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<IndexQuery>,
) -> Result<axum::response::Response> {
    let engine = state.engine(&session).await?;
    if engine.user().is_none() {
        return Ok(Redirect::to("/auth/login?return_to=/orders").into_response());
    }
    engine
        .navigate("/orders", query.search.as_deref(), &NavState::default())
        .await;

    let snapshot = engine.orders();
    Ok(OrdersTemplate {
        ctx: PageContext::from_engine(&engine),
        orders: snapshot.orders.iter().map(OrderView::build).collect(),
        is_loading: snapshot.is_loading,
    }
    .into_response())
}

/// Detail edit form data. Empty fields clear the value on the hub.
#[derive(Debug, Deserialize)]
pub struct DetailsForm {
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub consignee: String,
    #[serde(default)]
    pub delivery_notes: String,
    #[serde(default)]
    pub payer: String,
}

/// Save the editable details of an order.
///
/// The engine applies the edit optimistically and rolls it back if the
/// hub rejects it; either way the user lands back on the history page
/// with a toast describing what happened.
#[instrument(skip_all, fields(order_id = id))]
pub async fn save_details(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<DetailsForm>,
) -> Result<Redirect> {
    let engine = state.engine(&session).await?;
    let draft = OrderDraft {
        shipping_address: form.shipping_address,
        consignee: form.consignee,
        delivery_notes: form.delivery_notes,
        payer: form.payer,
    };
    engine.save_order_details(OrderId::new(id), &draft).await;
    Ok(Redirect::to("/orders"))
}
