//! Cart page and mutation handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use hubcart_core::ProductId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::nav;
use crate::session::CheckoutOutcome;
use crate::state::AppState;
use crate::stores::CartItem;

use super::{PRICE_ON_REQUEST, PageContext, price_label, redirect_back};

/// Cart line display data.
pub struct CartLineView {
    pub product_id: i32,
    pub name: String,
    pub target: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl CartLineView {
    fn build(item: &CartItem) -> Self {
        let product = &item.product;
        let line_total = match product.price_cents {
            Some(cents) => price_label(Some(cents * i64::from(item.quantity)), &product.currency),
            None => PRICE_ON_REQUEST.to_string(),
        };
        Self {
            product_id: product.id.as_i32(),
            name: product.name.clone(),
            target: nav::product_target(product.id),
            image_url: product.primary_image().map(str::to_string),
            quantity: item.quantity,
            unit_price: price_label(product.price_cents, &product.currency),
            line_total,
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub ctx: PageContext,
    pub lines: Vec<CartLineView>,
    /// Formatted subtotal, prefixed with "от" when some items have no
    /// price and the sum is only a lower bound.
    pub subtotal: Option<String>,
    pub signed_in: bool,
}

/// Display the cart page.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let engine = state.engine(&session).await?;
    let summary = engine.cart_summary();

    let subtotal = if summary.item_count == 0 {
        None
    } else {
        let currency = summary.currency.as_deref().unwrap_or("");
        let amount = price_label(Some(summary.subtotal_cents), currency);
        Some(if summary.has_unpriced_items {
            format!("от {amount}")
        } else {
            amount
        })
    };

    Ok(CartTemplate {
        ctx: PageContext::from_engine(&engine),
        lines: engine.cart_items().iter().map(CartLineView::build).collect(),
        subtotal,
        signed_in: engine.user().is_some(),
    })
}

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub product_id: i32,
    pub return_to: Option<String>,
}

/// Add one unit of a product to the cart.
#[instrument(skip_all, fields(product_id = form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddForm>,
) -> Result<Redirect> {
    let engine = state.engine(&session).await?;
    engine.add_to_cart(ProductId::new(form.product_id)).await;
    Ok(redirect_back(form.return_to.as_deref(), "/cart"))
}

/// Quantity update form data.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub product_id: i32,
    pub quantity: i64,
}

/// Set a line's quantity. Zero or negative removes the line.
#[instrument(skip_all, fields(product_id = form.product_id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<QuantityForm>,
) -> Result<Redirect> {
    let engine = state.engine(&session).await?;
    engine.set_cart_quantity(ProductId::new(form.product_id), form.quantity);
    Ok(Redirect::to("/cart"))
}

/// Removal form data.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub product_id: i32,
}

/// Remove a line from the cart.
#[instrument(skip_all, fields(product_id = form.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveForm>,
) -> Result<Redirect> {
    let engine = state.engine(&session).await?;
    engine.remove_from_cart(ProductId::new(form.product_id));
    Ok(Redirect::to("/cart"))
}

/// Place an order from the cart contents.
///
/// Requires a signed-in user; anonymous visitors are sent to the login
/// page with the cart untouched.
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect> {
    let engine = state.engine(&session).await?;
    if engine.user().is_none() {
        return Ok(Redirect::to("/auth/login?return_to=/cart"));
    }
    match engine.checkout().await {
        CheckoutOutcome::Placed => Ok(Redirect::to("/orders")),
        CheckoutOutcome::EmptyCart | CheckoutOutcome::Rejected | CheckoutOutcome::Failed => {
            Ok(Redirect::to("/cart"))
        }
    }
}
