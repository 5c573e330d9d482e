//! Product detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::models::Product;
use crate::nav::{self, NavState};
use crate::sanitize;
use crate::state::AppState;

use super::{PageContext, price_label};

/// A breadcrumb step above the product heading.
pub struct Crumb {
    pub name: String,
    pub target: String,
}

/// Product detail display data.
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub sku: Option<String>,
    /// Sanitized vendor HTML, rendered unescaped in the template.
    pub description_html: String,
    pub price: String,
    pub struck_price: Option<String>,
    pub amount: Option<String>,
    pub image_urls: Vec<String>,
    pub tags: Vec<super::catalog::TagChip>,
}

impl ProductView {
    fn build(product: &Product, search: Option<&str>) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            sku: product.sku.clone(),
            description_html: sanitize::clean_description(&product.description),
            price: price_label(product.price_cents, &product.currency),
            struck_price: product
                .struck_price_cents()
                .map(|cents| price_label(Some(cents), &product.currency)),
            amount: product.amount.map(|a| match &product.units {
                Some(units) => format!("{a} {units}"),
                None => a.to_string(),
            }),
            image_urls: product.image_urls.clone(),
            tags: product
                .tags
                .iter()
                .map(|t| super::catalog::TagChip {
                    target: nav::tag_target(t.id, Some(&t.name), search),
                    name: t.name.clone(),
                    active: false,
                })
                .collect(),
        }
    }
}

/// Product page template. `product` is `None` when the hub no longer
/// knows the id.
#[derive(Template, WebTemplate)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub ctx: PageContext,
    pub crumbs: Vec<Crumb>,
    pub product: Option<ProductView>,
    pub is_loading: bool,
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub search: Option<String>,
}

/// Display a product page.
#[instrument(skip_all, fields(product_id = id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Query(query): Query<DetailQuery>,
) -> Result<impl IntoResponse> {
    let engine = state.engine(&session).await?;
    let path = format!("/products/{id}");
    engine
        .navigate(&path, query.search.as_deref(), &NavState::default())
        .await;

    let snapshot = engine.product_detail();
    let search = engine.search();

    let mut crumbs = vec![Crumb {
        name: "Каталог".to_string(),
        target: nav::home_target(search.as_deref()),
    }];
    if let Some(category_id) = snapshot.product.as_ref().and_then(|p| p.category_id)
        && let Some(category) = snapshot.categories.iter().find(|c| c.id == category_id)
    {
        crumbs.push(Crumb {
            name: category.name.clone(),
            target: nav::category_target(category.id, Some(&category.name), search.as_deref()),
        });
    }

    Ok(ProductTemplate {
        ctx: PageContext::from_engine(&engine),
        crumbs,
        product: snapshot
            .product
            .as_ref()
            .map(|p| ProductView::build(p, search.as_deref())),
        is_loading: snapshot.is_loading,
    })
}
