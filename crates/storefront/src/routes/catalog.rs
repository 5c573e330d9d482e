//! Catalog route handlers: home, category, and tag pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::models::Product;
use crate::nav::{self, NavState, View};
use crate::session::Engine;
use crate::state::AppState;

use super::prefs::{AMOUNT_PRESETS, AmountPreset};
use super::{PageContext, price_label};

/// Category link display data.
#[derive(Clone)]
pub struct CategoryLink {
    pub name: String,
    pub target: String,
    pub image_url: Option<String>,
}

/// Tag chip display data.
#[derive(Clone)]
pub struct TagChip {
    pub name: String,
    pub target: String,
    pub active: bool,
}

/// Vendor filter option.
#[derive(Clone)]
pub struct VendorOption {
    pub id: i32,
    pub name: String,
    pub selected: bool,
}

/// Product card display data.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: i32,
    pub name: String,
    pub price: String,
    /// Pre-discount price, present only when it differs from the price.
    pub struck_price: Option<String>,
    pub image_url: Option<String>,
    pub units: Option<String>,
    pub target: String,
}

impl ProductCardView {
    fn build(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            price: price_label(product.price_cents, &product.currency),
            struck_price: product
                .struck_price_cents()
                .map(|cents| price_label(Some(cents), &product.currency)),
            image_url: product.primary_image().map(str::to_string),
            units: product.units.clone(),
            target: nav::product_target(product.id),
        }
    }
}

/// Query parameters shared by all catalog pages. `name` is the transient
/// display name the origin link passed along.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub name: Option<String>,
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog.html")]
pub struct CatalogTemplate {
    pub ctx: PageContext,
    pub heading: String,
    pub categories: Vec<CategoryLink>,
    pub tags: Vec<TagChip>,
    pub vendors: Vec<VendorOption>,
    pub products: Vec<ProductCardView>,
    pub layout: &'static str,
    pub is_loading: bool,
    pub amount_presets: &'static [AmountPreset],
    pub amount_preset_id: String,
    pub current_path: String,
}

/// Display the home page.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse> {
    let engine = state.engine(&session).await?;
    let view = engine
        .navigate("/", query.search.as_deref(), &nav_state(&query))
        .await;
    Ok(render(&engine, &view, "/".to_string()))
}

/// Display a category page.
#[instrument(skip_all, fields(category_id = id))]
pub async fn category(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse> {
    let engine = state.engine(&session).await?;
    let path = format!("/categories/{id}");
    let view = engine
        .navigate(&path, query.search.as_deref(), &nav_state(&query))
        .await;
    Ok(render(&engine, &view, path))
}

/// Display a tag page.
#[instrument(skip_all, fields(tag_id = id))]
pub async fn tag(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse> {
    let engine = state.engine(&session).await?;
    let path = format!("/tags/{id}");
    let view = engine
        .navigate(&path, query.search.as_deref(), &nav_state(&query))
        .await;
    Ok(render(&engine, &view, path))
}

/// Live-search input payload.
#[derive(Debug, Deserialize)]
pub struct SearchForm {
    pub q: String,
}

/// Record a keystroke of search input.
///
/// Returns immediately; the engine refreshes the catalog only once the
/// input has been stable for the debounce window. The form's regular GET
/// submit (`?search=`) stays as the no-JS fallback.
#[instrument(skip_all)]
pub async fn live_search(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SearchForm>,
) -> Result<StatusCode> {
    let engine = state.engine(&session).await?;
    engine.set_search_input(&form.q);
    Ok(StatusCode::NO_CONTENT)
}

fn nav_state(query: &CatalogQuery) -> NavState {
    NavState {
        name: query.name.clone(),
    }
}

fn render(engine: &Engine, view: &View, current_path: String) -> CatalogTemplate {
    let snapshot = engine.catalog();
    let search = engine.search();
    let filters = engine.filters();

    let heading = match view {
        View::Category { name, .. } => name.clone().unwrap_or_else(|| "Категория".to_string()),
        View::Tag { id, name } => name
            .clone()
            .or_else(|| {
                snapshot
                    .tags
                    .iter()
                    .find(|t| t.id == *id)
                    .map(|t| t.name.clone())
            })
            .unwrap_or_else(|| "Метка".to_string()),
        _ => "Каталог".to_string(),
    };

    let active_tag = match view {
        View::Tag { id, .. } => Some(*id),
        _ => None,
    };

    CatalogTemplate {
        heading,
        categories: snapshot
            .categories
            .iter()
            .map(|c| CategoryLink {
                target: nav::category_target(c.id, Some(&c.name), search.as_deref()),
                name: c.name.clone(),
                image_url: c.image_url.clone(),
            })
            .collect(),
        tags: snapshot
            .tags
            .iter()
            .map(|t| TagChip {
                target: nav::tag_target(t.id, Some(&t.name), search.as_deref()),
                name: t.name.clone(),
                active: active_tag == Some(t.id),
            })
            .collect(),
        vendors: snapshot
            .vendors
            .iter()
            .map(|v| VendorOption {
                id: v.id.as_i32(),
                name: v.name.clone(),
                selected: filters.vendor_id == Some(v.id),
            })
            .collect(),
        products: snapshot.products.iter().map(ProductCardView::build).collect(),
        layout: engine.layout().as_str(),
        is_loading: snapshot.is_loading,
        amount_presets: AMOUNT_PRESETS,
        amount_preset_id: engine.amount_preset().unwrap_or_else(|| "any".to_string()),
        current_path,
        ctx: PageContext::from_engine(engine),
    }
}
