//! Display preference and filter handlers.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::models::ProductLayout;
use crate::session::CatalogFilters;
use crate::state::{self, AppState};

use super::redirect_back;

/// A named amount range the filter bar offers.
pub struct AmountPreset {
    pub id: &'static str,
    pub label: &'static str,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Amount ranges offered in the filter bar. "any" clears the filter.
pub const AMOUNT_PRESETS: &[AmountPreset] = &[
    AmountPreset {
        id: "any",
        label: "Любой объём",
        min: None,
        max: None,
    },
    AmountPreset {
        id: "small",
        label: "до 100",
        min: None,
        max: Some(100.0),
    },
    AmountPreset {
        id: "medium",
        label: "100-500",
        min: Some(100.0),
        max: Some(500.0),
    },
    AmountPreset {
        id: "large",
        label: "от 500",
        min: Some(500.0),
        max: None,
    },
];

fn preset_by_id(id: &str) -> Option<&'static AmountPreset> {
    AMOUNT_PRESETS.iter().find(|p| p.id == id)
}

/// Layout toggle form data.
#[derive(Debug, Deserialize)]
pub struct LayoutForm {
    pub layout: String,
    pub return_to: Option<String>,
}

/// Switch between grid and list product layout.
#[instrument(skip_all)]
pub async fn set_layout(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LayoutForm>,
) -> Result<Redirect> {
    let engine = state.engine(&session).await?;
    engine.set_layout(ProductLayout::from_form_value(&form.layout));
    state::persist(&session, &engine).await?;
    Ok(redirect_back(form.return_to.as_deref(), "/"))
}

/// Filter bar form data. The vendor select submits an empty string for
/// "all vendors".
#[derive(Debug, Deserialize)]
pub struct FiltersForm {
    #[serde(default)]
    pub vendor_id: String,
    #[serde(default)]
    pub amount_preset: String,
    pub return_to: Option<String>,
}

/// Apply vendor and amount filters to the product list.
#[instrument(skip_all)]
pub async fn set_filters(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<FiltersForm>,
) -> Result<Redirect> {
    let engine = state.engine(&session).await?;

    let preset = preset_by_id(&form.amount_preset);
    engine.set_amount_preset(preset.and_then(|p| {
        if p.id == "any" {
            None
        } else {
            Some(p.id.to_string())
        }
    }));

    let vendor_id = form
        .vendor_id
        .parse::<i32>()
        .ok()
        .map(hubcart_core::VendorId::new);
    engine
        .set_filters(CatalogFilters {
            vendor_id,
            min_amount: preset.and_then(|p| p.min),
            max_amount: preset.and_then(|p| p.max),
        })
        .await;

    state::persist(&session, &engine).await?;
    Ok(redirect_back(form.return_to.as_deref(), "/"))
}

/// Dismiss form data.
#[derive(Debug, Deserialize)]
pub struct DismissForm {
    pub return_to: Option<String>,
}

/// Dismiss a toast before it expires. Unknown ids are a no-op.
#[instrument(skip_all)]
pub async fn dismiss_toast(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Form(form): Form<DismissForm>,
) -> Result<impl IntoResponse> {
    let engine = state.engine(&session).await?;
    engine.dismiss_toast(id);
    Ok(redirect_back(form.return_to.as_deref(), "/"))
}
