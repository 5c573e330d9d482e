//! Phone OTP login flow.
//!
//! Two-step form: the visitor submits a phone number, receives a code
//! out of band, and submits the code. The pending phone lives in the
//! browser session so a refresh keeps the visitor on the code step.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use hubcart_core::Phone;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::models::session_keys;
use crate::session::LoginOutcome;
use crate::state::{self, AppState};

use super::{PageContext, redirect_back};

/// Login page template. `pending_phone` selects the code step.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub pending_phone: Option<String>,
    pub error: Option<&'static str>,
    pub return_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub return_to: Option<String>,
}

/// Display the login form.
#[instrument(skip_all)]
pub async fn login_page(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LoginQuery>,
) -> Result<Response> {
    let engine = state.engine(&session).await?;
    if engine.user().is_some() {
        return Ok(redirect_back(query.return_to.as_deref(), "/").into_response());
    }
    let pending_phone: Option<Phone> = session.get(session_keys::PENDING_PHONE).await?;
    Ok(LoginTemplate {
        ctx: PageContext::from_engine(&engine),
        pending_phone: pending_phone.map(|p| p.as_str().to_string()),
        error: None,
        return_to: query.return_to,
    }
    .into_response())
}

/// Phone submission form data.
#[derive(Debug, Deserialize)]
pub struct PhoneForm {
    #[serde(default)]
    pub phone: String,
    pub return_to: Option<String>,
}

/// Request an OTP for a phone number and advance to the code step.
#[instrument(skip_all)]
pub async fn send_otp(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PhoneForm>,
) -> Result<Response> {
    let engine = state.engine(&session).await?;

    let Ok(phone) = Phone::new(&form.phone) else {
        return Ok(LoginTemplate {
            ctx: PageContext::from_engine(&engine),
            pending_phone: None,
            error: Some("Укажите номер телефона."),
            return_to: form.return_to,
        }
        .into_response());
    };

    if engine.send_otp(&phone).await {
        session.insert(session_keys::PENDING_PHONE, &phone).await?;
    }
    Ok(LoginTemplate {
        ctx: PageContext::from_engine(&engine),
        pending_phone: Some(phone.as_str().to_string()),
        error: None,
        return_to: form.return_to,
    }
    .into_response())
}

/// Code submission form data.
#[derive(Debug, Deserialize)]
pub struct CodeForm {
    #[serde(default)]
    pub code: String,
    pub return_to: Option<String>,
}

/// Verify the submitted OTP code.
///
/// A rejected code re-renders the code step with an inline message and
/// leaves all state untouched. Success commits the identity and sends
/// the visitor back where they came from.
#[instrument(skip_all)]
pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CodeForm>,
) -> Result<Response> {
    let engine = state.engine(&session).await?;

    let Some(phone) = session.get::<Phone>(session_keys::PENDING_PHONE).await? else {
        return Ok(Redirect::to("/auth/login").into_response());
    };

    match engine.login(&phone, form.code.trim()).await {
        LoginOutcome::LoggedIn(_) => {
            session.remove::<Phone>(session_keys::PENDING_PHONE).await?;
            state::persist(&session, &engine).await?;
            Ok(redirect_back(form.return_to.as_deref(), "/").into_response())
        }
        LoginOutcome::Rejected => Ok(LoginTemplate {
            ctx: PageContext::from_engine(&engine),
            pending_phone: Some(phone.as_str().to_string()),
            error: Some("Неверный код."),
            return_to: form.return_to,
        }
        .into_response()),
        LoginOutcome::Failed(_) => Ok(LoginTemplate {
            ctx: PageContext::from_engine(&engine),
            pending_phone: Some(phone.as_str().to_string()),
            error: Some("Не удалось выполнить вход. Попробуйте ещё раз."),
            return_to: form.return_to,
        }
        .into_response()),
    }
}

/// Sign the visitor out and send them to the home page.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let engine = state.engine(&session).await?;
    engine.logout().await;
    session.remove::<Phone>(session_keys::PENDING_PHONE).await?;
    state::persist(&session, &engine).await?;
    Ok(Redirect::to("/"))
}
