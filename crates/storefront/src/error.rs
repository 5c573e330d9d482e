//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding. All route handlers return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::hub::HubError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Hub API operation failed.
    #[error("Hub error: {0}")]
    Hub(#[from] HubError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Hub(_) | Self::Session(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Hub(HubError::Validation(_)) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Hub(_) => StatusCode::BAD_GATEWAY,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Hub(HubError::Validation(message)) => message.clone(),
            Self::Hub(_) => "Сервис временно недоступен.".to_string(),
            Self::Session(_) | Self::Internal(_) => "Внутренняя ошибка сервера.".to_string(),
            Self::NotFound(_) => "Страница не найдена.".to_string(),
            Self::BadRequest(message) => message.clone(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_is_bad_request() {
        let response = AppError::Hub(HubError::Validation("нет".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_transport_error_is_bad_gateway() {
        let err = AppError::Hub(HubError::Status {
            status: 500,
            body: "boom".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_not_found() {
        let err = AppError::NotFound("product 9".to_string());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
