//! Panic boundary: a panicking handler becomes a minimal recovery page
//! instead of tearing down the connection.

use std::any::Any;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;

/// Static page served when a handler panics. Static markup only, so the
/// boundary itself cannot fail. The empty href reloads the current URL.
const RECOVERY_PAGE: &str = r#"<!doctype html>
<html lang="ru">
<head>
  <meta charset="utf-8">
  <title>Что-то пошло не так</title>
</head>
<body>
  <h1>Что-то пошло не так</h1>
  <p>Произошла непредвиденная ошибка.</p>
  <p><a href="">Обновить страницу</a></p>
</body>
</html>
"#;

type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

/// Panic boundary layer rendering the recovery page with a 500 status.
#[must_use]
pub fn catch_panic_layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(recovery_response as PanicHandler)
}

fn recovery_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("panic payload of unknown type");
    tracing::error!(panic = detail, "request handler panicked");

    (StatusCode::INTERNAL_SERVER_ERROR, Html(RECOVERY_PAGE)).into_response()
}
