use std::any::Any;

use axum::{
    http::{StatusCode, Uri},
    response::Response,
};

use super::{ErrorCode, error_response};

/// Fallback handler for unmatched routes.
pub async fn not_found(uri: Uri) -> Response {
    tracing::debug!(path = %uri.path(), "No route matched");
    error_response(
        StatusCode::NOT_FOUND,
        "The requested resource was not found".to_string(),
        ErrorCode::NotFound,
    )
}

/// Converts a panic caught by `CatchPanicLayer` into a generic 500 body.
///
/// The panic payload is logged and never sent to the client.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(
        error_code = ErrorCode::InternalError.code(),
        panic = %detail,
        "Request handler panicked"
    );

    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::InternalError.default_message().to_string(),
        ErrorCode::InternalError,
    )
}
