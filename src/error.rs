use axum::http::StatusCode;
use tracing::error;

/// Log the real error, answer with a generic 500. Handlers use this for
/// anything that is not the caller's fault.
pub(crate) fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error".to_string(),
    )
}
