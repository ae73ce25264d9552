//! Error types for the Observer API server.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use synapse_core::control::ControlError;

/// Errors that can occur in the Observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A control command failed validation.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// No engine is attached, or the engine task has exited.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// The engine command queue is full.
    #[error("engine busy: {0}")]
    Busy(String),
}

impl From<ControlError> for ObserverError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::Closed => Self::Unavailable("engine task has exited".to_owned()),
            ControlError::Busy => Self::Busy(ControlError::Busy.to_string()),
            ControlError::Protocol { source } => Self::InvalidCommand(source.to_string()),
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidQuery(_) | Self::InvalidCommand(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Busy(_) => StatusCode::TOO_MANY_REQUESTS,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_command_queue_maps_to_too_many_requests() {
        let err = ObserverError::from(ControlError::Busy);
        assert!(matches!(err, ObserverError::Busy(_)));
        assert_eq!(err.into_response().status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
