//! Handler error type and the default error renderer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors returned from handlers and the [`Context`](crate::http::Context)
/// helpers.
#[derive(Debug, Error)]
pub enum Error {
    /// An error that maps directly onto an HTTP status, like a bad request.
    #[error("code={}, message={message}", .status.as_u16())]
    Http { status: StatusCode, message: String },

    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The request did not pass through the context middleware.
    #[error("request context is not decorated; register handlers through App or Group")]
    ContextMissing,

    #[error("request body already consumed")]
    BodyConsumed,

    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Error::Http {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Internal(err.into())
    }

    /// Transport status this error renders with.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Http { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Non-HTTP errors are not leaked.
    pub fn public_message(&self) -> String {
        match self {
            Error::Http { message, .. } => message.clone(),
            _ => StatusCode::INTERNAL_SERVER_ERROR
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.public_message() }))).into_response()
    }
}
