//! State shared by every request handled through an [`App`](crate::http::App).

use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderName, Method, Uri};
use axum::response::Response;

use crate::config::Settings;
use crate::http::error::Error;
use crate::http::validator::Validator;
use crate::observability::Correlated;

/// Renders a handler error into a response.
pub type ErrorHandler = Arc<dyn Fn(Error, &RequestMeta) -> Response + Send + Sync>;

/// Immutable per-application state, carried into each request's extensions.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub request_id_header: HeaderName,
    pub validator: Validator,
    pub(crate) error_handler: ErrorHandler,
}

impl AppState {
    pub(crate) fn new(settings: Settings, error_handler: ErrorHandler) -> Result<Self, Error> {
        let request_id_header = HeaderName::from_bytes(settings.request_id.header.as_bytes())
            .map_err(Error::internal)?;
        Ok(Self {
            settings: Arc::new(settings),
            request_id_header,
            validator: Validator::new(),
            error_handler,
        })
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings)
            .field("request_id_header", &self.request_id_header)
            .finish_non_exhaustive()
    }
}

/// What the error handler knows about the failed request.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub method: Method,
    pub uri: Uri,
    pub request_id: String,
}

impl Correlated for RequestMeta {
    fn correlation_id(&self) -> String {
        self.request_id.clone()
    }
}
