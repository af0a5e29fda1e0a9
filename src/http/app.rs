//! The application wrapper.
//!
//! # Responsibilities
//! - Hold the axum `Router` and the shared `AppState`
//! - Register `Context` handlers per HTTP verb
//! - Install the default middleware stack (request id, context, access log)
//! - Render handler errors through a replaceable error handler
//! - Serve with graceful shutdown

use std::fmt::Display;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};

use crate::config::Settings;
use crate::http::error::Error;
use crate::http::handler::{not_found, HandlerFunc};
use crate::http::middleware::{access_log, decorate_context};
use crate::http::request_id::MakeRequestHexId;
use crate::http::route_set::RouteSet;
use crate::http::routes::reverse;
use crate::http::state::{AppState, RequestMeta};
use crate::observability::{facade, Field};

/// Application wrapper around an axum [`Router`].
///
/// ```rust,no_run
/// use axum_plus::config::Settings;
/// use axum_plus::http::{App, Context, Error};
/// use axum::response::Response;
///
/// async fn hello(ctx: Context) -> Result<Response, Error> {
///     ctx.json_success(Some("hello"), "")
/// }
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let app = App::new(Settings::default())?.get("/hello", hello);
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
/// app.serve(listener).await?;
/// # Ok(())
/// # }
/// ```
pub struct App {
    set: RouteSet,
    state: AppState,
}

impl App {
    /// Create an application with the default middleware stack and error
    /// handler.
    pub fn new(settings: Settings) -> Result<Self, Error> {
        let state = AppState::new(settings, Arc::new(default_http_error_handler))?;
        Ok(Self {
            set: RouteSet::new(""),
            state,
        })
    }

    verb_methods! {
        connect => CONNECT,
        delete => DELETE,
        get => GET,
        head => HEAD,
        options => OPTIONS,
        patch => PATCH,
        post => POST,
        put => PUT,
        trace => TRACE,
    }

    /// Replace the handler that turns handler errors into responses.
    pub fn http_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(Error, &RequestMeta) -> Response + Send + Sync + 'static,
    {
        self.state.error_handler = Arc::new(handler);
        self
    }

    /// Path of the first route registered with `handler`, with `{..}`
    /// segments filled from `params` in order.
    pub fn uri<H: HandlerFunc>(&self, handler: &H, params: &[&dyn Display]) -> Option<String> {
        reverse(self.set.routes(), handler.name(), params)
    }

    /// Alias of [`uri`](Self::uri).
    pub fn url<H: HandlerFunc>(&self, handler: &H, params: &[&dyn Display]) -> Option<String> {
        self.uri(handler, params)
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the final router with the default middleware stack around every
    /// route. From the outside in: request id assignment, request id
    /// propagation to the response, context decoration, access log.
    ///
    /// Without a [`route_not_found`](Self::route_not_found) handler, unmatched
    /// paths become a 404 [`Error`] rendered by the error handler.
    pub fn into_router(self) -> Router {
        let header = self.state.request_id_header.clone();
        let mut set = self.set;
        if !set.has_fallback() {
            set.set_fallback(not_found);
        }
        set.finish()
            .layer(axum::middleware::from_fn(access_log))
            .layer(axum::middleware::from_fn_with_state(self.state, decorate_context))
            .layer(PropagateRequestIdLayer::new(header.clone()))
            .layer(SetRequestIdLayer::new(header, MakeRequestHexId))
    }

    /// Serve until Ctrl+C.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        self.serve_with_shutdown(listener, shutdown_signal()).await
    }

    /// Serve until `signal` resolves, then drain in-flight requests.
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        facade::log_info("HTTP server starting", [Field::display("address", &addr)]);

        let app = self.into_router().into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app).with_graceful_shutdown(signal).await?;

        facade::log_info("HTTP server stopped", []);
        Ok(())
    }
}

/// Log the error with the request's correlation id, then render it as
/// `{"message": ..}` with the error's status. HEAD responses carry no body.
pub fn default_http_error_handler(err: Error, meta: &RequestMeta) -> Response {
    facade::log_error_with_context(
        meta,
        "http error handler",
        [
            Field::error(&err),
            Field::new("method", meta.method.as_str().to_string()),
            Field::new("uri", meta.uri.to_string()),
        ],
    );

    let mut response = err.into_response();
    if meta.method == Method::HEAD {
        *response.body_mut() = Body::empty();
    }
    response
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        facade::log_error("failed to install Ctrl+C handler", [Field::error(&e)]);
        std::future::pending::<()>().await;
    }
    facade::log_info("Shutdown signal received", []);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{StatusCode, Uri};

    fn meta(method: Method) -> RequestMeta {
        RequestMeta {
            method,
            uri: Uri::from_static("/orders/9"),
            request_id: "rid-1".into(),
        }
    }

    #[tokio::test]
    async fn test_default_error_handler_renders_status_and_message() {
        let resp = default_http_error_handler(Error::not_found("order 9 not found"), &meta(Method::GET));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"message":"order 9 not found"}"#);
    }

    #[tokio::test]
    async fn test_default_error_handler_drops_body_for_head() {
        let resp = default_http_error_handler(Error::internal("boom"), &meta(Method::HEAD));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_invalid_request_id_header_is_rejected() {
        let mut settings = Settings::default();
        settings.request_id.header = "not a header".into();
        assert!(App::new(settings).is_err());
    }
}
