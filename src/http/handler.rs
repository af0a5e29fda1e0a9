//! Handlers written against [`Context`] and their adaptation to axum.
//!
//! ```text
//! async fn create(ctx: Context) -> Result<Response, Error> { … }   ← user writes this
//!        ↓ app.post("/users", create)
//! into_method_handler(create)                                      ← closure taking Context
//!        ↓ axum extracts Context (needs decorate_context to have run)
//! dispatch(create, ctx)
//!        ↓ Ok  → response
//!        ↓ Err → AppState::error_handler(err, meta)
//! ```
//!
//! Unmatched paths and methods go through the same error handler, via the
//! built-in [`not_found`] and [`method_not_allowed`] handlers.

use std::any::type_name;
use std::future::Future;
use std::pin::Pin;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::context::Context;
use crate::http::error::Error;

/// A boxed future resolving to a handler's result.
pub type BoxFuture = Pin<Box<dyn Future<Output = Result<Response, Error>> + Send + 'static>>;

/// Implemented for every handler that can be registered on
/// [`App`](crate::http::App) or [`Group`](crate::http::Group): any
/// `Fn(Context) -> impl Future<Output = Result<impl IntoResponse, Error>>`.
pub trait HandlerFunc: Clone + Send + Sync + 'static {
    fn call(&self, ctx: Context) -> BoxFuture;

    /// Identity used for reverse routing.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

impl<F, Fut, R> HandlerFunc for F
where
    F: Fn(Context) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, ctx: Context) -> BoxFuture {
        let fut = (self)(ctx);
        Box::pin(async move { fut.await.map(IntoResponse::into_response) })
    }
}

/// Run `handler`, sending any error through the application's error handler.
pub(crate) async fn dispatch<H: HandlerFunc>(handler: H, ctx: Context) -> Response {
    let meta = ctx.meta();
    let error_handler = ctx.state().error_handler.clone();
    match handler.call(ctx).await {
        Ok(response) => response,
        Err(err) => error_handler(err, &meta),
    }
}

/// Used when no route matches and no not-found handler was registered.
pub(crate) async fn not_found(_ctx: Context) -> Result<Response, Error> {
    Err(status_error(StatusCode::NOT_FOUND))
}

/// Used when a path matches but none of its routes accepts the method.
pub(crate) async fn method_not_allowed(_ctx: Context) -> Result<Response, Error> {
    Err(status_error(StatusCode::METHOD_NOT_ALLOWED))
}

fn status_error(status: StatusCode) -> Error {
    Error::new(status, status.canonical_reason().unwrap_or_default())
}

/// Adapt `handler` into something axum's `MethodRouter` accepts.
pub(crate) fn into_method_handler<H: HandlerFunc>(
    handler: H,
) -> impl Fn(Context) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone + Send + Sync + 'static {
    move |ctx: Context| {
        let handler = handler.clone();
        Box::pin(dispatch(handler, ctx))
    }
}
