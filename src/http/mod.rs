//! HTTP layer: the decorated context, the application and group wrappers,
//! and the default middleware stack.
//!
//! # Data Flow
//! ```text
//! incoming request
//!     → SetRequestIdLayer / PropagateRequestIdLayer (request_id.rs)
//!     → decorate_context (middleware.rs, inserts AppState)
//!     → access_log (middleware.rs, logged after the response)
//!     → user layers (App::use_layer, Group::use_layer)
//!     → handler(Context) (handler.rs adapts it to axum)
//!     → Ok: response / Err: AppState error handler (app.rs)
//! ```

/// Per-verb registration methods shared by `App` and `Group`.
///
/// The including type must have a `set: RouteSet` field.
macro_rules! verb_methods {
    ($($(#[$doc:meta])* $name:ident => $filter:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name<H: $crate::http::HandlerFunc>(mut self, path: &str, handler: H) -> Self {
                self.set.on(
                    ::axum::routing::MethodFilter::$filter,
                    stringify!($filter),
                    path,
                    handler,
                );
                self
            }
        )*

        /// Register `handler` for every method on `path`.
        pub fn any<H: $crate::http::HandlerFunc>(mut self, path: &str, handler: H) -> Self {
            self.set.any(path, handler);
            self
        }

        /// Register `handler` for each of `methods` on `path`.
        pub fn match_methods<H: $crate::http::HandlerFunc>(
            mut self,
            methods: &[::axum::http::Method],
            path: &str,
            handler: H,
        ) -> Result<Self, $crate::http::Error> {
            let filter = $crate::http::routes::methods_filter(methods)?;
            let label = methods
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(",");
            self.set.on(filter, &label, path, handler);
            Ok(self)
        }

        /// Register `handler` for a single `method` on `path`.
        pub fn add<H: $crate::http::HandlerFunc>(
            mut self,
            method: ::axum::http::Method,
            path: &str,
            handler: H,
        ) -> Result<Self, $crate::http::Error> {
            let filter = $crate::http::routes::method_filter(&method)?;
            self.set.on(filter, method.as_str(), path, handler);
            Ok(self)
        }

        /// Register `handler` with route-level middleware `layer`.
        pub fn route_with<H, L>(
            mut self,
            method: ::axum::http::Method,
            path: &str,
            handler: H,
            layer: L,
        ) -> Result<Self, $crate::http::Error>
        where
            H: $crate::http::HandlerFunc,
            L: ::tower::Layer<::axum::routing::Route> + Clone + Send + Sync + 'static,
            L::Service: ::tower::Service<::axum::extract::Request> + Clone + Send + Sync + 'static,
            <L::Service as ::tower::Service<::axum::extract::Request>>::Response:
                ::axum::response::IntoResponse + 'static,
            <L::Service as ::tower::Service<::axum::extract::Request>>::Error:
                Into<::std::convert::Infallible> + 'static,
            <L::Service as ::tower::Service<::axum::extract::Request>>::Future: Send + 'static,
        {
            let filter = $crate::http::routes::method_filter(&method)?;
            self.set.on_layered(filter, method.as_str(), path, handler, layer);
            Ok(self)
        }

        /// Middleware wrapping every route registered on this value. The
        /// first layer added runs first.
        pub fn use_layer<L>(mut self, layer: L) -> Self
        where
            L: ::tower::Layer<::axum::routing::Route> + Clone + Send + Sync + 'static,
            L::Service: ::tower::Service<::axum::extract::Request> + Clone + Send + Sync + 'static,
            <L::Service as ::tower::Service<::axum::extract::Request>>::Response:
                ::axum::response::IntoResponse + 'static,
            <L::Service as ::tower::Service<::axum::extract::Request>>::Error:
                Into<::std::convert::Infallible> + 'static,
            <L::Service as ::tower::Service<::axum::extract::Request>>::Future: Send + 'static,
        {
            self.set.push_layer(layer);
            self
        }

        /// Handler for requests that match no route under this prefix.
        pub fn route_not_found<H: $crate::http::HandlerFunc>(mut self, handler: H) -> Self {
            self.set.fallback(handler);
            self
        }

        /// Serve files under `root` at `prefix`.
        pub fn static_dir(mut self, prefix: &str, root: impl AsRef<::std::path::Path>) -> Self {
            self.set.static_dir(prefix, root);
            self
        }

        /// Serve a single file at `path`.
        pub fn file(mut self, path: &str, file: impl AsRef<::std::path::Path>) -> Self {
            self.set.file(path, file);
            self
        }

        /// Create a sub-group under `prefix`; attach it with `mount`. The
        /// group's routes take the prefix of whatever it is mounted on.
        pub fn group(&self, prefix: &str) -> $crate::http::Group {
            $crate::http::Group::new(prefix)
        }

        /// Attach a group built with [`group`](Self::group).
        pub fn mount(mut self, group: $crate::http::Group) -> Self {
            self.set.mount(group.into_set());
            self
        }

        /// Every route registered so far. Paths are absolute on `App`; on a
        /// `Group` they are relative to the group's parent until it is
        /// mounted.
        pub fn routes(&self) -> &[$crate::http::RouteInfo] {
            self.set.routes()
        }
    };
}

pub mod app;
pub mod context;
pub mod envelope;
pub mod error;
pub mod group;
pub mod handler;
pub mod middleware;
pub mod request_id;
pub(crate) mod route_set;
pub mod routes;
pub mod state;
pub mod validator;

pub use app::{default_http_error_handler, App};
pub use context::Context;
pub use envelope::{Code, Envelope};
pub use error::Error;
pub use group::Group;
pub use handler::HandlerFunc;
pub use middleware::{access_level, Exchange};
pub use request_id::{get_request_id, MakeRequestHexId, X_REQUEST_ID};
pub use route_set::ROUTE_NOT_FOUND;
pub use routes::RouteInfo;
pub use state::{AppState, ErrorHandler, RequestMeta};
pub use validator::Validator;
