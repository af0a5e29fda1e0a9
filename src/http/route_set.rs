//! The router-plus-bookkeeping core shared by `App` and `Group`.
//!
//! Route records are kept relative to the set's parent: a set records its own
//! prefix in front of each path, and `mount` adds the parent's prefix when
//! the child is attached. The not-found handler is held back until `finish`,
//! so merging two sets at the same prefix never sees two axum fallbacks.

use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::IntoResponse;
use axum::routing::{self, MethodFilter, Route};
use axum::Router;
use tower::{Layer, Service};
use tower_http::services::{ServeDir, ServeFile};

use crate::http::handler::{into_method_handler, method_not_allowed, HandlerFunc};
use crate::http::routes::{join_path, normalize_path, RouteInfo, ANY_METHOD};

/// Method label recorded for the not-found handler.
pub const ROUTE_NOT_FOUND: &str = "route_not_found";

type LayerFn = Arc<dyn Fn(Router) -> Router + Send + Sync>;
type FallbackFn = Box<dyn FnOnce(Router) -> Router + Send>;

pub(crate) struct RouteSet {
    /// Prefix of this set relative to its parent.
    prefix: String,
    router: Router,
    routes: Vec<RouteInfo>,
    layers: Vec<LayerFn>,
    fallback: Option<FallbackFn>,
}

impl RouteSet {
    pub(crate) fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
            router: Router::new(),
            routes: Vec::new(),
            layers: Vec::new(),
            fallback: None,
        }
    }

    pub(crate) fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    pub(crate) fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    fn record(&mut self, method: &str, path: &str, name: &str) {
        self.routes.push(RouteInfo {
            method: method.to_string(),
            path: join_path(&self.prefix, path),
            name: name.to_string(),
        });
    }

    pub(crate) fn on<H: HandlerFunc>(&mut self, filter: MethodFilter, label: &str, path: &str, handler: H) {
        let path = normalize_path(path);
        self.record(label, &path, handler.name());
        let router = std::mem::take(&mut self.router);
        self.router = router.route(&path, routing::on(filter, into_method_handler(handler)));
    }

    pub(crate) fn any<H: HandlerFunc>(&mut self, path: &str, handler: H) {
        let path = normalize_path(path);
        self.record(ANY_METHOD, &path, handler.name());
        let router = std::mem::take(&mut self.router);
        self.router = router.route(&path, routing::any(into_method_handler(handler)));
    }

    pub(crate) fn on_layered<H, L>(&mut self, filter: MethodFilter, label: &str, path: &str, handler: H, layer: L)
    where
        H: HandlerFunc,
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        let path = normalize_path(path);
        self.record(label, &path, handler.name());
        let method_router = routing::on(filter, into_method_handler(handler))
            .fallback(into_method_handler(method_not_allowed))
            .layer(layer);
        let router = std::mem::take(&mut self.router);
        self.router = router.route(&path, method_router);
    }

    /// Record and install the not-found handler. A later call replaces it.
    pub(crate) fn fallback<H: HandlerFunc>(&mut self, handler: H) {
        self.record(ROUTE_NOT_FOUND, "/{*path}", handler.name());
        self.set_fallback(handler);
    }

    /// Install the not-found handler without recording a route.
    pub(crate) fn set_fallback<H: HandlerFunc>(&mut self, handler: H) {
        self.fallback = Some(Box::new(move |router: Router| {
            router.fallback(into_method_handler(handler))
        }));
    }

    pub(crate) fn push_layer<L>(&mut self, layer: L)
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.layers
            .push(Arc::new(move |router: Router| router.layer(layer.clone())));
    }

    pub(crate) fn static_dir(&mut self, prefix: &str, root: impl AsRef<Path>) {
        let prefix = normalize_path(prefix);
        self.record("GET", &join_path(&prefix, "/{*path}"), "tower_http::services::ServeDir");
        let service = ServeDir::new(root);
        if prefix == "/" {
            self.fallback = Some(Box::new(move |router: Router| router.fallback_service(service)));
        } else {
            let router = std::mem::take(&mut self.router);
            self.router = router.nest_service(prefix.trim_end_matches('/'), service);
        }
    }

    pub(crate) fn file(&mut self, path: &str, file: impl AsRef<Path>) {
        let path = normalize_path(path);
        self.record("GET", &path, "tower_http::services::ServeFile");
        let router = std::mem::take(&mut self.router);
        self.router = router.route_service(&path, ServeFile::new(file));
    }

    /// Attach a child set. Its routes are nested under the child's prefix;
    /// a child at the root is merged, and its not-found handler (wrapped in
    /// the child's layers) replaces this set's.
    pub(crate) fn mount(&mut self, child: RouteSet) {
        let prefix = self.prefix.clone();
        self.routes.extend(child.routes.iter().map(|route| RouteInfo {
            path: join_path(&prefix, &route.path),
            ..route.clone()
        }));

        let local = child.prefix.clone();
        let router = std::mem::take(&mut self.router);
        self.router = if local.is_empty() {
            let mut child = child;
            if let Some(fallback) = child.take_fallback_router() {
                self.fallback = Some(Box::new(move |router: Router| router.fallback_service(fallback)));
            }
            router.merge(child.finish())
        } else {
            router.nest(&local, child.finish())
        };
    }

    /// Detach the not-found handler as a router of its own, wrapped in this
    /// set's layers.
    fn take_fallback_router(&mut self) -> Option<Router> {
        let apply = self.fallback.take()?;
        Some(self.apply_layers(apply(Router::new())))
    }

    fn apply_layers(&self, mut router: Router) -> Router {
        for layer in self.layers.iter().rev() {
            router = layer(router);
        }
        router
    }

    /// The router with the not-found handler, the 405 handler and this
    /// set's layers applied; the first layer added is the outermost.
    pub(crate) fn finish(mut self) -> Router {
        let mut router = std::mem::take(&mut self.router);
        if let Some(apply) = self.fallback.take() {
            router = apply(router);
        }
        let router = router.method_not_allowed_fallback(into_method_handler(method_not_allowed));
        self.apply_layers(router)
    }
}
