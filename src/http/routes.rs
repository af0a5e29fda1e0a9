//! Registered-route bookkeeping and reverse lookup.

use std::fmt::Display;

use axum::http::Method;
use axum::routing::MethodFilter;

use crate::http::error::Error;

/// Method label recorded for `any` routes.
pub const ANY_METHOD: &str = "*";

/// A route registered through `App` or `Group`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: String,
    pub path: String,
    /// Type name of the handler, used for reverse lookup.
    pub name: String,
}

/// Join a prefix and a route path into a single absolute path.
pub(crate) fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = normalize_path(path);
    if path == "/" && !prefix.is_empty() {
        return prefix.to_string();
    }
    format!("{prefix}{path}")
}

/// Route paths must start with `/`; an empty path means the root.
pub(crate) fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

pub(crate) fn method_filter(method: &Method) -> Result<MethodFilter, Error> {
    MethodFilter::try_from(method.clone())
        .map_err(|_| Error::internal(format!("unsupported method for routing: {method}")))
}

/// Combine several methods into one filter.
pub(crate) fn methods_filter(methods: &[Method]) -> Result<MethodFilter, Error> {
    let mut iter = methods.iter();
    let first = iter
        .next()
        .ok_or_else(|| Error::internal("at least one method is required"))?;
    iter.try_fold(method_filter(first)?, |acc, m| Ok(acc.or(method_filter(m)?)))
}

/// Fill `{name}` / `{*name}` segments of `path` with `params`, in order.
/// Segments left over when `params` runs out are kept as written.
pub fn fill_path(path: &str, params: &[&dyn Display]) -> String {
    let mut params = params.iter();
    path.split('/')
        .map(|segment| {
            if segment.starts_with('{') && segment.ends_with('}') {
                if let Some(value) = params.next() {
                    return value.to_string();
                }
            }
            segment.to_string()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Find the first route registered with handler `name` and build its URI.
pub fn reverse(routes: &[RouteInfo], name: &str, params: &[&dyn Display]) -> Option<String> {
    routes
        .iter()
        .find(|r| r.name == name)
        .map(|r| fill_path(&r.path, params))
}
