//! Route groups.
//!
//! A [`Group`] is a builder for routes under a shared prefix with its own
//! middleware chain. It re-declares the whole registration surface of
//! [`App`](crate::http::App) by delegating to its own router, then is
//! attached with `mount`:
//!
//! ```rust,no_run
//! # use axum_plus::config::Settings;
//! # use axum_plus::http::{App, Context, Error};
//! # use axum::response::Response;
//! # async fn list(ctx: Context) -> Result<Response, Error> { ctx.json_success(None::<()>, "") }
//! # fn build() -> Result<App, Error> {
//! let app = App::new(Settings::default())?;
//! let v1 = app.group("/v1").get("/orders", list);
//! let app = app.mount(v1);
//! # Ok(app)
//! # }
//! ```

use crate::http::route_set::RouteSet;
use crate::http::routes::normalize_path;

pub struct Group {
    set: RouteSet,
}

impl Group {
    pub(crate) fn new(prefix: &str) -> Self {
        Self {
            set: RouteSet::new(&normalize_path(prefix)),
        }
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

    /// Prefix of this group relative to its parent.
    pub fn prefix(&self) -> &str {
        self.set.prefix()
    }

    pub(crate) fn into_set(self) -> RouteSet {
        self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Context, Error};
    use axum::response::Response;

    async fn noop(ctx: Context) -> Result<Response, Error> {
        ctx.json_success(None::<()>, "")
    }

    #[test]
    fn test_nested_group_prefixes() {
        let api = Group::new("/api");
        let v2 = api.group("v2").get("/items/{id}", noop);
        assert_eq!(v2.prefix(), "/v2");
        assert_eq!(v2.routes()[0].path, "/v2/items/{id}");
        assert_eq!(v2.routes()[0].method, "GET");

        let api = api.mount(v2);
        assert_eq!(api.routes().len(), 1);
        assert_eq!(api.routes()[0].path, "/api/v2/items/{id}");
    }

    #[test]
    fn test_group_paths_follow_the_parent_it_is_mounted_on() {
        let api = Group::new("/api");
        let admin = Group::new("/admin");
        let users = api.group("/users").get("/{id}", noop);

        let admin = admin.mount(users);
        assert_eq!(admin.routes()[0].path, "/admin/users/{id}");
        assert_eq!(api.routes().len(), 0);
    }

    #[test]
    fn test_root_path_in_group() {
        let group = Group::new("/health").get("", noop);
        assert_eq!(group.routes()[0].path, "/health");
    }

    #[test]
    fn test_root_group_keeps_routes_unprefixed() {
        let group = Group::new("/").get("/ping", noop);
        assert_eq!(group.prefix(), "");
        assert_eq!(group.routes()[0].path, "/ping");
    }
}
