//! The decorated per-request context.
//!
//! [`Context`] is an axum extractor. It can only be built for requests that
//! went through the `decorate_context` middleware, which every
//! [`App`](crate::http::App) installs, so handlers registered through `App`
//! or [`Group`](crate::http::Group) always receive one.

use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, OriginalUri, RawPathParams, Request};
use axum::http::request::Parts;
use axum::http::{header, Extensions, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::de::DeserializeOwned;
use serde::Serialize;
use validator::Validate;

use crate::config::Settings;
use crate::http::envelope::{Code, Envelope};
use crate::http::error::{Error, Result};
use crate::http::request_id::get_request_id;
use crate::http::state::{AppState, RequestMeta};
use crate::observability::{facade, Correlated, Field};

/// Methods whose empty-bodied requests bind from the query string.
const QUERY_BIND_METHODS: [Method; 3] = [Method::GET, Method::HEAD, Method::DELETE];

/// Request context handed to handlers registered through `App` / `Group`.
pub struct Context {
    parts: Parts,
    body: Option<Body>,
    params: Vec<(String, String)>,
    state: AppState,
}

impl<S> FromRequest<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let (mut parts, body) = req.into_parts();
        let app = parts
            .extensions
            .get::<AppState>()
            .cloned()
            .ok_or(Error::ContextMissing)?;

        // Nested groups see a prefix-stripped URI; handlers get the full one.
        if let Some(OriginalUri(original)) = parts.extensions.get::<OriginalUri>().cloned() {
            parts.uri = original;
        }

        let params = match RawPathParams::from_request_parts(&mut parts, state).await {
            Ok(raw) => raw
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            Err(_) => Vec::new(),
        };

        Ok(Self {
            parts,
            body: Some(body),
            params,
            state: app,
        })
    }
}

impl Correlated for Context {
    fn correlation_id(&self) -> String {
        self.request_id()
    }
}

impl Context {
    // ---- JSON envelope ----

    /// Write `envelope` as the JSON body with transport status `status`.
    pub fn json<D: Serialize>(&self, status: StatusCode, envelope: Envelope<D>) -> Result<Response> {
        let body = serde_json::to_vec(&envelope)?;
        Ok((
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            body,
        )
            .into_response())
    }

    /// 200 with the configured success code. An empty `msg` uses the
    /// configured success message.
    pub fn json_success<D: Serialize>(&self, data: Option<D>, msg: &str) -> Result<Response> {
        let code = self.state.settings.response.success_code.clone();
        self.json_success_with_code(code, data, msg)
    }

    /// 200 with the configured fail code. An empty `msg` uses the configured
    /// fail message.
    pub fn json_fail<D: Serialize>(&self, data: Option<D>, msg: &str) -> Result<Response> {
        let code = self.state.settings.response.fail_code.clone();
        self.json_fail_with_code(code, data, msg)
    }

    pub fn json_success_with_code<D: Serialize>(
        &self,
        code: impl Into<Code>,
        data: Option<D>,
        msg: &str,
    ) -> Result<Response> {
        let msg = or_default(msg, &self.state.settings.response.success_message);
        self.json(StatusCode::OK, Envelope::new(code, msg, data))
    }

    pub fn json_fail_with_code<D: Serialize>(
        &self,
        code: impl Into<Code>,
        data: Option<D>,
        msg: &str,
    ) -> Result<Response> {
        let msg = or_default(msg, &self.state.settings.response.fail_message);
        self.json(StatusCode::OK, Envelope::new(code, msg, data))
    }

    // ---- binding and validation ----

    /// Deserialize the request into `T`.
    ///
    /// A non-empty body is decoded by content type (JSON or URL-encoded
    /// form). An empty body binds from the query string for GET, HEAD and
    /// DELETE. The body can only be read once; one larger than
    /// `server.body_limit` is rejected with 413.
    pub async fn bind<T: DeserializeOwned>(&mut self) -> Result<T> {
        let body = self.body.take().ok_or(Error::BodyConsumed)?;
        let limit = self.state.settings.server.body_limit;
        let bytes = match Limited::new(body, limit).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.is::<LengthLimitError>() => {
                return Err(Error::new(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!("request body exceeds {limit} bytes"),
                ))
            }
            Err(e) => return Err(Error::bad_request(format!("failed to read request body: {e}"))),
        };

        if bytes.is_empty() {
            if QUERY_BIND_METHODS.contains(&self.parts.method) {
                let query = self.parts.uri.query().unwrap_or_default();
                return serde_urlencoded::from_str(query)
                    .map_err(|e| Error::bad_request(format!("invalid query: {e}")));
            }
            return Err(Error::bad_request("request body can't be empty"));
        }

        let content_type = self
            .header(header::CONTENT_TYPE.as_str())
            .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
            .unwrap_or_default();

        if content_type == "application/json" || content_type.ends_with("+json") {
            serde_json::from_slice(&bytes).map_err(|e| Error::bad_request(format!("invalid JSON body: {e}")))
        } else if content_type == "application/x-www-form-urlencoded" {
            serde_urlencoded::from_bytes(&bytes)
                .map_err(|e| Error::bad_request(format!("invalid form body: {e}")))
        } else {
            Err(Error::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported Media Type",
            ))
        }
    }

    /// Run the application's validator over `payload`.
    pub fn validate<T: Validate>(&self, payload: &T) -> Result<()> {
        self.state.validator.validate(payload)
    }

    /// [`bind`](Self::bind) then [`validate`](Self::validate). A binding
    /// failure is returned as is; validation is not attempted.
    pub async fn bind_and_validate<T: DeserializeOwned + Validate>(&mut self) -> Result<T> {
        let payload = self.bind::<T>().await?;
        self.validate(&payload)?;
        Ok(payload)
    }

    // ---- logging ----

    pub fn log_info(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        facade::log_info_with_context(self, msg, fields);
    }

    pub fn log_warn(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        facade::log_warn_with_context(self, msg, fields);
    }

    pub fn log_error(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        facade::log_error_with_context(self, msg, fields);
    }

    pub fn log_debug(&self, msg: &str, fields: impl IntoIterator<Item = Field>) {
        facade::log_debug_with_context(self, msg, fields);
    }

    // ---- request accessors ----

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Path parameter captured by the matched route, e.g. `id` in
    /// `/users/{id}`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// First value of query parameter `name`.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.parts.uri.query()?;
        serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .ok()?
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then
    /// the peer address when the server was started with connect info.
    pub fn real_ip(&self) -> Option<IpAddr> {
        real_ip(&self.parts.headers, &self.parts.extensions)
    }

    pub fn request_id(&self) -> String {
        get_request_id(&self.parts.headers, None, &self.state.request_id_header)
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    /// Snapshot used when this request's handler fails.
    pub fn meta(&self) -> RequestMeta {
        RequestMeta {
            method: self.parts.method.clone(),
            uri: self.parts.uri.clone(),
            request_id: self.request_id(),
        }
    }

    pub(crate) fn state(&self) -> &AppState {
        &self.state
    }
}

fn or_default<'a>(msg: &'a str, default: &'a str) -> &'a str {
    if msg.is_empty() {
        default
    } else {
        msg
    }
}

pub(crate) fn real_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for")
        .or_else(|| header_ip("x-real-ip"))
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::state::ErrorHandler;
    use axum::http::Request as HttpRequest;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn state(settings: Settings) -> AppState {
        let handler: ErrorHandler = Arc::new(|err, _| err.into_response());
        AppState::new(settings, handler).unwrap()
    }

    async fn context_with(settings: Settings, req: Request) -> Context {
        let (mut parts, body) = req.into_parts();
        parts.extensions.insert(state(settings));
        Context::from_request(Request::from_parts(parts, body), &()).await.unwrap()
    }

    async fn context(req: Request) -> Context {
        context_with(Settings::default(), req).await
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Search {
        q: String,
        page: Option<u32>,
    }

    #[tokio::test]
    async fn test_undecorated_request_is_rejected() {
        let req = Request::new(Body::empty());
        let err = Context::from_request(req, &()).await.err().unwrap();
        assert!(matches!(err, Error::ContextMissing));
    }

    #[tokio::test]
    async fn test_success_defaults() {
        let ctx = context(Request::new(Body::empty())).await;
        let resp = ctx.json_success(Some(json!({"id": 7})), "").unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({"code": 0, "message": "ok", "data": {"id": 7}})
        );
    }

    #[tokio::test]
    async fn test_fail_defaults_without_data() {
        let ctx = context(Request::new(Body::empty())).await;
        let resp = ctx.json_fail(None::<()>, "").unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"code": 1, "message": "fail"}));
    }

    #[tokio::test]
    async fn test_raw_json_keeps_transport_status() {
        let ctx = context(Request::new(Body::empty())).await;
        let resp = ctx
            .json(StatusCode::ACCEPTED, Envelope::new("QUEUED", "queued", None::<()>))
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_bind_form_body() {
        let req = HttpRequest::post("/search")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("q=rust&page=2"))
            .unwrap();
        let mut ctx = context(req).await;
        let search: Search = ctx.bind().await.unwrap();
        assert_eq!(search, Search { q: "rust".into(), page: Some(2) });
    }

    #[tokio::test]
    async fn test_bind_query_for_get() {
        let req = HttpRequest::get("/search?q=axum").body(Body::empty()).unwrap();
        let mut ctx = context(req).await;
        let search: Search = ctx.bind().await.unwrap();
        assert_eq!(search, Search { q: "axum".into(), page: None });
        assert_eq!(ctx.query_param("q").as_deref(), Some("axum"));
    }

    #[tokio::test]
    async fn test_bind_rejects_unknown_media_type() {
        let req = HttpRequest::post("/search")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("q=rust"))
            .unwrap();
        let mut ctx = context(req).await;
        let err = ctx.bind::<Search>().await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_body_is_read_once() {
        let req = HttpRequest::post("/search")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"q":"x"}"#))
            .unwrap();
        let mut ctx = context(req).await;
        ctx.bind::<Search>().await.unwrap();
        assert!(matches!(ctx.bind::<Search>().await, Err(Error::BodyConsumed)));
    }

    #[tokio::test]
    async fn test_oversized_body_is_payload_too_large() {
        let mut settings = Settings::default();
        settings.server.body_limit = 16;
        let req = HttpRequest::post("/search")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"q":"a query well past sixteen bytes"}"#))
            .unwrap();
        let mut ctx = context_with(settings, req).await;
        let err = ctx.bind::<Search>().await.unwrap_err();
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_empty_post_body_is_bad_request() {
        let req = HttpRequest::post("/search").body(Body::empty()).unwrap();
        let mut ctx = context(req).await;
        let err = ctx.bind::<Search>().await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_real_ip_prefers_forwarded_header() {
        let req = HttpRequest::get("/")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .header("x-real-ip", "198.51.100.4")
            .body(Body::empty())
            .unwrap();
        let ctx = context(req).await;
        assert_eq!(ctx.real_ip(), Some("203.0.113.9".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_request_id_from_configured_header() {
        let req = HttpRequest::get("/")
            .header("x-request-id", "abc123")
            .body(Body::empty())
            .unwrap();
        let ctx = context(req).await;
        assert_eq!(ctx.request_id(), "abc123");
        assert_eq!(ctx.meta().request_id, "abc123");
    }
}
