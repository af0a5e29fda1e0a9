//! Default middleware installed by [`App`](crate::http::App).

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Level;

use crate::http::context::real_ip;
use crate::http::request_id::get_request_id;
use crate::http::state::AppState;
use crate::observability::{facade, Correlated, Field};

/// Makes the shared [`AppState`] available to the `Context` extractor.
pub async fn decorate_context(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    req.extensions_mut().insert(state);
    next.run(req).await
}

/// Severity of the access log line for a response status.
pub fn access_level(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::ERROR
    } else if status.is_client_error() {
        Level::WARN
    } else {
        Level::INFO
    }
}

/// Request and response headers of one exchange, as a correlation source.
pub struct Exchange<'a> {
    pub request: &'a HeaderMap,
    pub response: Option<&'a HeaderMap>,
    pub header: &'a HeaderName,
}

impl Correlated for Exchange<'_> {
    fn correlation_id(&self) -> String {
        get_request_id(self.request, self.response, self.header)
    }
}

/// One line per request, logged after the response is produced.
pub async fn access_log(req: Request, next: Next) -> Response {
    let Some(state) = req.extensions().get::<AppState>().cloned() else {
        return next.run(req).await;
    };

    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let request_headers = req.headers().clone();
    let remote_ip = real_ip(req.headers(), req.extensions());
    let host = request_headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.host().map(str::to_string))
        .unwrap_or_default();

    let response = next.run(req).await;
    let latency = start.elapsed();
    let status = response.status();

    let select = &state.settings.request_logger;
    let mut fields = Vec::new();
    if select.log_uri {
        fields.push(Field::new("uri", uri.to_string()));
    }
    if select.log_method {
        fields.push(Field::new("method", method.as_str().to_string()));
    }
    if select.log_status {
        fields.push(Field::new("status", status.as_u16()));
    }
    if select.log_remote_ip {
        fields.push(Field::new(
            "remote_ip",
            remote_ip.map(|ip| ip.to_string()).unwrap_or_default(),
        ));
    }
    if select.log_host {
        fields.push(Field::new("host", host));
    }
    if select.log_latency {
        fields.push(Field::debug("latency", &latency));
    }

    let exchange = Exchange {
        request: &request_headers,
        response: Some(response.headers()),
        header: &state.request_id_header,
    };
    facade::log_at(access_level(status), Some(&exchange), "request", fields);

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_access_level_by_status_band() {
        assert_eq!(access_level(StatusCode::OK), Level::INFO);
        assert_eq!(access_level(StatusCode::FOUND), Level::INFO);
        assert_eq!(access_level(StatusCode::NOT_FOUND), Level::WARN);
        assert_eq!(access_level(StatusCode::TOO_MANY_REQUESTS), Level::WARN);
        assert_eq!(access_level(StatusCode::INTERNAL_SERVER_ERROR), Level::ERROR);
        assert_eq!(access_level(StatusCode::BAD_GATEWAY), Level::ERROR);
    }

    #[test]
    fn test_exchange_reads_response_when_request_lacks_id() {
        let name = HeaderName::from_static("x-request-id");
        let request = HeaderMap::new();
        let mut response = HeaderMap::new();
        response.insert(name.clone(), HeaderValue::from_static("resp-9"));

        let exchange = Exchange {
            request: &request,
            response: Some(&response),
            header: &name,
        };
        assert_eq!(exchange.correlation_id(), "resp-9");
    }
}
