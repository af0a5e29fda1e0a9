//! Correlation id generation and lookup.

use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Default correlation header.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates ids as 32 lowercase hex digits (a v4 uuid without dashes).
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestHexId;

impl MakeRequestId for MakeRequestHexId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().simple().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Look up the correlation id: the request header wins, the response header
/// is used only when the request header is missing or empty.
pub fn get_request_id(
    request: &HeaderMap,
    response: Option<&HeaderMap>,
    header: &HeaderName,
) -> String {
    let read = |headers: &HeaderMap| {
        headers
            .get(header)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };

    let id = read(request);
    if !id.is_empty() {
        return id;
    }
    response.map(read).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(X_REQUEST_ID, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn test_request_header_wins() {
        let name = HeaderName::from_static(X_REQUEST_ID);
        let id = get_request_id(&headers("req-1"), Some(&headers("resp-1")), &name);
        assert_eq!(id, "req-1");
    }

    #[test]
    fn test_falls_back_to_response_header() {
        let name = HeaderName::from_static(X_REQUEST_ID);
        assert_eq!(get_request_id(&HeaderMap::new(), Some(&headers("resp-1")), &name), "resp-1");
        assert_eq!(get_request_id(&headers(""), Some(&headers("resp-2")), &name), "resp-2");
    }

    #[test]
    fn test_missing_everywhere_is_empty() {
        let name = HeaderName::from_static(X_REQUEST_ID);
        assert_eq!(get_request_id(&HeaderMap::new(), None, &name), "");
        assert_eq!(get_request_id(&HeaderMap::new(), Some(&HeaderMap::new()), &name), "");
    }

    #[test]
    fn test_generated_ids_are_hex() {
        let req = Request::new(());
        let id = MakeRequestHexId.make_request_id(&req).unwrap();
        let value = id.header_value().to_str().unwrap();
        assert_eq!(value.len(), 32);
        assert!(value.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
