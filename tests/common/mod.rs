//! Shared utilities for integration tests.

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower::ServiceExt;
use validator::Validate;

use axum_plus::{Context, Error};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct NewOrder {
    #[validate(length(min = 1, message = "sku is required"))]
    pub sku: String,
    #[validate(range(min = 1, max = 100))]
    pub quantity: u32,
}

/// Bind and validate a `NewOrder`, echoing it back on success.
pub async fn create_order(mut ctx: Context) -> Result<Response, Error> {
    let order: NewOrder = ctx.bind_and_validate().await?;
    ctx.json_success(Some(order), "")
}

/// Send one request through `router` without a network listener.
#[allow(dead_code)]
pub async fn send(router: Router, request: Request<Body>) -> Response {
    router.oneshot(request).await.unwrap()
}

#[allow(dead_code)]
pub async fn get(router: Router, uri: &str) -> Response {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

#[allow(dead_code)]
pub async fn post_json(router: Router, uri: &str, body: &str) -> Response {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
