#![allow(dead_code)]

use axum::{
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use job_portal_edge::{
    AppConfig, AppState, MockTransport, TransportState, create_router,
};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tower::ServiceExt;

/// Unsigned token whose payload is `claims`.
pub fn token_with(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.unsigned")
}

pub fn admin_token() -> String {
    token_with(json!({ "user_role": "admin", "user_id": 1 }))
}

pub fn user_token() -> String {
    token_with(json!({ "user_role": "user", "user_id": 2 }))
}

pub fn app_with(mock: &MockTransport) -> axum::Router {
    let transport = Arc::new(mock.clone()) as TransportState;
    create_router(AppState::new(AppConfig::default(), transport))
}

pub async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::COOKIE, format!("token={token}; user_role=user"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok().map(str::to_owned))
        .collect()
}

/// Yields until the mock has seen `n` calls.
pub async fn wait_for_calls(mock: &MockTransport, n: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while mock.call_count() < n {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("backend calls never arrived");
}
