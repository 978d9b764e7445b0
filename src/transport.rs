use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::sync::watch;

use crate::broker::{BrokerError, param_value};

/// Transport timeout applied to every backend call. Not overridable per call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// OutgoingRequest
///
/// One backend call as the broker hands it to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub method: Method,
    /// Path relative to the backend origin (e.g. `/api/job/`), or an absolute URL.
    pub url: String,
    /// Query parameters, as a JSON object.
    pub params: Option<Value>,
    /// JSON request body.
    pub body: Option<Value>,
    /// Bearer token to attach, if the session has one.
    pub token: Option<String>,
}

// 1. Transport Contract
/// Transport
///
/// The network boundary of the broker. The real implementation talks HTTP through
/// `reqwest`; tests swap in [`MockTransport`] to count and stall calls.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the call and returns the decoded JSON body. Non-2xx statuses are
    /// errors; an empty body decodes to `Value::Null`.
    async fn send(&self, request: OutgoingRequest) -> Result<Value, BrokerError>;
}

pub type TransportState = Arc<dyn Transport>;

// 2. The Real Implementation
/// ReqwestTransport
///
/// Resolves request paths against the backend origin and attaches the token both as
/// an `Authorization: Bearer` header and as the token cookie.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    token_cookie: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, token_cookie: &str) -> Result<Self, BrokerError> {
        Self::with_timeout(base_url, token_cookie, REQUEST_TIMEOUT)
    }

    /// Same as [`ReqwestTransport::new`] with a different client timeout.
    pub fn with_timeout(
        base_url: &str,
        token_cookie: &str,
        timeout: Duration,
    ) -> Result<Self, BrokerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BrokerError::from)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_cookie: token_cookie.to_string(),
        })
    }

    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<Value, BrokerError> {
        let mut builder = self
            .client
            .request(request.method.clone(), self.resolve(&request.url));

        if let Some(Value::Object(params)) = &request.params {
            let query: Vec<(&str, String)> = params
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (key.as_str(), param_value(value)))
                .collect();
            builder = builder.query(&query);
        }
        if let Some(body) = request.body.as_ref().filter(|body| !body.is_null()) {
            builder = builder.json(body);
        }
        if let Some(token) = &request.token {
            builder = builder
                .bearer_auth(token)
                .header(reqwest::header::COOKIE, format!("{}={}", self.token_cookie, token));
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(BrokerError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| BrokerError::Decode(e.to_string()))
    }
}

// 3. The Mock Implementation (For Tests)
/// MockTransport
///
/// Records every call and answers from canned responses keyed by method and URL
/// (`Value::Null` when nothing is registered). `hold` stalls calls in flight until
/// `release`, which lets tests observe the broker while requests are pending.
#[derive(Clone)]
pub struct MockTransport {
    responses: Arc<Mutex<HashMap<(Method, String), Result<Value, BrokerError>>>>,
    calls: Arc<Mutex<Vec<OutgoingRequest>>>,
    open: Arc<watch::Sender<bool>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        let (open, _) = watch::channel(true);
        Self {
            responses: Arc::default(),
            calls: Arc::default(),
            open: Arc::new(open),
        }
    }

    pub fn respond(&self, method: Method, url: &str, response: Result<Value, BrokerError>) {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert((method, url.to_string()), response);
    }

    pub fn hold(&self) {
        self.open.send_replace(false);
    }

    pub fn release(&self) {
        self.open.send_replace(true);
    }

    pub fn calls(&self) -> Vec<OutgoingRequest> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<Value, BrokerError> {
        let key = (request.method.clone(), request.url.clone());
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        let mut open = self.open.subscribe();
        while !*open.borrow_and_update() {
            if open.changed().await.is_err() {
                break;
            }
        }

        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&key)
            .cloned()
            .unwrap_or(Ok(Value::Null))
    }
}
