//! Request broker: CRUD verbs over a [`Transport`] with concurrent-duplicate
//! collapsing and credential handling.
//!
//! Identical requests issued while one is still in flight share that single call.
//! An entry lives exactly as long as its call: once the call settles the key is free
//! again, so nothing is cached past completion.

use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
};
use thiserror::Error;

use crate::{
    credentials::TokenStore,
    transport::{OutgoingRequest, TransportState},
};

/// BrokerError
///
/// Cloneable so that every caller joined on one call receives the same outcome.
#[derive(Debug, Clone, Error)]
pub enum BrokerError {
    #[error("backend answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Network(#[source] Arc<reqwest::Error>),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("request task failed: {0}")]
    Task(String),
}

impl BrokerError {
    pub fn status(&self) -> Option<u16> {
        match self {
            BrokerError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

impl From<reqwest::Error> for BrokerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BrokerError::Timeout
        } else if let Some(status) = e.status() {
            BrokerError::Status {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            BrokerError::Network(Arc::new(e))
        }
    }
}

type SharedResponse = Shared<BoxFuture<'static, Result<Value, BrokerError>>>;

struct Pending {
    id: u64,
    response: SharedResponse,
}

struct BrokerInner {
    transport: TransportState,
    credentials: TokenStore,
    pending: Mutex<HashMap<String, Pending>>,
    next_id: AtomicU64,
}

impl BrokerInner {
    fn pending(&self) -> MutexGuard<'_, HashMap<String, Pending>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// RequestBroker
///
/// Owns its own pending-request map; independent brokers never share entries.
/// Cheap to clone: clones share the map and the credential store.
#[derive(Clone)]
pub struct RequestBroker {
    inner: Arc<BrokerInner>,
}

impl RequestBroker {
    pub fn new(transport: TransportState, credentials: TokenStore) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                transport,
                credentials,
                pending: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn credentials(&self) -> &TokenStore {
        &self.inner.credentials
    }

    pub async fn get(&self, url: &str, params: Option<Value>) -> Result<Value, BrokerError> {
        self.dispatch(Method::GET, url, params, None).await
    }

    pub async fn post(&self, url: &str, body: Value) -> Result<Value, BrokerError> {
        self.dispatch(Method::POST, url, None, Some(body)).await
    }

    pub async fn put(&self, url: &str, body: Value) -> Result<Value, BrokerError> {
        self.dispatch(Method::PUT, url, None, Some(body)).await
    }

    pub async fn delete(&self, url: &str, params: Option<Value>) -> Result<Value, BrokerError> {
        self.dispatch(Method::DELETE, url, params, None).await
    }

    /// `get` followed by decoding the body into `T`.
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        url: &str,
        params: Option<Value>,
    ) -> Result<T, BrokerError> {
        decode_body(self.get(url, params).await?)
    }

    /// invalidate
    ///
    /// Forgets pending entries whose key contains `pattern`, or all of them when no
    /// pattern is given. Calls already in flight still complete for the callers that
    /// joined them; new callers issue a fresh call. Returns the number of entries dropped.
    pub fn invalidate(&self, pattern: Option<&str>) -> usize {
        let mut pending = self.inner.pending();
        let before = pending.len();
        match pattern {
            Some(pattern) => pending.retain(|key, _| !key.contains(pattern)),
            None => pending.clear(),
        }
        let dropped = before - pending.len();
        if dropped > 0 {
            tracing::debug!(?pattern, dropped, "pending requests invalidated");
        }
        dropped
    }

    /// Keys of the calls currently in flight, sorted.
    pub fn pending_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.pending().keys().cloned().collect();
        keys.sort();
        keys
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        params: Option<Value>,
        body: Option<Value>,
    ) -> Result<Value, BrokerError> {
        let key = cache_key(&method, url, params.as_ref().or(body.as_ref()));

        // Lookup and insertion share one critical section, and the lock is released
        // before awaiting, so a key is registered before its call can yield.
        let response = {
            let mut pending = self.inner.pending();
            match pending.get(&key) {
                Some(entry) => {
                    tracing::trace!(%key, "joining in-flight request");
                    entry.response.clone()
                }
                None => {
                    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                    let request = OutgoingRequest {
                        method,
                        url: url.to_string(),
                        params,
                        body,
                        token: self.inner.credentials.token(),
                    };
                    let response = self.spawn_call(key.clone(), id, request);
                    pending.insert(
                        key,
                        Pending {
                            id,
                            response: response.clone(),
                        },
                    );
                    response
                }
            }
        };

        response.await
    }

    /// Runs the call on its own task so it completes even if every caller goes away.
    fn spawn_call(&self, key: String, id: u64, request: OutgoingRequest) -> SharedResponse {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let result = inner.transport.send(request).await;

            if let Err(e) = &result {
                if e.is_unauthorized() {
                    tracing::warn!(%key, "backend rejected credentials, clearing stored token");
                    inner.credentials.clear();
                }
            }

            // Only remove our own entry: after an invalidation the key may already
            // belong to a newer call.
            let mut pending = inner.pending();
            if pending.get(&key).is_some_and(|entry| entry.id == id) {
                pending.remove(&key);
            }
            drop(pending);

            result
        });

        async move {
            task.await
                .unwrap_or_else(|e| Err(BrokerError::Task(e.to_string())))
        }
        .boxed()
        .shared()
    }
}

/// cache_key
///
/// `METHOD url`, followed by the payload's top-level fields sorted by name as
/// `key=value` pairs joined by `&`. Null fields are skipped.
pub fn cache_key(method: &Method, url: &str, payload: Option<&Value>) -> String {
    let mut key = format!("{method} {url}");
    let pairs = payload.map(canonical_pairs).unwrap_or_default();
    if !pairs.is_empty() {
        key.push(if url.contains('?') { '&' } else { '?' });
        key.push_str(&pairs);
    }
    key
}

fn canonical_pairs(payload: &Value) -> String {
    match payload {
        Value::Object(map) => {
            let mut fields: Vec<(&String, &Value)> =
                map.iter().filter(|(_, value)| !value.is_null()).collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            fields
                .into_iter()
                .map(|(name, value)| format!("{name}={}", param_value(value)))
                .collect::<Vec<_>>()
                .join("&")
        }
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Renders a JSON value as a query-string value: strings unquoted, the rest as JSON.
pub fn param_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn decode_body<T: DeserializeOwned>(body: Value) -> Result<T, BrokerError> {
    serde_json::from_value(body).map_err(|e| BrokerError::Decode(e.to_string()))
}
