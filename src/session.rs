//! Per-navigation portal session.
//!
//! A session wraps one visitor's credential: it owns a [`RequestBroker`] bound to the
//! token cookie, refreshes that credential once when opened, and turns credential
//! changes back into cookies on the way out.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio::sync::watch;

use crate::{
    broker::{BrokerError, RequestBroker},
    config::AppConfig,
    cookie::{expire_cookie, get_cookie, set_cookie},
    credentials::{TokenChange, TokenStore},
    transport::TransportState,
};

/// How the opening credential refresh ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No token, nothing to refresh.
    Skipped,
    Refreshed,
    Failed(String),
}

/// Readiness
///
/// Completion signal of the opening refresh. Clones observe the same signal.
#[derive(Clone, Debug)]
pub struct Readiness {
    rx: watch::Receiver<Option<RefreshOutcome>>,
}

impl Readiness {
    fn settled(outcome: RefreshOutcome) -> Self {
        let (_, rx) = watch::channel(Some(outcome));
        Self { rx }
    }

    pub fn is_ready(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Waits until the refresh has finished and returns how it went.
    pub async fn wait(&self) -> RefreshOutcome {
        let mut rx = self.rx.clone();
        loop {
            if let Some(outcome) = rx.borrow_and_update().clone() {
                return outcome;
            }
            if rx.changed().await.is_err() {
                return RefreshOutcome::Failed("refresh task dropped".to_string());
            }
        }
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    token: Option<String>,
}

/// PortalSession
///
/// Built for every page request. Handlers fetch through [`PortalSession::broker`] after
/// awaiting [`PortalSession::ready`], and answer through [`PortalSession::respond`] so
/// that a cleared or rotated credential reaches the browser.
#[derive(Clone)]
pub struct PortalSession {
    broker: RequestBroker,
    readiness: Readiness,
    token_cookie: String,
    role_cookie: String,
}

impl PortalSession {
    /// open
    ///
    /// Creates the session and, when a token is present, starts the credential
    /// refresh on its own task. The refresh never blocks construction.
    pub fn open(
        transport: TransportState,
        config: &AppConfig,
        token: Option<String>,
    ) -> Self {
        let credentials = TokenStore::new(token);
        let broker = RequestBroker::new(transport, credentials.clone());

        let readiness = if credentials.token().is_some() {
            let (tx, rx) = watch::channel(None);
            let refresher = broker.clone();
            let refresh_path = config.refresh_path.clone();
            tokio::spawn(async move {
                let outcome = refresh(&refresher, &refresh_path).await;
                tx.send_replace(Some(outcome));
            });
            Readiness { rx }
        } else {
            Readiness::settled(RefreshOutcome::Skipped)
        };

        Self {
            broker,
            readiness,
            token_cookie: config.token_cookie.clone(),
            role_cookie: config.role_cookie.clone(),
        }
    }

    pub fn broker(&self) -> &RequestBroker {
        &self.broker
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    /// Waits for the opening refresh; returns the broker to fetch with.
    pub async fn ready(&self) -> &RequestBroker {
        self.readiness.wait().await;
        &self.broker
    }

    pub fn is_signed_in(&self) -> bool {
        self.broker.credentials().token().is_some()
    }

    /// respond
    ///
    /// Serializes a page result. Broker failures become status codes with the standard
    /// reason phrase, and the backend body only reaches the log. Credential changes
    /// become `Set-Cookie` headers in both cases.
    pub fn respond<T: Serialize>(&self, result: Result<T, BrokerError>) -> Response {
        let mut response = match result {
            Ok(page) => Json(page).into_response(),
            Err(e) => {
                tracing::warn!(error = %e, "page data unavailable");
                let status = error_status(&e);
                let reason = status.canonical_reason().unwrap_or("backend unavailable");
                (status, reason).into_response()
            }
        };

        let cookies = match self.broker.credentials().change() {
            TokenChange::Unchanged => vec![],
            TokenChange::Cleared => vec![
                expire_cookie(&self.token_cookie),
                expire_cookie(&self.role_cookie),
            ],
            TokenChange::Rotated(token) => vec![set_cookie(&self.token_cookie, &token)],
        };
        for cookie in cookies.into_iter().flatten() {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
        response
    }
}

/// Maps a backend failure onto the status of the page response.
pub fn error_status(error: &BrokerError) -> StatusCode {
    match error {
        BrokerError::Status { status, .. } if (400..500).contains(status) => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        BrokerError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

async fn refresh(broker: &RequestBroker, refresh_path: &str) -> RefreshOutcome {
    // An empty body means the credential is still good as it is.
    match broker.get_as::<Option<RefreshResponse>>(refresh_path, None).await {
        Ok(Some(RefreshResponse { token: Some(token) })) if !token.is_empty() => {
            broker.credentials().set(token);
            RefreshOutcome::Refreshed
        }
        Ok(_) => RefreshOutcome::Refreshed,
        Err(e) => {
            tracing::warn!(error = %e, "credential refresh failed");
            RefreshOutcome::Failed(e.to_string())
        }
    }
}

/// PortalSession Extractor Implementation
///
/// Reads the token cookie named in `AppConfig` and opens a session over the shared
/// transport. Never rejects: a visitor without a token gets a signed-out session, and
/// the access gate has already decided whether this page may run.
impl<S> FromRequestParts<S> for PortalSession
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
    TransportState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        let transport = TransportState::from_ref(state);
        let token = get_cookie(&parts.headers, &config.token_cookie).map(str::to_owned);

        Ok(PortalSession::open(transport, &config, token))
    }
}
