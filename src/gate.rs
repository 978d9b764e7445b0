//! Access gate: decides, per navigation, whether a request reaches page code.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::{
    claims::{ClaimsDecoder, Role},
    config::AppConfig,
    cookie::get_cookie,
    routes::{
        self, ADMIN_DASHBOARD_PATH, ADMIN_NOT_AUTHORIZED_PATH, AUTHENTICATION_PATH,
        NOT_AUTHORIZED_PATH, SITE_ROOT_PATH,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(&'static str),
}

/// AccessGate
///
/// Holds the cookie name and claims decoder; [`AccessGate::decide`] is the whole policy.
#[derive(Clone)]
pub struct AccessGate {
    token_cookie: String,
    decoder: ClaimsDecoder,
}

pub type GateState = Arc<AccessGate>;

impl AccessGate {
    pub fn new(token_cookie: impl Into<String>, decoder: ClaimsDecoder) -> Self {
        Self {
            token_cookie: token_cookie.into(),
            decoder,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.token_cookie.clone(),
            ClaimsDecoder::from_secret(config.jwt_secret.as_deref()),
        )
    }

    pub fn token_cookie(&self) -> &str {
        &self.token_cookie
    }

    /// decide
    ///
    /// Evaluates the rules in order; the first match wins:
    /// 1. A signed-in visitor on the login page is sent to their home page. An
    ///    undecodable token there just shows the login page.
    /// 2. Public pages pass.
    /// 3. No token, an undecodable token, or a token without a role: login page.
    /// 4. Role mismatch: the not-authorized page on the side of the path.
    pub fn decide(&self, path: &str, token: Option<&str>) -> GateDecision {
        if let Some(token) = token {
            if routes::is_login_page(path) {
                match self.decoder.decode(token).map(|claims| claims.role()) {
                    Err(_) => return GateDecision::Allow,
                    Ok(Some(Role::Admin)) => return GateDecision::Redirect(ADMIN_DASHBOARD_PATH),
                    Ok(Some(Role::User)) => return GateDecision::Redirect(SITE_ROOT_PATH),
                    Ok(_) => {}
                }
            }
        }

        if routes::is_public(path) {
            return GateDecision::Allow;
        }

        let Some(token) = token else {
            return GateDecision::Redirect(AUTHENTICATION_PATH);
        };

        let role = match self.decoder.decode(token) {
            Ok(claims) => match claims.role() {
                Some(role) => role,
                None => return GateDecision::Redirect(AUTHENTICATION_PATH),
            },
            Err(e) => {
                tracing::debug!(error = %e, "undecodable token treated as signed out");
                return GateDecision::Redirect(AUTHENTICATION_PATH);
            }
        };

        let admin_path = routes::is_admin(path);
        match role {
            Role::Admin if admin_path => GateDecision::Allow,
            _ if admin_path => GateDecision::Redirect(ADMIN_NOT_AUTHORIZED_PATH),
            Role::Admin => GateDecision::Redirect(NOT_AUTHORIZED_PATH),
            Role::User => GateDecision::Allow,
            Role::Other(_) => GateDecision::Redirect(NOT_AUTHORIZED_PATH),
        }
    }
}

/// access_gate
///
/// Middleware wrapping every page route. Reads the token cookie, applies
/// [`AccessGate::decide`], and either runs the inner service or answers with a
/// temporary redirect without touching page code.
pub async fn access_gate(State(gate): State<GateState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let token = get_cookie(request.headers(), gate.token_cookie()).map(str::to_owned);

    match gate.decide(&path, token.as_deref()) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::Redirect(target) => {
            tracing::debug!(%path, %target, "navigation redirected");
            Redirect::temporary(target).into_response()
        }
    }
}
