use std::env;

use thiserror::Error;

/// AppConfig
///
/// Holds the edge service's entire configuration state. Loaded once at startup and
/// immutable afterwards; pulled into handlers and middleware via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and which variables are mandatory.
    pub env: Env,
    // Origin of the REST backend every broker call is resolved against.
    pub api_base_url: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Cookie carrying the bearer token.
    pub token_cookie: String,
    // Cookie carrying the coarse role hint. Never trusted for gating.
    pub role_cookie: String,
    // Backend endpoint called when a session opens to refresh the credential.
    pub refresh_path: String,
    // When set, token signatures are verified (HS256) before the role claim is trusted.
    pub jwt_secret: Option<String>,
}

/// Env
///
/// Defines the runtime context: pretty logs and local fallbacks versus JSON logs and
/// mandatory settings.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("{name} is not a valid URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
}

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_TOKEN_COOKIE: &str = "token";
pub const DEFAULT_ROLE_COOKIE: &str = "user_role";
pub const DEFAULT_REFRESH_PATH: &str = "/api/user/refresh-token/";

impl Default for AppConfig {
    /// Local configuration with no environment lookups, used for test scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            token_cookie: DEFAULT_TOKEN_COOKIE.to_string(),
            role_cookie: DEFAULT_ROLE_COOKIE.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            jwt_secret: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. Production refuses to start
    /// without an explicit `API_BASE_URL`; local falls back to a backend on localhost.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let api_base_url = match (env::var("API_BASE_URL"), &env) {
            (Ok(url), _) => url,
            (Err(_), Env::Production) => return Err(ConfigError::Missing("API_BASE_URL")),
            (Err(_), Env::Local) => DEFAULT_API_BASE_URL.to_string(),
        };
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                name: "API_BASE_URL",
                value: api_base_url,
            });
        }

        Ok(Self {
            env,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            bind_addr: var_or("BIND_ADDR", DEFAULT_BIND_ADDR),
            token_cookie: var_or("TOKEN_COOKIE", DEFAULT_TOKEN_COOKIE),
            role_cookie: var_or("ROLE_COOKIE", DEFAULT_ROLE_COOKIE),
            refresh_path: var_or("REFRESH_PATH", DEFAULT_REFRESH_PATH),
            jwt_secret: env::var("GATE_JWT_SECRET").ok().filter(|s| !s.is_empty()),
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}
