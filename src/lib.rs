use axum::{
    Router,
    extract::FromRef,
    http::{HeaderName, StatusCode},
    middleware,
    routing::get,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod api;
pub mod broker;
pub mod claims;
pub mod config;
pub mod cookie;
pub mod credentials;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod session;
pub mod transport;

// Page routers, one per access category.
pub mod routes;
use routes::{admin, public, user};

// --- Public Re-exports ---

pub use broker::{BrokerError, RequestBroker};
pub use config::AppConfig;
pub use credentials::TokenStore;
pub use gate::{AccessGate, GateDecision, GateState};
pub use session::PortalSession;
pub use transport::{MockTransport, ReqwestTransport, TransportState};

/// AppState
///
/// Shared by every request: the immutable configuration, the access gate, and the
/// transport that per-request brokers send through.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub gate: GateState,
    pub transport: TransportState,
}

impl AppState {
    /// Builds the state with the gate derived from `config`.
    pub fn new(config: AppConfig, transport: TransportState) -> Self {
        let gate = Arc::new(AccessGate::from_config(&config));
        Self {
            config,
            gate,
            transport,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for GateState {
    fn from_ref(app_state: &AppState) -> GateState {
        app_state.gate.clone()
    }
}

impl FromRef<AppState> for TransportState {
    fn from_ref(app_state: &AppState) -> TransportState {
        app_state.transport.clone()
    }
}

/// create_router
///
/// Assembles the page routers behind the access gate, adds the ungated health check,
/// and applies the observability stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // Every page, and the 404 fallback, sits behind the gate: no page code runs for a
    // navigation the gate redirects.
    let pages = Router::new()
        .merge(public::public_routes())
        .merge(user::user_routes())
        .merge(admin::admin_routes())
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(middleware::from_fn_with_state(
            state.gate.clone(),
            gate::access_gate,
        ));

    let base_router = pages
        // GET /health
        // Liveness probe for load balancers, outside the page table.
        .route("/health", get(|| async { "ok" }))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request, correlated by the `x-request-id` set above.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
