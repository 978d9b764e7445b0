use job_portal_edge::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    transport::{ReqwestTransport, TransportState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: configuration, logging, backend transport, then the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load().expect("FATAL: invalid configuration");

    // 2. Logging: RUST_LOG wins, otherwise debug for this crate.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "job_portal_edge=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Edge starting in {:?} mode", config.env);
    if config.jwt_secret.is_none() {
        tracing::warn!("GATE_JWT_SECRET unset: token roles are read without signature checks");
    }

    // 3. Backend transport shared by every per-request broker.
    let transport = ReqwestTransport::new(&config.api_base_url, &config.token_cookie)
        .expect("FATAL: failed to build the HTTP client");
    let transport = Arc::new(transport) as TransportState;
    tracing::info!(backend = %config.api_base_url, "REST backend configured");

    // 4. Router and server.
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(config, transport));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind the listen address");
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: server terminated unexpectedly");
}
