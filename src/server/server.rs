use anyhow::{Context, Result};
use axum::{middleware, routing::get, Router};
use http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::settings::{BrokerConfig, GateConfig};
use crate::feed::FeedFetcher;
use crate::gate::{self, RequestGate};
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::routes;
use crate::token::TokenManager;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub tokens: TokenManager,
    pub feeds: FeedFetcher,
}

impl AppState {
    pub fn new(metrics: &Metrics, tokens: TokenManager) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            feeds: FeedFetcher::new(tokens.clone()),
            tokens,
        }
    }
}

/// Compose every route with the gate it needs.
pub fn router(config: &BrokerConfig, state: AppState) -> Result<Router> {
    let origin_gate = RequestGate::origin_allow_list(&config.gates);
    let protected_gate = RequestGate::protected_routes(&config.gates)?;
    info!(
        "gates: origin for browser routes, {} for service routes",
        protected_gate.as_label()
    );

    let browser_routes = Router::new()
        .route("/auth", get(routes::authorize))
        .route("/validate-and-extend-token", get(routes::extend_token))
        .route_layer(middleware::from_fn_with_state(origin_gate, gate::enforce));

    let service_routes = Router::new()
        .route("/get-feeds", get(routes::get_feeds))
        .route("/session/status", get(routes::session_status))
        .route_layer(middleware::from_fn_with_state(protected_gate, gate::enforce));

    let app = Router::new()
        .route("/auth/callback", get(routes::authorization_callback))
        .route("/health", get(routes::health))
        .merge(browser_routes)
        .merge(service_routes)
        .merge(state.metrics_state.router(&config.metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.gates));

    Ok(app)
}

fn cors_layer(config: &GateConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|e| warn!("skipping cors origin '{}': {}", origin, e))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_credentials(true)
}

/// Bind and serve until Ctrl-C.
pub async fn start(config: &BrokerConfig, tokens: TokenManager) -> Result<()> {
    let metrics = get_metrics().await;
    let state = AppState::new(metrics, tokens);
    let app = router(config, state)?;

    let bind_addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("listening on {}", bind_addr);
    metrics.up.set(1);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    metrics.up.set(0);
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
