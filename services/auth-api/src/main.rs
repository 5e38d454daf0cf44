//! Latch Auth API
//!
//! Session microservice issuing access tokens and rotating renewal cookies.
//!
//! ## REST Endpoints
//!
//! - `POST /api/auth/signup` - Register a principal
//! - `POST /api/auth/login` - Access token in the body, renewal token in a cookie
//! - `POST /api/auth/reissue` - Rotate the renewal cookie, new access token
//! - `POST /api/auth/logout` - Revoke the renewal credential, clear the cookie
//! - `GET /api/users/me` - Current principal
//! - `PATCH /api/users/me/password` - Change password, revoke sessions
//! - `DELETE /api/users/me` - Withdraw
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod cookie;
mod error;
mod extractors;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use latch_auth_core::{Argon2PasswordEncoder, SessionLifecycleService, SystemClock};
use latch_db::pg::Repositories;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("auth_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Latch Auth API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        issuer = %config.auth.issuer,
        access_ttl_secs = config.auth.access_token_ttl.as_secs(),
        renewal_ttl_secs = config.auth.renewal_token_ttl.as_secs(),
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Create database pool and bring the schema up to date
    let pool = latch_db::create_pool(&config.database_url).await?;
    latch_db::MIGRATOR.run(&pool).await?;
    tracing::info!("Database pool created, migrations applied");

    // Create session service
    let repos = Repositories::new(pool.clone());
    let sessions = SessionLifecycleService::new(
        config.auth.clone(),
        Arc::new(repos.principals),
        Arc::new(repos.renewal_credentials),
        Arc::new(Argon2PasswordEncoder::new()?),
        Arc::new(SystemClock),
    )?;

    // Create application state
    let state = AppState::new(sessions, pool, config.clone());

    // Build HTTP router
    let app = build_router(state, metrics_handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    let api = Router::new()
        // Session routes
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login))
        .route("/auth/reissue", post(handlers::reissue))
        .route("/auth/logout", post(handlers::logout))
        // Principal routes
        .route("/users/me", get(handlers::me).delete(handlers::withdraw))
        .route("/users/me/password", patch(handlers::change_password));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api", api)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state)
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!("latch_logins_total", "Login attempts by outcome");
    metrics::describe_counter!(
        "latch_reissues_total",
        "Renewal token reissues by outcome (success, rejected, replay, race_lost)"
    );
    metrics::describe_counter!("latch_logouts_total", "Logout requests");

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
