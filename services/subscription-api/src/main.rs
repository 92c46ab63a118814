//! Spotter Subscription API
//!
//! Gym subscription lifecycle service: plan catalog, member requests, staff
//! approval, and the background reaper and expiry notifier.
//!
//! ## REST Endpoints
//!
//! - `GET /api/v1/plans` - Plan catalog, cheapest first
//! - `GET /api/v1/users/{user_id}/available-plans` - Catalog decorated for a user
//! - `GET /api/v1/users/{user_id}/subscriptions` - Subscription history
//! - `GET /api/v1/users/{user_id}/current-subscription` - Subscription shown as current
//! - `GET /api/v1/users/{user_id}/premium` - Premium access check
//! - `GET /api/v1/users/{user_id}/pending-request` - Pending request and its lifetime
//! - `DELETE /api/v1/users/{user_id}/pending-request` - Member cancels own request
//! - `POST /api/v1/subscriptions/requests` - Submit a request
//! - `GET /api/v1/subscriptions/pending` - Staff approval queue
//! - `POST /api/v1/subscriptions/{id}/approve` - Approve a request
//! - `POST /api/v1/subscriptions/{id}/decline` - Decline a request
//! - `POST /api/v1/subscriptions/{id}/cancel` - Cancel an approved subscription
//! - `POST /api/v1/jobs/reap-stale-requests` - Run the reaper now
//! - `POST /api/v1/jobs/expiry-notifications` - Run the notifier now
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod handlers;
mod scheduler;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use spotter_core::{LogMailer, Mailer, SmtpMailer};
use spotter_db::pg::Repositories;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::scheduler::Scheduler;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("subscription_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Spotter Subscription API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        utc_offset_hours = config.engine.utc_offset_hours,
        pending_ttl_secs = config.engine.pending_ttl.as_secs(),
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Create database pool and bring the schema up to date
    let pool = spotter_db::create_pool(&config.database_url).await?;
    spotter_db::run_migrations(&pool).await?;
    tracing::info!("Database pool created");

    // Mail transport
    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "SMTP mailer configured");
            Arc::new(SmtpMailer::new(smtp.clone())?)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, expiry reminders will only be logged");
            Arc::new(LogMailer)
        }
    };

    // Create application state
    let repos = Repositories::new(pool.clone());
    let state = AppState::new(repos, mailer, pool, config.clone());

    // Start background jobs
    let scheduler = Scheduler::start(&state);

    // Build HTTP router
    let app = build_router(state, metrics_handle);

    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    if let Err(e) = run_http_server(app, http_addr).await {
        tracing::error!(error = ?e, "HTTP server error");
    }

    scheduler.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    let api_v1 = Router::new()
        // Catalog
        .route("/plans", get(handlers::list_plans))
        // Per-user views
        .route(
            "/users/{user_id}/available-plans",
            get(handlers::available_plans),
        )
        .route(
            "/users/{user_id}/subscriptions",
            get(handlers::user_subscriptions),
        )
        .route(
            "/users/{user_id}/current-subscription",
            get(handlers::current_subscription),
        )
        .route("/users/{user_id}/premium", get(handlers::premium_access))
        .route(
            "/users/{user_id}/pending-request",
            get(handlers::pending_request).delete(handlers::cancel_pending_request),
        )
        // Request pipeline and staff workflow
        .route("/subscriptions/requests", post(handlers::create_request))
        .route("/subscriptions/pending", get(handlers::list_pending))
        .route("/subscriptions/{id}/approve", post(handlers::approve))
        .route("/subscriptions/{id}/decline", post(handlers::decline))
        .route(
            "/subscriptions/{id}/cancel",
            post(handlers::cancel_subscription),
        )
        // Manual job triggers
        .route(
            "/jobs/reap-stale-requests",
            post(handlers::reap_stale_requests),
        )
        .route(
            "/jobs/expiry-notifications",
            post(handlers::expiry_notifications),
        );

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
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api/v1", api_v1)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state)
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Most operations are a handful of queries; approvals run one transaction
    let latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("subscription_operation_duration_seconds".to_string()),
            latency_buckets,
        )?
        .install_recorder()?;

    metrics::describe_counter!(
        "subscription_requests_total",
        "Subscription requests by result"
    );
    metrics::describe_counter!(
        "subscription_approvals_total",
        "Approved requests by approval kind"
    );
    metrics::describe_counter!("subscription_declines_total", "Declined requests");
    metrics::describe_counter!(
        "subscription_requests_expired_total",
        "Pending requests cancelled by the reaper"
    );
    metrics::describe_counter!(
        "expiry_notifications_total",
        "Expiry reminders by delivery status"
    );
    metrics::describe_histogram!(
        "subscription_operation_duration_seconds",
        "Operation latency in seconds by operation and result"
    );

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
