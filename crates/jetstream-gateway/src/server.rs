//! HTTP server implementation using Axum.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    routing::{delete, get, post},
};
use jetstream_core::config::JetStreamConfig;
use jetstream_core::traits::{DeliveryTransport, Notifier};
use jetstream_channels::{AppsFlyerClient, TelegramNotifier};
use jetstream_engine::{Dispatcher, JobRegistry, LogStore, Pacer, messages, reporting};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::SessionStore;
use crate::notes::NotesStore;

/// Uploads are whole CSV batches; the axum default 2MB cap is too
/// small for them.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared state for the gateway server.
pub struct AppState {
    pub config: JetStreamConfig,
    /// Authoritative job state, shared with every timer loop.
    pub registry: Arc<JobRegistry>,
    /// Bounded operational log ring.
    pub logs: Arc<LogStore>,
    /// Starts jobs and owns their timers.
    pub pacer: Pacer,
    /// Admin session tokens.
    pub sessions: SessionStore,
    /// Encrypted notes blob.
    pub notes: NotesStore,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: JetStreamConfig,
        registry: Arc<JobRegistry>,
        logs: Arc<LogStore>,
        pacer: Pacer,
    ) -> Self {
        let notes = NotesStore::new(&config.notes);
        Self {
            config,
            registry,
            logs,
            pacer,
            sessions: SessionStore::new(),
            notes,
            start_time: Instant::now(),
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(shared: Arc<AppState>) -> Router {
    // Protected routes require a valid session token.
    let protected = Router::new()
        .route("/api/jobs", get(super::routes::list_jobs))
        .route("/api/jobs/{id}/stop", post(super::routes::stop_job))
        .route("/api/jobs/{id}", delete(super::routes::delete_job))
        .route("/api/logs", get(super::routes::get_logs))
        .route("/api/notes", get(super::routes::get_notes))
        .route("/api/notes", post(super::routes::save_notes))
        .route("/api/upload", post(super::routes::upload))
        .route("/api/logout", post(super::routes::logout))
        .route_layer(axum::middleware::from_fn_with_state(
            shared.clone(),
            crate::auth::require_session,
        ));

    // Public routes, no auth.
    let public = Router::new()
        .route("/health", get(super::routes::health))
        .route("/api/login", post(super::routes::login));

    protected
        .merge(public)
        .layer(axum::extract::DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(Any)
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Wire up the engine and start the HTTP server.
pub async fn start(config: JetStreamConfig) -> anyhow::Result<()> {
    let registry = Arc::new(JobRegistry::new());
    let logs = Arc::new(LogStore::new());

    let notifier: Arc<dyn Notifier> =
        Arc::new(TelegramNotifier::new(config.telegram.clone()));
    if !config.telegram.is_configured() {
        tracing::warn!("Telegram is not configured; notifications are disabled");
    }
    let transport: Arc<dyn DeliveryTransport> =
        Arc::new(AppsFlyerClient::new(&config.appsflyer));

    let dispatcher = Arc::new(Dispatcher::new(
        registry.clone(),
        logs.clone(),
        transport,
        notifier.clone(),
    ));
    let pacer = Pacer::new(registry.clone(), logs.clone(), dispatcher, notifier.clone());

    let start_time = Instant::now();
    reporting::spawn_heartbeat(registry.clone(), notifier.clone(), start_time);
    reporting::spawn_daily_status(registry.clone(), notifier.clone());

    let state = Arc::new(AppState::new(config.clone(), registry, logs, pacer));
    let app = build_router(state);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 JetStream server listening on http://{}", addr);
    let port = config.gateway.port;
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&messages::server_started(port)).await {
            tracing::warn!("Startup notification failed: {e}");
        }
    });

    axum::serve(listener, app).await?;
    Ok(())
}
