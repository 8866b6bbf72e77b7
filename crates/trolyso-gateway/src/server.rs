//! HTTP server implementation using Axum.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;

use trolyso_agent::Assistant;
use trolyso_core::config::{TroLySoConfig, expand_path};
use trolyso_core::traits::{Channel, HistoryStore, Provider};
use trolyso_knowledge::KnowledgeBase;

/// Shared state for the gateway server.
pub struct AppState {
    pub config: TroLySoConfig,
    pub start_time: std::time::Instant,
    pub knowledge: Arc<KnowledgeBase>,
    pub assistant: Arc<Assistant>,
    /// Same channel the assistant replies through; used by the send test.
    pub channel: Arc<dyn Channel>,
    /// Background conversation tasks spawned by the webhook.
    pub tasks: TaskTracker,
}

impl AppState {
    pub fn new(
        config: TroLySoConfig,
        knowledge: Arc<KnowledgeBase>,
        assistant: Arc<Assistant>,
        channel: Arc<dyn Channel>,
    ) -> Self {
        Self {
            config,
            start_time: std::time::Instant::now(),
            knowledge,
            assistant,
            channel,
            tasks: TaskTracker::new(),
        }
    }

    /// Stop accepting background work and wait for what was already spawned.
    /// Returns `false` if `grace` elapsed first.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tasks.close();
        tokio::time::timeout(grace, self.tasks.wait()).await.is_ok()
    }
}

pub fn build_router(shared: Arc<AppState>) -> Router {
    Router::new()
        // Messenger webhook, must stay public for Meta verification
        .route(
            "/webhook",
            get(super::routes::webhook_verify).post(super::routes::webhook_receive),
        )
        // Diagnostics
        .route("/health", get(super::routes::health_check))
        .route("/test", get(super::routes::test_status))
        .route("/test-webhook", post(super::routes::test_webhook))
        .route("/test-message", post(super::routes::test_message))
        .route("/send-test-message", post(super::routes::send_test_message))
        // Knowledge inspection
        .route(
            "/api/v1/knowledge/chapters",
            get(super::routes::knowledge_chapters),
        )
        .route("/api/v1/knowledge/chunks", get(super::routes::knowledge_chunks))
        .route("/api/v1/knowledge/stats", get(super::routes::knowledge_stats))
        .route(
            "/api/v1/knowledge/search",
            post(super::routes::knowledge_search),
        )
        .route(
            "/api/v1/knowledge/reload",
            post(super::routes::knowledge_reload),
        )
        .layer(
            CorsLayer::new()
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers(Any)
                .allow_origin(Any)
                .max_age(Duration::from_secs(3600)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Load the reference document named in config. A missing or unreadable
/// document leaves the assistant answering without reference material.
pub async fn load_knowledge(config: &TroLySoConfig) -> Arc<KnowledgeBase> {
    if config.knowledge.document_path.trim().is_empty() {
        tracing::warn!("⚠️ No reference document configured (DOCUMENT_PATH); answering without it");
        return Arc::new(KnowledgeBase::empty());
    }

    let kb = KnowledgeBase::with_source(expand_path(&config.knowledge.document_path));
    if let Err(e) = kb.reload().await {
        tracing::warn!("⚠️ Knowledge base not available: {e}");
    }
    Arc::new(kb)
}

/// Start the HTTP server and block until it has shut down.
pub async fn start(config: TroLySoConfig) -> anyhow::Result<()> {
    let knowledge = load_knowledge(&config).await;

    let provider: Arc<dyn Provider> = Arc::from(trolyso_providers::create_provider(&config)?);
    let channel: Arc<dyn Channel> =
        Arc::new(trolyso_channels::MessengerChannel::new(&config.messenger));
    let history: Arc<dyn HistoryStore> = match trolyso_memory::create_history(&config.memory) {
        Ok(h) => Arc::from(h),
        Err(e) => {
            tracing::error!("❌ Failed to open history database: {e}; keeping history in memory");
            Arc::new(trolyso_memory::SqliteHistory::in_memory()?)
        }
    };

    let assistant = Arc::new(Assistant::from_config(
        &config,
        knowledge.clone(),
        provider,
        channel.clone(),
        history,
    ));

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let grace = Duration::from_secs(config.gateway.shutdown_grace_secs);
    let state = Arc::new(AppState::new(config, knowledge, assistant, channel));
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🌐 Gateway server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let pending = state.tasks.len();
    if pending > 0 {
        tracing::info!("⏳ Waiting for {pending} conversation task(s) to finish...");
    }
    if state.drain(grace).await {
        tracing::info!("👋 Shutdown complete");
    } else {
        tracing::warn!(
            "⚠️ Shutdown grace period elapsed with {} conversation task(s) still running",
            state.tasks.len()
        );
    }
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("🛑 Shutdown signal received, no longer accepting requests");
}
