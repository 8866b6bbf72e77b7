//! API route handlers for the gateway.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use trolyso_channels::webhook::{WebhookQuery, is_page_event, parse_webhook, verify_subscription};

use super::server::AppState;

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "trolyso-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": now(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "active_requests": state.assistant.in_flight(),
        "chunk_count": state.knowledge.len(),
    }))
}

/// Which secrets and inputs are configured, without revealing them.
pub async fn test_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    tracing::info!("🧪 Test endpoint called");
    let cfg = &state.config;
    Json(json!({
        "status": "Server is working!",
        "timestamp": now(),
        "env": {
            "port": cfg.gateway.port,
            "has_verify_token": !cfg.messenger.verify_token.is_empty(),
            "has_page_token": !cfg.messenger.page_access_token.is_empty(),
            "has_gemini_key": !cfg.llm.api_key.is_empty(),
            "has_document": !state.knowledge.is_empty(),
            "db_path": cfg.memory.db_path,
        }
    }))
}

/// Echo a payload back, for checking what a webhook sender actually posts.
pub async fn test_webhook(Json(body): Json<Value>) -> Json<Value> {
    tracing::info!("🧪 Manual webhook test called");
    Json(json!({ "received": true, "body": body, "timestamp": now() }))
}

// ---- Messenger webhook ----

/// Subscription handshake (GET) — Meta sends this to verify the endpoint.
pub async fn webhook_verify(
    Query(query): Query<WebhookQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match verify_subscription(&query, &state.config.messenger.verify_token) {
        Some(challenge) => (StatusCode::OK, challenge).into_response(),
        None => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
    }
}

/// Inbound events (POST). Acknowledged immediately; each sender's messages
/// are handed to the assistant in a background task, in payload order.
pub async fn webhook_receive(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Response {
    tracing::debug!("🔔 Webhook payload: {body}");
    if !is_page_event(&body) {
        tracing::warn!("❌ Not a page object: {}", body["object"]);
        return StatusCode::NOT_FOUND.into_response();
    }

    let mut by_sender: Vec<(String, Vec<String>)> = Vec::new();
    for msg in parse_webhook(&body) {
        match by_sender.iter_mut().find(|(sender, _)| *sender == msg.sender_id) {
            Some((_, texts)) => texts.push(msg.text),
            None => by_sender.push((msg.sender_id, vec![msg.text])),
        }
    }

    for (sender, texts) in by_sender {
        tracing::info!("📬 {} message(s) from {sender}", texts.len());
        let assistant = state.assistant.clone();
        state.tasks.spawn(async move {
            for text in texts {
                assistant.handle(&sender, &text).await;
            }
        });
    }

    (StatusCode::OK, "EVENT_RECEIVED").into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct TestMessageRequest {
    #[serde(default)]
    pub psid: String,
    #[serde(default)]
    pub message: String,
}

fn missing_fields() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Missing psid or message", "timestamp": now() })),
    )
        .into_response()
}

/// Run the full assistant cycle for a synthetic message.
pub async fn test_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TestMessageRequest>,
) -> Response {
    if req.psid.is_empty() || req.message.is_empty() {
        return missing_fields();
    }
    tracing::info!("🧪 Manual test message for {}", req.psid);
    let outcome = state.assistant.handle(&req.psid, &req.message).await;
    Json(json!({
        "success": true,
        "message": "Test message processed",
        "outcome": outcome,
        "timestamp": now(),
    }))
    .into_response()
}

/// Deliver raw text through the channel, bypassing the assistant.
pub async fn send_test_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TestMessageRequest>,
) -> Response {
    if req.psid.is_empty() || req.message.is_empty() {
        return missing_fields();
    }
    let sent = state.channel.deliver(&req.psid, &req.message).await;
    Json(json!({
        "success": sent,
        "message": if sent { "Message sent!" } else { "Message failed" },
        "timestamp": now(),
    }))
    .into_response()
}

// ---- Knowledge API ----

/// Chapter labels of the loaded document.
pub async fn knowledge_chapters(State(state): State<Arc<AppState>>) -> Json<Value> {
    let chapters = state.knowledge.chapters();
    Json(json!({ "ok": true, "count": chapters.len(), "chapters": chapters }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunksQuery {
    pub chapter: Option<String>,
}

/// Chunks, optionally restricted to chapters matching `?chapter=`.
pub async fn knowledge_chunks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChunksQuery>,
) -> Json<Value> {
    let chunks = match query.chapter.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(chapter) => state.knowledge.chunks_in_chapter(chapter),
        None => state.knowledge.chunks().to_vec(),
    };
    Json(json!({ "ok": true, "count": chunks.len(), "chunks": chunks }))
}

pub async fn knowledge_stats(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "ok": true, "stats": state.knowledge.stats() }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    pub limit: Option<usize>,
}

/// Rank chunks against a query exactly as the assistant would.
pub async fn knowledge_search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<Value> {
    let limit = req.limit.unwrap_or(state.config.knowledge.top_k);
    let results = state.knowledge.search(&req.query, limit);
    Json(json!({ "ok": true, "count": results.len(), "results": results }))
}

/// Re-read the reference document. A failed reload keeps the current index.
pub async fn knowledge_reload(State(state): State<Arc<AppState>>) -> Response {
    match state.knowledge.reload().await {
        Ok(count) => Json(json!({ "ok": true, "chunks": count })).into_response(),
        Err(e) => {
            tracing::error!("❌ Reload failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "ok": false,
                    "error": e.to_string(),
                    "chunks": state.knowledge.len(),
                })),
            )
                .into_response()
        }
    }
}
