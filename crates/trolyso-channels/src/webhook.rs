//! Messenger webhook payloads and subscription verification.

use serde::Deserialize;
use serde_json::Value;
use trolyso_core::types::IncomingMessage;

/// Query string of the `GET /webhook` handshake.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Answer the subscription handshake: the challenge to echo back, or `None`
/// when the request must be refused. An unset expected token refuses all.
pub fn verify_subscription(query: &WebhookQuery, expected_token: &str) -> Option<String> {
    let (Some(mode), Some(token)) = (query.mode.as_deref(), query.verify_token.as_deref()) else {
        tracing::warn!("❌ Webhook verification failed: missing mode or token");
        return None;
    };
    if mode == "subscribe" && !expected_token.is_empty() && token == expected_token {
        tracing::info!("✅ WEBHOOK_VERIFIED");
        Some(query.challenge.clone().unwrap_or_default())
    } else {
        tracing::warn!("❌ Webhook verification failed: token mismatch or mode not subscribe");
        None
    }
}

/// True when the payload is a Page subscription event.
pub fn is_page_event(payload: &Value) -> bool {
    payload["object"].as_str() == Some("page")
}

/// Extract inbound messages from a Page webhook payload.
///
/// Every `message` event from a sender yields one entry. Messages without
/// text (stickers, images) come back with empty text so the assistant can
/// answer with the text-only notice. Echoes of the page's own messages and
/// non-message events (deliveries, reads, postbacks) are skipped.
pub fn parse_webhook(payload: &Value) -> Vec<IncomingMessage> {
    let mut messages = Vec::new();
    if !is_page_event(payload) {
        return messages;
    }
    let Some(entries) = payload["entry"].as_array() else {
        return messages;
    };

    for entry in entries {
        let Some(events) = entry["messaging"].as_array() else {
            continue;
        };
        for event in events {
            let message = &event["message"];
            if !message.is_object() || message["is_echo"].as_bool() == Some(true) {
                continue;
            }
            let Some(sender) = event["sender"]["id"].as_str().filter(|s| !s.is_empty()) else {
                continue;
            };
            messages.push(IncomingMessage {
                sender_id: sender.to_string(),
                text: message["text"].as_str().unwrap_or_default().to_string(),
            });
        }
    }
    messages
}
