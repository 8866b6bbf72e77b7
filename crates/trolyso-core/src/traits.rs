//! Traits at the seams between the assistant and its collaborators.
//!
//! The dialogue core only ever talks to a [`Provider`], a [`Channel`] and a
//! [`HistoryStore`]; concrete implementations live in their own crates.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ConversationTurn, GenerateRequest, HistoryEntry};

/// Generative-text backend.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Produce a reply for `request`. Timeouts are applied by the caller.
    async fn generate(&self, request: &GenerateRequest) -> Result<String>;
}

/// Outbound delivery channel.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver `text` to `recipient_id`, applying the channel's own bounded
    /// retry policy. Returns `false` once retries are exhausted.
    async fn deliver(&self, recipient_id: &str, text: &str) -> bool;
}

/// Per-user conversation history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `limit` most recent entries, ordered oldest first.
    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryEntry>>;

    async fn append(&self, turn: &ConversationTurn) -> Result<()>;
}
