//! Dialogue orchestrator — one inbound message in, one grounded reply out.
//!
//! The whole cycle runs inside the [`ConversationGate`] for the sender, so a
//! user's second message never reads history before the first reply is saved.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use trolyso_core::config::TroLySoConfig;
use trolyso_core::error::{Result, TroLySoError};
use trolyso_core::traits::{Channel, HistoryStore, Provider};
use trolyso_core::types::{ConversationTurn, GenerateParams, GenerateRequest, HistoryEntry, Role};
use trolyso_knowledge::KnowledgeBase;

use crate::gate::ConversationGate;
use crate::policy::{FailurePolicy, Stage};
use crate::prompt::{APOLOGY_REPLY, TEXT_ONLY_REPLY, compose_message};
use crate::reply::{preview, split_message};

/// Tunables of the reply cycle.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    /// Reference chunks attached to each question.
    pub top_k: usize,
    /// History entries fetched per turn.
    pub history_limit: usize,
    /// Hard limit on one backend call.
    pub timeout: Duration,
    /// Channel message size cap, in characters.
    pub max_message_chars: usize,
    /// Pause between consecutive parts of a split reply.
    pub part_pause: Duration,
    pub params: GenerateParams,
}

impl AssistantSettings {
    pub fn from_config(config: &TroLySoConfig) -> Self {
        Self {
            top_k: config.knowledge.top_k,
            history_limit: config.memory.history_limit,
            timeout: Duration::from_secs(config.llm.timeout_secs),
            max_message_chars: config.reply.max_message_chars,
            part_pause: Duration::from_millis(config.reply.part_pause_ms),
            params: GenerateParams {
                model: config.llm.model.clone(),
                temperature: config.llm.temperature,
                max_output_tokens: config.llm.max_output_tokens,
            },
        }
    }
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self::from_config(&TroLySoConfig::default())
    }
}

/// How a message was handled. Informational only: every failure has already
/// been dealt with by the time this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The reply was produced; `parts` are the messages handed to the channel.
    Replied { parts: Vec<String> },
    /// The message had no usable text; the text-only notice was sent.
    Rejected,
    /// Something failed; the apology was sent (or at least attempted).
    Apologized,
}

/// The public-service assistant.
pub struct Assistant {
    knowledge: Arc<KnowledgeBase>,
    provider: Arc<dyn Provider>,
    channel: Arc<dyn Channel>,
    history: Arc<dyn HistoryStore>,
    gate: ConversationGate,
    system_prompt: String,
    settings: AssistantSettings,
}

impl Assistant {
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        provider: Arc<dyn Provider>,
        channel: Arc<dyn Channel>,
        history: Arc<dyn HistoryStore>,
        system_prompt: impl Into<String>,
        settings: AssistantSettings,
    ) -> Self {
        Self {
            knowledge,
            provider,
            channel,
            history,
            gate: ConversationGate::new(),
            system_prompt: system_prompt.into(),
            settings,
        }
    }

    /// Wire an assistant from configuration and ready-made collaborators.
    pub fn from_config(
        config: &TroLySoConfig,
        knowledge: Arc<KnowledgeBase>,
        provider: Arc<dyn Provider>,
        channel: Arc<dyn Channel>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        tracing::info!(
            "🤖 Assistant '{}' ready: provider={}, channel={}, history={}",
            config.identity.name,
            provider.name(),
            channel.name(),
            history.name()
        );
        Self::new(
            knowledge,
            provider,
            channel,
            history,
            config.identity.system_prompt.clone(),
            AssistantSettings::from_config(config),
        )
    }

    /// Users with a message being processed or queued.
    pub fn in_flight(&self) -> usize {
        self.gate.in_flight()
    }

    /// Process one inbound message from `user_id`, after any earlier message
    /// from the same user has been fully handled.
    pub async fn handle(&self, user_id: &str, text: &str) -> Outcome {
        self.gate
            .run_exclusive(user_id, || self.process(user_id, text))
            .await
    }

    async fn process(&self, user_id: &str, text: &str) -> Outcome {
        let message = text.trim();
        if message.is_empty() {
            tracing::info!("❌ Message from {user_id} has no text content");
            if !self.channel.deliver(user_id, TEXT_ONLY_REPLY).await {
                tracing::warn!("⚠️ Text-only notice not delivered to {user_id}");
            }
            return Outcome::Rejected;
        }

        tracing::debug!("🤖 Processing message from {user_id}: \"{}\"", preview(message, 80));
        match self.respond(user_id, message).await {
            Ok(parts) => {
                tracing::info!("✅ Answered {user_id} in {} part(s)", parts.len());
                Outcome::Replied { parts }
            }
            Err(e) => {
                tracing::error!("❌ Failed to answer {user_id}: {e}");
                if !self.channel.deliver(user_id, APOLOGY_REPLY).await {
                    tracing::error!("❌ Apology could not be delivered to {user_id}");
                }
                Outcome::Apologized
            }
        }
    }

    async fn respond(&self, user_id: &str, message: &str) -> Result<Vec<String>> {
        let chunks = self.knowledge.search(message, self.settings.top_k);
        if !chunks.is_empty() {
            tracing::debug!(
                "📚 {} reference chunk(s), best score {:.1}",
                chunks.len(),
                chunks[0].score
            );
        }

        let history = self.load_history(user_id).await?;
        let request = GenerateRequest {
            system_instruction: self.system_prompt.clone(),
            history,
            message: compose_message(&chunks, message),
            params: self.settings.params.clone(),
        };

        let reply = self.generate(&request).await?;
        let parts = self.deliver_reply(user_id, &reply).await?;
        self.persist(user_id, message, &reply).await?;
        Ok(parts)
    }

    async fn load_history(&self, user_id: &str) -> Result<Vec<HistoryEntry>> {
        match self.history.recent(user_id, self.settings.history_limit).await {
            Ok(mut entries) => {
                // The backend requires a conversation to open with the user.
                if entries.first().is_some_and(|e| e.role == Role::Model) {
                    entries.remove(0);
                }
                Ok(entries)
            }
            Err(e) => match FailurePolicy::for_failure(Stage::HistoryRead, &e) {
                FailurePolicy::DegradeHistory => {
                    tracing::warn!("⚠️ History unavailable for {user_id}, continuing without: {e}");
                    Ok(Vec::new())
                }
                _ => Err(e),
            },
        }
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let timeout = self.settings.timeout;
        let reply = tokio::time::timeout(timeout, self.provider.generate(request))
            .await
            .map_err(|_| TroLySoError::Timeout(timeout.as_secs()))??;

        if reply.trim().is_empty() {
            return Err(TroLySoError::Provider(format!(
                "{} returned an empty reply",
                self.provider.name()
            )));
        }
        tracing::debug!("✅ {} replied with {} chars", self.provider.name(), reply.chars().count());
        Ok(reply)
    }

    async fn deliver_reply(&self, user_id: &str, reply: &str) -> Result<Vec<String>> {
        let parts = if reply.chars().count() > self.settings.max_message_chars {
            split_message(reply, self.settings.max_message_chars)
        } else {
            vec![reply.to_string()]
        };

        let total = parts.len();
        for (i, part) in parts.iter().enumerate() {
            if !self.channel.deliver(user_id, part).await {
                let err = TroLySoError::Channel(format!(
                    "part {}/{total} not delivered to {user_id}",
                    i + 1
                ));
                match FailurePolicy::for_failure(Stage::Delivery, &err) {
                    FailurePolicy::LogAndContinue => tracing::warn!("⚠️ {err}"),
                    _ => return Err(err),
                }
            }
            if i + 1 < total {
                tokio::time::sleep(self.settings.part_pause).await;
            }
        }
        Ok(parts)
    }

    async fn persist(&self, user_id: &str, message: &str, reply: &str) -> Result<()> {
        let turn = ConversationTurn::new(user_id, message, reply);
        if let Err(e) = self.history.append(&turn).await {
            match FailurePolicy::for_failure(Stage::Persist, &e) {
                FailurePolicy::LogAndContinue => {
                    tracing::warn!("⚠️ Conversation for {user_id} not saved: {e}")
                }
                _ => return Err(e),
            }
        }
        Ok(())
    }
}
