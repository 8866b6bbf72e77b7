//! Plain data types exchanged between crates.

use serde::{Deserialize, Serialize};

/// Speaker of a history entry, as the generative backend understands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::TroLySoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "model" => Ok(Role::Model),
            other => Err(crate::error::TroLySoError::Memory(format!(
                "unknown role tag: {other}"
            ))),
        }
    }
}

/// One role-tagged message of conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
}

impl HistoryEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, text: text.into() }
    }
}

/// A persisted exchange: one user message and the reply it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_id: String,
    pub user_message: String,
    pub bot_response: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ConversationTurn {
    pub fn new(
        user_id: impl Into<String>,
        user_message: impl Into<String>,
        bot_response: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            user_message: user_message.into(),
            bot_response: bot_response.into(),
            created_at: chrono::Utc::now(),
        }
    }
}

/// Inbound text message parsed from a channel webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Channel-scoped sender identity (Messenger PSID).
    pub sender_id: String,
    pub text: String,
}

/// Generation knobs forwarded to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateParams {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Everything the backend needs for one reply.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub system_instruction: String,
    /// Oldest first; empty or starting with a `user` entry.
    pub history: Vec<HistoryEntry>,
    pub message: String,
    pub params: GenerateParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_str() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("model".parse::<Role>().unwrap(), Role::Model);
        assert!("assistant".parse::<Role>().is_err());
        assert_eq!(Role::Model.to_string(), "model");
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&HistoryEntry::model("xin chào")).unwrap();
        assert!(json.contains("\"role\":\"model\""));
    }
}
