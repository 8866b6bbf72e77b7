//! TroLySo configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TroLySoError};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TroLySoConfig {
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub messenger: MessengerConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
}

impl TroLySoConfig {
    /// Load config from `TROLYSO_CONFIG` or the default path, then apply
    /// environment overrides. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var("TROLYSO_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TroLySoError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| TroLySoError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Overlay values taken from the process environment (or any lookup).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("GEMINI_API_KEY") {
            self.llm.api_key = v;
        }
        if let Some(v) = non_empty("PAGE_ACCESS_TOKEN") {
            self.messenger.page_access_token = v;
        }
        if let Some(v) = non_empty("VERIFY_TOKEN") {
            self.messenger.verify_token = v;
        }
        if let Some(v) = non_empty("DOCUMENT_PATH") {
            self.knowledge.document_path = v;
        }
        if let Some(v) = non_empty("DB_PATH") {
            self.memory.db_path = v;
        }
        if let Some(v) = non_empty("PORT") {
            match v.trim().parse() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!("⚠️ Ignoring invalid PORT value: {v}"),
            }
        }
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the TroLySo home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".trolyso")
    }
}

/// Expand `~` and environment variables in a configured path.
pub fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

/// Assistant persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_name() -> String { "TroLySo".into() }

fn default_system_prompt() -> String {
    "You are the 'Public Service Assistant', a friendly and patient consultant on the \
     Vietnamese government's public service applications (VNeID, VssID, the National \
     Public Service Portal, ETAX, the Party Member's Handbook and related apps).\n\
     \n\
     Rules:\n\
     - Every instruction must be verifiable in the official guide of the service. Never \
     invent steps, buttons or menu names.\n\
     - When reference material is provided, ground the answer in it.\n\
     - The chat client does NOT render markdown: no asterisks, no # headings, no code \
     fences. Use ALL CAPS for emphasis, a colon after headings and '-' for lists.\n\
     - Use everyday language and a few helpful emojis (📱 ➡️ ✅).\n\
     - Always reply in the same language the user wrote in.\n\
     - Image messages are not supported yet; ask the user to describe the problem in words."
        .into()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            system_prompt: default_system_prompt(),
        }
    }
}

/// Generative backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    /// Empty means the provider's public endpoint.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String { "gemini".into() }
fn default_model() -> String { "gemini-2.0-flash-exp".into() }
fn default_temperature() -> f32 { 0.7 }
fn default_max_output_tokens() -> u32 { 5000 }
fn default_timeout_secs() -> u64 { 30 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: String::new(),
            endpoint: String::new(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Reference document configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Plain-text extraction of the reference document. Empty disables retrieval.
    #[serde(default)]
    pub document_path: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize { 3 }

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            document_path: String::new(),
            top_k: default_top_k(),
        }
    }
}

/// Conversation history configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_db_path() -> String { "~/.trolyso/history.db".into() }
fn default_history_limit() -> usize { 10 }

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            history_limit: default_history_limit(),
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long shutdown waits for in-flight conversations.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 3000 }
fn default_shutdown_grace() -> u64 { 30 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

/// Facebook Messenger channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessengerConfig {
    #[serde(default)]
    pub page_access_token: String,
    #[serde(default)]
    pub verify_token: String,
    #[serde(default = "default_graph_url")]
    pub graph_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
}

fn default_graph_url() -> String { "https://graph.facebook.com".into() }
fn default_api_version() -> String { "v2.6".into() }
fn default_max_attempts() -> u32 { 3 }
fn default_retry_base_ms() -> u64 { 1000 }

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            page_access_token: String::new(),
            verify_token: String::new(),
            graph_url: default_graph_url(),
            api_version: default_api_version(),
            max_attempts: default_max_attempts(),
            retry_base_ms: default_retry_base_ms(),
        }
    }
}

/// Reply delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
    #[serde(default = "default_part_pause_ms")]
    pub part_pause_ms: u64,
}

fn default_max_message_chars() -> usize { 2000 }
fn default_part_pause_ms() -> u64 { 500 }

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            max_message_chars: default_max_message_chars(),
            part_pause_ms: default_part_pause_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = TroLySoConfig::default();
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.llm.max_output_tokens, 5000);
        assert_eq!(config.knowledge.top_k, 3);
        assert_eq!(config.memory.history_limit, 10);
        assert_eq!(config.reply.max_message_chars, 2000);
        assert_eq!(config.messenger.max_attempts, 3);
        assert_eq!(config.identity.name, "TroLySo");
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [llm]
            model = "gemini-1.5-pro"
            timeout_secs = 10

            [knowledge]
            document_path = "/srv/docs/huong-dan.txt"
            top_k = 5

            [gateway]
            port = 8080
        "#;

        let config: TroLySoConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.model, "gemini-1.5-pro");
        assert_eq!(config.llm.timeout_secs, 10);
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.knowledge.top_k, 5);
        assert_eq!(config.gateway.port, 8080);
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: TroLySoConfig = toml::from_str("").unwrap();
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.messenger.api_version, "v2.6");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[reply]\nmax_message_chars = 640\n").unwrap();
        let config = TroLySoConfig::load_from(&path).unwrap();
        assert_eq!(config.reply.max_message_chars, 640);
        assert_eq!(config.reply.part_pause_ms, 500);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gateway\nport = ").unwrap();
        assert!(matches!(
            TroLySoConfig::load_from(&path),
            Err(TroLySoError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "g-key"),
            ("PAGE_ACCESS_TOKEN", "page-token"),
            ("VERIFY_TOKEN", "verify-me"),
            ("PORT", "4000"),
            ("DOCUMENT_PATH", ""),
        ]
        .into_iter()
        .collect();

        let mut config = TroLySoConfig::default();
        config.knowledge.document_path = "/keep/me.txt".into();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.llm.api_key, "g-key");
        assert_eq!(config.messenger.page_access_token, "page-token");
        assert_eq!(config.messenger.verify_token, "verify-me");
        assert_eq!(config.gateway.port, 4000);
        assert_eq!(config.knowledge.document_path, "/keep/me.txt");
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let mut config = TroLySoConfig::default();
        config.apply_env_overrides(|k| (k == "PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.gateway.port, 3000);
    }

    #[test]
    fn test_home_dir() {
        let home = TroLySoConfig::home_dir();
        assert!(home.to_string_lossy().contains("trolyso"));
    }
}
