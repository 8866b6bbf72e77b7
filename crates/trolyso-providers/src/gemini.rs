//! Google Gemini `generateContent` provider.
//!
//! Conversation history is sent as `contents` with `user`/`model` roles, the
//! persona as `systemInstruction`. The API key travels in the
//! `x-goog-api-key` header.

use async_trait::async_trait;
use serde_json::{Value, json};
use trolyso_core::config::LlmConfig;
use trolyso_core::error::{Result, TroLySoError};
use trolyso_core::traits::Provider;
use trolyso_core::types::GenerateRequest;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    api_key: String,
    /// Base URL without trailing slash, e.g. `https://…/v1beta`.
    endpoint: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, endpoint: &str) -> Self {
        let endpoint = if endpoint.trim().is_empty() {
            DEFAULT_ENDPOINT
        } else {
            endpoint.trim()
        };
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build from `[llm]`. A missing key is reported on first use, not here.
    pub fn from_config(llm: &LlmConfig) -> Result<Self> {
        if llm.api_key.is_empty() {
            tracing::warn!("⚠️ GEMINI_API_KEY is not set; replies will fail until it is");
        }
        Ok(Self::new(llm.api_key.clone(), &llm.endpoint))
    }

    pub fn url_for(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.endpoint)
    }
}

/// Request body for one `generateContent` call.
pub fn build_body(request: &GenerateRequest) -> Value {
    let mut contents: Vec<Value> = request
        .history
        .iter()
        .map(|entry| {
            json!({
                "role": entry.role.as_str(),
                "parts": [{ "text": entry.text }],
            })
        })
        .collect();
    contents.push(json!({
        "role": "user",
        "parts": [{ "text": request.message }],
    }));

    let mut body = json!({
        "contents": contents,
        "generationConfig": {
            "maxOutputTokens": request.params.max_output_tokens,
            "temperature": request.params.temperature,
        },
    });
    if !request.system_instruction.is_empty() {
        body["systemInstruction"] = json!({ "parts": [{ "text": request.system_instruction }] });
    }
    body
}

/// Concatenated text of the first candidate.
pub fn parse_reply(json: &Value) -> Result<String> {
    if let Some(reason) = json["promptFeedback"]["blockReason"].as_str() {
        return Err(TroLySoError::Provider(format!("gemini blocked the prompt: {reason}")));
    }

    let candidate = json["candidates"]
        .get(0)
        .ok_or_else(|| TroLySoError::Provider("No candidates in response".into()))?;

    let text: String = candidate["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate["finishReason"].as_str().unwrap_or("unknown");
        return Err(TroLySoError::Provider(format!(
            "gemini returned no text (finishReason: {reason})"
        )));
    }
    Ok(text)
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(TroLySoError::ApiKeyMissing("gemini".into()));
        }

        let url = self.url_for(&request.params.model);
        tracing::debug!(
            "🤖 Sending message to Gemini ({}, {} history entries)",
            request.params.model,
            request.history.len()
        );

        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&build_body(request))
            .send()
            .await
            .map_err(|e| TroLySoError::Http(format!("gemini connection failed ({url}): {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(TroLySoError::Provider(format!("gemini API error {status}: {text}")));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| TroLySoError::Http(e.to_string()))?;
        parse_reply(&json)
    }
}
