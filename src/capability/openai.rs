//! OpenAI-backed capability provider.
//!
//! Plain JSON-over-HTTP against the chat completions and embeddings
//! endpoints. No retry logic here — absorbing or surfacing a failed call is
//! the calling node's decision.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::{CapabilityProvider, CompletionRequest, CompletionResponse};
use crate::error::CapabilityError;

const API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for [`OpenAiProvider`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    pub chat_model: String,
    pub embedding_model: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Capability provider backed by the OpenAI HTTP API.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, CapabilityError> {
        let response = self
            .client
            .post(format!("{API_BASE}{path}"))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(CapabilityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl CapabilityProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError> {
        let request = EmbeddingApiRequest {
            model: &self.config.embedding_model,
            input: text,
        };
        let mut response: EmbeddingApiResponse = self.post_json("/embeddings", &request).await?;

        let row = response
            .data
            .pop()
            .ok_or(CapabilityError::EmptyContent)?;
        debug!(model = %self.config.embedding_model, dims = row.embedding.len(), "embedding fetched");
        Ok(row.embedding)
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CapabilityError> {
        let api_request = ChatApiRequest {
            model: &self.config.chat_model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: vec![
                ChatApiMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatApiMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
        };
        let response: ChatApiResponse = self.post_json("/chat/completions", &api_request).await?;

        let usage = response.usage.unwrap_or_default();
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(CapabilityError::EmptyContent)?;

        debug!(
            role = %request.role,
            model = %self.config.chat_model,
            input_tokens = usage.prompt_tokens,
            output_tokens = usage.completion_tokens,
            "completion fetched"
        );

        Ok(CompletionResponse {
            content,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        })
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatApiRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatApiMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatApiResponse {
    choices: Vec<ChatApiChoice>,
    usage: Option<ChatApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatApiChoice {
    message: ChatApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatApiChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingApiRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingApiRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingApiRow {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_constructs_with_defaults() {
        let config = OpenAiConfig::new(SecretString::from("sk-test"));
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.embedding_model, "text-embedding-3-small");

        let provider = OpenAiProvider::new(config).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn chat_request_serializes_system_and_user_messages() {
        let request = ChatApiRequest {
            model: "gpt-4o-mini",
            temperature: 0.0,
            max_tokens: 256,
            messages: vec![
                ChatApiMessage {
                    role: "system",
                    content: "sys",
                },
                ChatApiMessage {
                    role: "user",
                    content: "usr",
                },
            ],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "usr");
    }

    #[test]
    fn chat_response_parses_without_usage() {
        let raw = r#"{"choices": [{"message": {"content": "hello"}}]}"#;
        let response: ChatApiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some("hello")
        );
        assert!(response.usage.is_none());
    }

    #[test]
    fn api_error_body_parses() {
        let raw = r#"{"error": {"message": "invalid api key", "type": "auth"}}"#;
        let error: ApiError = serde_json::from_str(raw).unwrap();
        assert_eq!(error.error.message, "invalid api key");
    }
}
