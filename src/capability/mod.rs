//! Capability provider — the pipeline's only doorway to LLM completions and
//! embeddings.
//!
//! Capabilities are addressed by logical role ("embedding", "skill-extraction",
//! "pii-removal") rather than by model name, so the pipeline never assumes a
//! specific provider. Every call is fallible and may be slow; callers decide
//! what a failure degrades to.

use async_trait::async_trait;

use crate::error::CapabilityError;

pub mod openai;

pub use openai::{OpenAiConfig, OpenAiProvider};

/// Logical capability roles. A provider maps each role to whatever model and
/// prompt plumbing it sees fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityRole {
    Embedding,
    SkillExtraction,
    PiiRemoval,
}

impl CapabilityRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embedding => "embedding",
            Self::SkillExtraction => "skill-extraction",
            Self::PiiRemoval => "pii-removal",
        }
    }
}

impl std::fmt::Display for CapabilityRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub role: CapabilityRole,
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(
        role: CapabilityRole,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            role,
            system: system.into(),
            user: user.into(),
            temperature: 0.0,
            max_tokens: 1024,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A completion response with raw content and token accounting.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Remote capability interface consumed by pipeline nodes.
///
/// Retries, backoff, and timeouts are the provider's concern (or its
/// caller's); the pipeline core never assumes a call completes within any
/// deadline.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Embed a text into a vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError>;

    /// Run a structured completion for the given role.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CapabilityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_are_stable() {
        assert_eq!(CapabilityRole::Embedding.as_str(), "embedding");
        assert_eq!(CapabilityRole::SkillExtraction.as_str(), "skill-extraction");
        assert_eq!(CapabilityRole::PiiRemoval.as_str(), "pii-removal");
    }

    #[test]
    fn completion_request_builder_defaults() {
        let request = CompletionRequest::new(CapabilityRole::SkillExtraction, "sys", "user");
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.max_tokens, 1024);

        let request = request.with_temperature(0.2).with_max_tokens(512);
        assert_eq!(request.temperature, 0.2);
        assert_eq!(request.max_tokens, 512);
    }
}
