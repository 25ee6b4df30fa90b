//! LLM: provider adapter behind the drawing assistant.
//!
//! DESIGN
//! ======
//! Settings come from the LLM section of [`ServerConfig`](crate::config::ServerConfig).
//! `LlmClient` dispatches on the configured backend; route code only sees the
//! [`LlmChat`] trait so tests can swap in a scripted mock.

pub mod anthropic;
mod http;
pub mod openai;
pub mod types;

use crate::config::{LlmBackend, LlmSettings};
pub use types::LlmChat;
use types::{ChatResponse, LlmError, Message};

// =============================================================================
// CLIENT DISPATCH
// =============================================================================

/// Concrete LLM client that dispatches to either Anthropic or `OpenAI`.
pub struct LlmClient {
    inner: LlmProvider,
    model: String,
}

enum LlmProvider {
    Anthropic(anthropic::AnthropicClient),
    OpenAi(openai::OpenAiClient),
}

impl LlmClient {
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client fails to build.
    pub fn new(settings: &LlmSettings) -> Result<Self, LlmError> {
        let inner = match settings.backend {
            LlmBackend::Anthropic => LlmProvider::Anthropic(anthropic::AnthropicClient::new(settings)?),
            LlmBackend::OpenAiResponses | LlmBackend::OpenAiChatCompletions => {
                LlmProvider::OpenAi(openai::OpenAiClient::new(settings)?)
            }
        };
        Ok(Self { inner, model: settings.model.clone() })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    async fn chat(&self, max_tokens: u32, system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        match &self.inner {
            LlmProvider::Anthropic(c) => c.chat(&self.model, max_tokens, system, messages).await,
            LlmProvider::OpenAi(c) => c.chat(&self.model, max_tokens, system, messages).await,
        }
    }
}
