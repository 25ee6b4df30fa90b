//! Anthropic Messages API client.
//!
//! One `/messages` call per drawing request. Only text blocks survive
//! [`parse_response`]; the drawing pipeline has no use for thinking output.

use super::http;
use super::types::{ChatResponse, ContentBlock, LlmError, Message};
use crate::config::LlmSettings;

const API_VERSION: &str = "2023-06-01";

// =============================================================================
// CLIENT
// =============================================================================

pub struct AnthropicClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl AnthropicClient {
    /// # Errors
    ///
    /// Returns [`LlmError::HttpClientBuild`] if the TLS backend fails to load.
    pub fn new(settings: &LlmSettings) -> Result<Self, LlmError> {
        Ok(Self {
            http: http::client(settings)?,
            url: format!("{}/messages", settings.base_url),
            api_key: settings.api_key.clone(),
        })
    }

    /// # Errors
    ///
    /// Transport failures, non-200 statuses and unparsable bodies.
    pub async fn chat(
        &self,
        model: &str,
        max_tokens: u32,
        system: &str,
        messages: &[Message],
    ) -> Result<ChatResponse, LlmError> {
        let request = self
            .http
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&ApiRequest { model, max_tokens, system, messages });
        parse_response(&http::send(request).await?)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
}

#[derive(serde::Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    model: String,
    #[serde(default)]
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(serde::Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_response(json: &str) -> Result<ChatResponse, LlmError> {
    let ApiResponse { mut content, model, stop_reason, usage } =
        serde_json::from_str(json).map_err(|e| LlmError::ApiParse(e.to_string()))?;
    content.retain(|block| matches!(block, ContentBlock::Text { .. }));
    Ok(ChatResponse {
        content,
        model,
        stop_reason: stop_reason.unwrap_or_else(|| "end_turn".to_string()),
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
    })
}

#[cfg(test)]
#[path = "anthropic_test.rs"]
mod tests;
