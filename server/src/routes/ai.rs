//! `POST /api/ai`: one generation call per user message.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use canvas::protocol::{AiRequest, AiResponse};
use tracing::error;

use crate::error::{ApiError, ApiJson};
use crate::services::ai::{self, AiError};
use crate::state::AppState;

/// Public message for any provider failure; details stay in the log.
pub const GENERATION_FAILED: &str = "AI generation failed";

/// # Errors
///
/// 503 when no LLM is configured, 500 when the provider call fails.
pub async fn generate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AiRequest>,
) -> Result<Json<AiResponse>, ApiError> {
    let Some(llm) = state.llm.as_deref() else {
        return Err(ApiError::new(StatusCode::SERVICE_UNAVAILABLE, &AiError::LlmNotConfigured));
    };
    match ai::generate(llm, state.config.ai_max_tokens, &request).await {
        Ok(reconciliation) => Ok(Json(reconciliation.command.into())),
        Err(e) => {
            error!(error = %e, "ai: request failed");
            Err(ApiError::with_message(StatusCode::INTERNAL_SERVER_ERROR, GENERATION_FAILED, &e))
        }
    }
}

#[cfg(test)]
#[path = "ai_test.rs"]
mod tests;
