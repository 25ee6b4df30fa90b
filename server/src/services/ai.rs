//! AI service: chat transcript + canvas → one model call → strict command.
//!
//! DESIGN
//! ======
//! One generation call per user message, no streaming and no retries. The
//! provider text never leaves this module raw: it goes through
//! [`canvas::command::reconcile`], and only the resulting
//! [`Reconciliation`] is returned. Every path through reconciliation is
//! logged with its outcome label so malformed responses show up in traces
//! without reaching the client as errors.

use canvas::command::{Outcome, Reconciliation, reconcile};
use canvas::protocol::AiRequest;
use tracing::{info, warn};

use crate::error::ErrorCode;
use crate::llm::LlmChat;
use crate::llm::types::{LlmError, Message};

const MAX_LOG_CHARS: usize = 800;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("LLM not configured")]
    LlmNotConfigured,
    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl ErrorCode for AiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::LlmNotConfigured => "E_LLM_NOT_CONFIGURED",
            Self::Llm(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::LlmNotConfigured => false,
            Self::Llm(e) => e.retryable(),
        }
    }
}

// =============================================================================
// PROMPT
// =============================================================================

/// Fixed instruction preamble sent as the system prompt.
#[must_use]
pub fn build_system_prompt() -> String {
    "You are an expert pixel-art assistant.

Definitions:
- Size N means an N by N square grid. Example: size 16 means exactly 16 pixel rows and 16 pixel columns.

Rules:
- You may only create or modify grids of size 8x8, 16x16, or 32x32.
- Colors must be valid hex codes like #ffffff or #fff.
- The grid must be perfectly square: exactly N rows and each row must have exactly N hex strings.
- The size field must be a number (8, 16, or 32), not a string like \"8x8\", \"16x16\", or \"32x32\".
- Prefer simple, readable palettes. Background should default to #ffffff unless instructed.
- When modifying current art, return a complete replacement grid in the same size if appropriate.
- If the user's current grid size is not 8, 16, or 32, suggest switching to one of these, but do not output a grid with any other size.
- Output must strictly follow the JSON schema: { action, reply, size, grid? }.
- Do not include code fences, explanations, or any prose outside the JSON."
        .to_string()
}

/// `Current canvas (RxC):\n<json>`, or a fixed line when no grid was sent.
#[must_use]
pub fn canvas_text(grid: &[Vec<String>]) -> String {
    let Some(first) = grid.first() else {
        return "No current canvas provided.".to_string();
    };
    // Vec<Vec<String>> always serialises.
    let json = serde_json::to_string(grid).unwrap_or_default();
    format!("Current canvas ({}x{}):\n{json}", grid.len(), first.len())
}

/// The user-turn prompt: transcript, canvas, task and output requirements.
#[must_use]
pub fn build_prompt(request: &AiRequest) -> String {
    let conversation = request
        .messages
        .iter()
        .map(|m| format!("{}:\n{}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n");
    let side = request.effective_size().side();

    format!(
        "Conversation so far:\n{conversation}\n\n{canvas}\n\n\
         Task: Respond to the latest user with a short helpful 'reply'. If appropriate, include a full \
         8x8, 16x16 or 32x32 'grid' and set action to 'replace_grid'. Prefer the requested size \
         ({side}x{side}) when generating.\n\n\
         Output strict JSON only with keys: action, reply, size, grid. Requirements: size must be a \
         number 8, 16, or 32 (not a string), grid must be an array of N rows each containing N hex color \
         strings, where N = size. Do not include code fences or any extra text.",
        canvas = canvas_text(&request.grid),
    )
}

/// Cut `s` to at most `max` chars for logging, marking the cut with `…`.
#[must_use]
pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

// =============================================================================
// GENERATION
// =============================================================================

/// Run one generation call and reconcile the model's text.
///
/// # Errors
///
/// Returns [`AiError::Llm`] if the provider call fails. Malformed model
/// output is not an error; it reconciles to the default command.
pub async fn generate(llm: &dyn LlmChat, max_tokens: u32, request: &AiRequest) -> Result<Reconciliation, AiError> {
    let effective = request.effective_size();
    let current = request
        .grid
        .first()
        .map_or_else(|| "none".to_string(), |row| format!("{}x{}", request.grid.len(), row.len()));
    info!(
        messages = request.messages.len(),
        requested = %request.size,
        %effective,
        %current,
        "ai: prompt received"
    );

    let system = build_system_prompt();
    let messages = [Message::user(build_prompt(request))];
    let response = llm.chat(max_tokens, &system, &messages).await.map_err(|e| {
        warn!(error = %e, code = e.error_code(), "ai: generation failed");
        AiError::from(e)
    })?;

    let text = response.text();
    info!(
        model = %response.model,
        stop_reason = %response.stop_reason,
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        text_len = text.len(),
        preview = %truncate(text.trim(), MAX_LOG_CHARS),
        "ai: response received"
    );

    let reconciliation = reconcile(&text);
    match &reconciliation.outcome {
        Outcome::Accepted => {
            info!(outcome = reconciliation.outcome.label(), size = ?reconciliation.command.size(), "ai: reconciled");
        }
        Outcome::SizeCorrected { declared, actual } => {
            warn!(outcome = reconciliation.outcome.label(), %declared, %actual, "ai: reconciled");
        }
        Outcome::GridDiscarded { rows, columns } => {
            warn!(outcome = reconciliation.outcome.label(), rows, columns, "ai: reconciled");
        }
        Outcome::Defaulted(err) => {
            warn!(outcome = reconciliation.outcome.label(), error = %err, "ai: reconciled");
        }
    }
    Ok(reconciliation)
}

#[cfg(test)]
#[path = "ai_test.rs"]
mod tests;
