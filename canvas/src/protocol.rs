//! Wire types for the AI generation endpoint.
//!
//! These are the JSON shapes exchanged between the terminal client and the
//! server. Requests are deliberately loose (the grid is raw rows and the
//! size is any JSON value) so the server can apply its own defaults; the
//! response is always built from a validated [`AiCommand`](crate::command::AiCommand).

#[cfg(test)]
#[path = "protocol_test.rs"]
mod protocol_test;

use serde::{Deserialize, Serialize};

use crate::grid::{Grid, GridSize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Upper-case label used in the model transcript.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Assistant => "ASSISTANT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Body of `POST /api/ai`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Current canvas rows. Not shape-checked; the server only echoes it
    /// into the prompt.
    #[serde(default)]
    pub grid: Vec<Vec<String>>,
    /// Requested size. Anything other than 8, 16 or 32 means 16.
    #[serde(default)]
    pub size: serde_json::Value,
}

impl AiRequest {
    #[must_use]
    pub fn new(messages: Vec<ChatMessage>, grid: &Grid) -> Self {
        Self {
            messages,
            grid: grid.rows().to_vec(),
            size: serde_json::Value::from(grid.side()),
        }
    }

    /// The size the model should prefer when generating.
    ///
    /// Accepts a number or a numeric string; falls back to 16.
    #[must_use]
    pub fn effective_size(&self) -> GridSize {
        let side = match &self.size {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => match s.trim().parse::<f64>() {
                Ok(side) => Some(side),
                Err(_) => None,
            },
            _ => None,
        };
        side.and_then(GridSize::ai_from_number).unwrap_or_default()
    }
}

/// The `action` field of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseAction {
    #[default]
    None,
    ReplaceGrid,
}

/// Body returned by `POST /api/ai`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiResponse {
    #[serde(default)]
    pub action: ResponseAction,
    #[serde(default)]
    pub reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<GridSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<Grid>,
}

/// Pull the artwork id out of a gateway link such as
/// `https://arweave.net/<id>` or `https://arweave.net/<id>/grid-data.json`.
/// A bare id is returned as-is.
#[must_use]
pub fn artwork_id(link: &str) -> Option<&str> {
    let mut rest = link.trim();
    if let Some(cut) = rest.find(['?', '#']) {
        rest = &rest[..cut];
    }
    let rest = rest.trim_end_matches('/');
    let rest = rest
        .strip_suffix("/grid-data.json")
        .or_else(|| rest.strip_suffix("/image.png"))
        .unwrap_or(rest);
    let id = rest.rsplit('/').next().unwrap_or(rest);
    let valid = !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    valid.then_some(id)
}
