//! AI command reconciliation: free-form model text in, strict command out.
//!
//! The model is an untrusted oracle. Its output passes through a fixed
//! pipeline before anything else may look at it:
//!
//! 1. [`strip_code_fences`] drops a leading ```` ```lang ```` and trailing fence.
//! 2. [`extract_json`] parses strictly, then retries on the `{ ... }` span.
//! 3. [`normalize_size`] coerces `"16x16"` / `"16"` into a number.
//! 4. [`validate`] checks field types, the size set, hex cells and
//!    rectangular rows. Any failure yields the default no-op command.
//! 5. The repair step discards a grid whose side is not 8, 16 or 32 and
//!    appends [`GRID_DISCARDED_NOTE`] to the reply.
//!
//! The result is an [`AiCommand`], which is the only form in which a model
//! response reaches the editor. [`reconcile`] also reports an [`Outcome`] so
//! the caller can log what happened; this crate does not log.

#[cfg(test)]
#[path = "command_test.rs"]
mod command_test;

use serde_json::Value;

use crate::consts::GRID_DISCARDED_NOTE;
use crate::editor::{Action, Editor};
use crate::grid::{Grid, GridSize, is_hex_color};
use crate::protocol::{AiResponse, ResponseAction};

/// Why a model response was replaced by the default command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("no JSON object in model output")]
    NoJson,
    #[error("model output is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("model output is not a JSON object")]
    NotAnObject,
    #[error("field `{0}` has the wrong type")]
    WrongType(&'static str),
    #[error("unknown action {0:?}")]
    UnknownAction(String),
    #[error("size {0} is not 8, 16 or 32")]
    UnsupportedSize(String),
    #[error("grid row {row} has {found} cells, expected {expected}")]
    RaggedGrid { row: usize, expected: usize, found: usize },
    #[error("grid cell ({x}, {y}) is not a hex color: {value:?}")]
    BadCell { x: usize, y: usize, value: String },
}

/// A validated instruction from the AI channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiCommand {
    /// Leave the canvas alone.
    None { reply: String },
    /// Replace the whole canvas. The grid side is always 8, 16 or 32.
    ReplaceGrid { reply: String, grid: Grid },
}

impl Default for AiCommand {
    fn default() -> Self {
        Self::None { reply: String::new() }
    }
}

impl AiCommand {
    #[must_use]
    pub fn reply(&self) -> &str {
        match self {
            Self::None { reply } | Self::ReplaceGrid { reply, .. } => reply,
        }
    }

    #[must_use]
    pub fn grid(&self) -> Option<&Grid> {
        match self {
            Self::None { .. } => None,
            Self::ReplaceGrid { grid, .. } => Some(grid),
        }
    }

    #[must_use]
    pub fn size(&self) -> Option<GridSize> {
        self.grid().map(Grid::size)
    }

    /// Apply to the editor. Only a grid replacement touches it; history is
    /// reset to the new grid.
    pub fn apply(self, editor: &mut Editor) -> Action {
        match self {
            Self::None { .. } => Action::None,
            Self::ReplaceGrid { grid, .. } => editor.replace_grid(grid),
        }
    }
}

impl From<AiCommand> for AiResponse {
    fn from(command: AiCommand) -> Self {
        match command {
            AiCommand::None { reply } => Self { action: ResponseAction::None, reply, size: None, grid: None },
            AiCommand::ReplaceGrid { reply, grid } => Self {
                action: ResponseAction::ReplaceGrid,
                reply,
                size: Some(grid.size()),
                grid: Some(grid),
            },
        }
    }
}

impl From<AiResponse> for AiCommand {
    /// Client side of the contract: only `replace_grid` with an
    /// AI-sized grid is honoured.
    fn from(response: AiResponse) -> Self {
        match (response.action, response.grid) {
            (ResponseAction::ReplaceGrid, Some(grid)) if grid.size().is_ai_supported() => {
                Self::ReplaceGrid { reply: response.reply, grid }
            }
            _ => Self::None { reply: response.reply },
        }
    }
}

/// What the pipeline did with a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Parsed and validated as-is.
    Accepted,
    /// A valid grid whose declared `size` disagreed; the grid's side wins.
    SizeCorrected { declared: GridSize, actual: GridSize },
    /// The grid had an unsupported shape and was dropped.
    GridDiscarded { rows: usize, columns: usize },
    /// Parse or schema failure; the default command was substituted.
    Defaulted(CommandError),
}

impl Outcome {
    /// Short label for log fields.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::SizeCorrected { .. } => "size_corrected",
            Self::GridDiscarded { .. } => "grid_discarded",
            Self::Defaulted(_) => "defaulted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub command: AiCommand,
    pub outcome: Outcome,
}

/// A schema-valid response before the size repair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Candidate {
    pub action: ResponseAction,
    pub reply: String,
    pub size: Option<GridSize>,
    pub grid: Option<Vec<Vec<String>>>,
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Run the whole pipeline over raw model text. Never fails.
#[must_use]
pub fn reconcile(text: &str) -> Reconciliation {
    let cleaned = strip_code_fences(text);
    let candidate = extract_json(cleaned).and_then(|mut value| {
        normalize_size(&mut value);
        validate(value)
    });
    match candidate {
        Ok(candidate) => repair(candidate),
        Err(err) => Reconciliation { command: AiCommand::default(), outcome: Outcome::Defaulted(err) },
    }
}

/// Remove a surrounding Markdown code fence, if the text starts with one.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        .trim();
    rest.strip_suffix("```").map_or(rest, str::trim_end)
}

/// Parse the text as JSON, falling back to the span between the first `{`
/// and the last `}`.
///
/// # Errors
///
/// [`CommandError::NoJson`] when there is no `{ ... }` span,
/// [`CommandError::InvalidJson`] when the span does not parse either.
pub fn extract_json(text: &str) -> Result<Value, CommandError> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }
    let (Some(first), Some(last)) = (text.find('{'), text.rfind('}')) else {
        return Err(CommandError::NoJson);
    };
    if last <= first {
        return Err(CommandError::NoJson);
    }
    serde_json::from_str(&text[first..=last]).map_err(|e| CommandError::InvalidJson(e.to_string()))
}

/// Coerce a string `size` (`"8x8"`, `"16x16"`, `"32x32"` or all digits) to a
/// number. Other values are left for validation to reject.
pub fn normalize_size(value: &mut Value) {
    let Some(size) = value.get_mut("size") else {
        return;
    };
    let Value::String(raw) = size else {
        return;
    };
    let raw = raw.trim();
    let side = match raw {
        "8x8" => Some(8),
        "16x16" => Some(16),
        "32x32" => Some(32),
        digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            match digits.parse::<u64>() {
                Ok(side) => Some(side),
                Err(_) => None,
            }
        }
        _ => None,
    };
    if let Some(side) = side {
        *size = Value::from(side);
    }
}

/// Check a parsed response against the command schema.
///
/// Absent fields take their defaults; present fields must have the right
/// type (`null` included). Unknown keys are ignored.
///
/// # Errors
///
/// Returns the first [`CommandError`] found.
pub fn validate(value: Value) -> Result<Candidate, CommandError> {
    let Value::Object(mut map) = value else {
        return Err(CommandError::NotAnObject);
    };

    let action = match map.remove("action") {
        None => ResponseAction::None,
        Some(Value::String(s)) => match s.as_str() {
            "none" => ResponseAction::None,
            "replace_grid" => ResponseAction::ReplaceGrid,
            _ => return Err(CommandError::UnknownAction(s)),
        },
        Some(_) => return Err(CommandError::WrongType("action")),
    };

    let reply = match map.remove("reply") {
        None => String::new(),
        Some(Value::String(s)) => s,
        Some(_) => return Err(CommandError::WrongType("reply")),
    };

    let size = match map.remove("size") {
        None => None,
        Some(Value::Number(n)) => match n.as_f64().and_then(GridSize::ai_from_number) {
            Some(size) => Some(size),
            None => return Err(CommandError::UnsupportedSize(n.to_string())),
        },
        Some(_) => return Err(CommandError::WrongType("size")),
    };

    let grid = match map.remove("grid") {
        None => None,
        Some(value) => Some(validate_rows(value)?),
    };

    Ok(Candidate { action, reply, size, grid })
}

fn validate_rows(value: Value) -> Result<Vec<Vec<String>>, CommandError> {
    let Value::Array(rows) = value else {
        return Err(CommandError::WrongType("grid"));
    };
    let mut out = Vec::with_capacity(rows.len());
    let mut width = None;
    for (y, row) in rows.into_iter().enumerate() {
        let Value::Array(cells) = row else {
            return Err(CommandError::WrongType("grid"));
        };
        let expected = *width.get_or_insert(cells.len());
        if cells.len() != expected {
            return Err(CommandError::RaggedGrid { row: y, expected, found: cells.len() });
        }
        let mut parsed = Vec::with_capacity(cells.len());
        for (x, cell) in cells.into_iter().enumerate() {
            match cell {
                Value::String(s) if is_hex_color(&s) => parsed.push(s),
                Value::String(s) => return Err(CommandError::BadCell { x, y, value: s }),
                other => return Err(CommandError::BadCell { x, y, value: other.to_string() }),
            }
        }
        out.push(parsed);
    }
    Ok(out)
}

/// Enforce the size invariant on a schema-valid candidate and collapse it
/// into a command.
#[must_use]
pub fn repair(candidate: Candidate) -> Reconciliation {
    let Candidate { action, reply, size, grid } = candidate;
    let Some(rows) = grid else {
        return Reconciliation { command: AiCommand::None { reply }, outcome: Outcome::Accepted };
    };

    let (row_count, columns) = (rows.len(), rows.first().map_or(0, Vec::len));
    let grid = match Grid::from_rows(rows) {
        Ok(grid) if grid.size().is_ai_supported() => grid,
        _ => {
            return Reconciliation {
                command: AiCommand::None { reply: format!("{reply}\n\n{GRID_DISCARDED_NOTE}") },
                outcome: Outcome::GridDiscarded { rows: row_count, columns },
            };
        }
    };

    if action == ResponseAction::None {
        return Reconciliation { command: AiCommand::None { reply }, outcome: Outcome::Accepted };
    }

    let outcome = match size {
        Some(declared) if declared != grid.size() => Outcome::SizeCorrected { declared, actual: grid.size() },
        _ => Outcome::Accepted,
    };
    Reconciliation { command: AiCommand::ReplaceGrid { reply, grid }, outcome }
}
