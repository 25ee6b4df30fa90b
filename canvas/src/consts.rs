//! Shared constants for the canvas crate.

// ── Grid ────────────────────────────────────────────────────────

/// Color of an unpainted cell.
pub const BACKGROUND: &str = "#ffffff";

/// Default stroke color for a fresh session.
pub const DEFAULT_COLOR: &str = "#000000";

/// Palette offered before the user adds custom colors.
pub const DEFAULT_PALETTE: [&str; 16] = [
    "#000000", "#ffffff", "#ff0000", "#00ff00", "#0000ff", "#ffff00", "#ff00ff", "#00ffff", "#ffa500", "#800080",
    "#008000", "#800000", "#000080", "#808080", "#c0c0c0", "#404040",
];

// ── History ─────────────────────────────────────────────────────

/// Maximum number of retained `past` snapshots.
pub const DEFAULT_MAX_HISTORY: usize = 50;

// ── AI channel ──────────────────────────────────────────────────

/// Appended to a model reply when its grid had an unsupported side length.
pub const GRID_DISCARDED_NOTE: &str =
    "(Note: The generated grid was discarded because it was not 8x8, 16x16, or 32x32.)";

/// Assistant message shown when the generation call fails.
pub const GENERATION_FAILED_REPLY: &str = "Sorry, I couldn't generate that. Please try again.";
