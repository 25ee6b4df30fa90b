//! Grid model: the square matrix of hex colors that makes up an artwork.
//!
//! A `Grid` is a plain value. It owns its rows, so cloning it is a deep copy
//! and a snapshot taken for history can never observe later edits to the live
//! grid. Every constructor enforces the shape invariant (exactly N rows of
//! exactly N cells, N a supported side length), which means no other module
//! has to re-check it.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::BACKGROUND;

/// Errors raised while constructing or editing a grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// Side length outside the supported set.
    #[error("invalid grid size {0} (expected 8, 16, 32 or 64)")]
    InvalidSize(usize),

    /// A row does not have the same length as the grid has rows.
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },

    /// A coordinate fell outside `[0, size)`.
    #[error("cell ({x}, {y}) is outside a {size}x{size} grid")]
    OutOfBounds { x: usize, y: usize, size: usize },

    /// A cell value is not a `#rgb` / `#rrggbb` color.
    #[error("invalid color {0:?}")]
    InvalidColor(String),
}

/// Supported side lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(into = "usize", try_from = "usize")]
pub enum GridSize {
    S8,
    #[default]
    S16,
    S32,
    /// Reserved: accepted by the editor, never produced or accepted by the AI channel.
    S64,
}

impl GridSize {
    /// All sizes, smallest first.
    pub const ALL: [GridSize; 4] = [GridSize::S8, GridSize::S16, GridSize::S32, GridSize::S64];

    /// Sizes the AI channel may generate.
    pub const AI: [GridSize; 3] = [GridSize::S8, GridSize::S16, GridSize::S32];

    /// Convert a raw side length.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidSize`] when `side` is not 8, 16, 32 or 64.
    pub fn from_side(side: usize) -> Result<Self, GridError> {
        match side {
            8 => Ok(Self::S8),
            16 => Ok(Self::S16),
            32 => Ok(Self::S32),
            64 => Ok(Self::S64),
            other => Err(GridError::InvalidSize(other)),
        }
    }

    /// Side length in cells.
    #[must_use]
    pub fn side(self) -> usize {
        match self {
            Self::S8 => 8,
            Self::S16 => 16,
            Self::S32 => 32,
            Self::S64 => 64,
        }
    }

    /// Whether the AI channel may produce a grid of this size.
    #[must_use]
    pub fn is_ai_supported(self) -> bool {
        !matches!(self, Self::S64)
    }

    /// The AI size whose side equals a JSON number exactly (`16` or `16.0`).
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn ai_from_number(side: f64) -> Option<Self> {
        Self::AI
            .into_iter()
            .find(|size| (size.side() as f64 - side).abs() < f64::EPSILON)
    }
}

impl From<GridSize> for usize {
    fn from(size: GridSize) -> Self {
        size.side()
    }
}

impl TryFrom<usize> for GridSize {
    type Error = GridError;

    fn try_from(side: usize) -> Result<Self, Self::Error> {
        Self::from_side(side)
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = self.side();
        write!(f, "{side}x{side}")
    }
}

/// Whether `s` is `#` followed by exactly 3 or 6 hex digits.
#[must_use]
pub fn is_hex_color(s: &str) -> bool {
    let Some(digits) = s.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6) && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

/// RGB channels of a `#rgb` or `#rrggbb` color; `None` if `color` is not a
/// hex color.
#[must_use]
pub fn hex_rgb(color: &str) -> Option<[u8; 3]> {
    fn nibble(b: u8) -> u8 {
        match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => 0,
        }
    }
    if !is_hex_color(color) {
        return None;
    }
    match color.as_bytes() {
        [_, r, g, b] => Some([nibble(*r) * 17, nibble(*g) * 17, nibble(*b) * 17]),
        [_, r1, r2, g1, g2, b1, b2] => Some([
            (nibble(*r1) << 4) | nibble(*r2),
            (nibble(*g1) << 4) | nibble(*g2),
            (nibble(*b1) << 4) | nibble(*b2),
        ]),
        _ => None,
    }
}

/// A square artwork canvas. Rows are indexed by `y`, cells within a row by `x`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<String>>", try_from = "Vec<Vec<String>>")]
pub struct Grid {
    size: GridSize,
    rows: Vec<Vec<String>>,
}

impl Grid {
    /// An N×N grid filled with the background color.
    #[must_use]
    pub fn empty(size: GridSize) -> Self {
        let side = size.side();
        Self { size, rows: vec![vec![BACKGROUND.to_string(); side]; side] }
    }

    /// Build a grid from raw rows, checking the shape invariant.
    ///
    /// Cell values are not color-checked here; drafts written by older
    /// builds may carry any string and still load.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidSize`] for an unsupported row count and
    /// [`GridError::Ragged`] when any row length differs from the row count.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Result<Self, GridError> {
        let size = GridSize::from_side(rows.len())?;
        let side = size.side();
        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != side) {
            return Err(GridError::Ragged { row, expected: side, found: cells.len() });
        }
        Ok(Self { size, rows })
    }

    /// The grid's size class.
    #[must_use]
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Side length in cells.
    #[must_use]
    pub fn side(&self) -> usize {
        self.size.side()
    }

    /// Borrow the rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Consume the grid, returning its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    /// Color at `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<&str> {
        self.rows.get(y).and_then(|row| row.get(x)).map(String::as_str)
    }

    /// A copy of this grid with `(x, y)` set to `color`. `self` is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] or [`GridError::InvalidColor`].
    pub fn painted(&self, x: usize, y: usize, color: &str) -> Result<Self, GridError> {
        let mut next = self.clone();
        next.set_cell(x, y, color)?;
        Ok(next)
    }

    /// Set `(x, y)` in place, stored lowercase. Returns `true` when the cell
    /// changed; hex case alone is not a change.
    ///
    /// Crate-private: outside callers go through [`Grid::painted`] so a grid
    /// they hold is never edited behind their back.
    pub(crate) fn set_cell(&mut self, x: usize, y: usize, color: &str) -> Result<bool, GridError> {
        self.check_bounds(x, y)?;
        if !is_hex_color(color) {
            return Err(GridError::InvalidColor(color.to_string()));
        }
        let cell = &mut self.rows[y][x];
        if cell.eq_ignore_ascii_case(color) {
            return Ok(false);
        }
        *cell = color.to_ascii_lowercase();
        Ok(true)
    }

    /// `true` when every cell is the background color.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.rows.iter().flatten().all(|c| c.eq_ignore_ascii_case(BACKGROUND))
    }

    /// Count of cells that differ from the background.
    #[must_use]
    pub fn painted_cells(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|c| !c.eq_ignore_ascii_case(BACKGROUND))
            .count()
    }

    pub(crate) fn check_bounds(&self, x: usize, y: usize) -> Result<(), GridError> {
        let side = self.side();
        if x >= side || y >= side {
            return Err(GridError::OutOfBounds { x, y, size: side });
        }
        Ok(())
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::empty(GridSize::default())
    }
}

impl From<Grid> for Vec<Vec<String>> {
    fn from(grid: Grid) -> Self {
        grid.rows
    }
}

impl TryFrom<Vec<Vec<String>>> for Grid {
    type Error = GridError;

    fn try_from(rows: Vec<Vec<String>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}
