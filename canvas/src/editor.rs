//! Pixel editor: the single owner of the live grid and its history.
//!
//! Every mutation of the artwork goes through [`Editor`]. Manual drawing only
//! ever produces single-cell edits; whole-grid replacement (an accepted AI
//! command, a loaded draft) resets history so the new grid is the only entry.
//! The editor returns an [`Action`] describing what changed so the host can
//! decide whether to redraw.

#[cfg(test)]
#[path = "editor_test.rs"]
mod editor_test;

use crate::consts::{DEFAULT_COLOR, DEFAULT_MAX_HISTORY, DEFAULT_PALETTE};
use crate::grid::{Grid, GridError, GridSize, is_hex_color};
use crate::history::History;
use crate::input::{StrokeGranularity, StrokeState, Tool};

/// What an editor operation changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing changed.
    None,
    /// One cell changed and was recorded in history.
    CellPainted { x: usize, y: usize, color: String },
    /// A cell changed inside a batched stroke; not yet in history.
    StrokeUpdated { x: usize, y: usize, color: String },
    /// A batched stroke ended and was recorded as one history entry.
    StrokeCommitted,
    /// Undo or redo moved the present snapshot.
    HistoryMoved,
    /// The whole grid was replaced and history reset.
    GridReplaced { size: GridSize },
}

impl Action {
    /// Whether the host should redraw.
    #[must_use]
    pub fn needs_render(&self) -> bool {
        !matches!(self, Self::None)
    }
}

pub struct Editor {
    history: History,
    stroke: StrokeState,
    granularity: StrokeGranularity,
    tool: Tool,
    selected_color: String,
    custom_colors: Vec<String>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(GridSize::default())
    }
}

impl Editor {
    /// An editor with an empty grid of `size` and per-cell history.
    #[must_use]
    pub fn new(size: GridSize) -> Self {
        Self::with_options(size, StrokeGranularity::PerCell, DEFAULT_MAX_HISTORY)
    }

    #[must_use]
    pub fn with_options(size: GridSize, granularity: StrokeGranularity, max_history: usize) -> Self {
        Self {
            history: History::with_max_history(Grid::empty(size), max_history),
            stroke: StrokeState::default(),
            granularity,
            tool: Tool::default(),
            selected_color: DEFAULT_COLOR.to_string(),
            custom_colors: Vec::new(),
        }
    }

    // --- Queries ---

    /// The grid as currently displayed, including an uncommitted stroke.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        self.stroke.pending().unwrap_or_else(|| self.history.present())
    }

    #[must_use]
    pub fn size(&self) -> GridSize {
        self.grid().size()
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn granularity(&self) -> StrokeGranularity {
        self.granularity
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// `true` when switching size or resetting would discard painted cells.
    #[must_use]
    pub fn would_lose_work(&self) -> bool {
        !self.grid().is_blank()
    }

    // --- Tools and palette ---

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Flip between pencil and eraser. Returns the new tool.
    pub fn toggle_eraser(&mut self) -> Tool {
        self.tool = match self.tool {
            Tool::Pencil => Tool::Eraser,
            Tool::Eraser => Tool::Pencil,
        };
        self.tool
    }

    #[must_use]
    pub fn selected_color(&self) -> &str {
        &self.selected_color
    }

    /// Select a color and switch back to the pencil.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidColor`] for anything but `#rgb` / `#rrggbb`.
    pub fn select_color(&mut self, color: &str) -> Result<(), GridError> {
        if !is_hex_color(color) {
            return Err(GridError::InvalidColor(color.to_string()));
        }
        self.selected_color = color.to_lowercase();
        self.tool = Tool::Pencil;
        Ok(())
    }

    /// Add a custom palette color. Returns `false` if it was already present.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidColor`] for a malformed color.
    pub fn add_custom_color(&mut self, color: &str) -> Result<bool, GridError> {
        if !is_hex_color(color) {
            return Err(GridError::InvalidColor(color.to_string()));
        }
        let color = color.to_lowercase();
        if self.palette().any(|c| c == color) {
            return Ok(false);
        }
        self.custom_colors.push(color);
        Ok(true)
    }

    /// Default palette followed by custom colors.
    pub fn palette(&self) -> impl Iterator<Item = &str> {
        DEFAULT_PALETTE
            .iter()
            .copied()
            .chain(self.custom_colors.iter().map(String::as_str))
    }

    // --- Single-cell edits ---

    /// Paint one cell and record it as its own history entry.
    ///
    /// Painting a cell with the color it already holds records nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] or [`GridError::InvalidColor`];
    /// the grid and history are unchanged on error.
    pub fn paint(&mut self, x: usize, y: usize, color: &str) -> Result<Action, GridError> {
        self.end_stroke();
        self.commit_cell(x, y, color)
    }

    fn commit_cell(&mut self, x: usize, y: usize, color: &str) -> Result<Action, GridError> {
        let mut next = self.history.present().clone();
        if !next.set_cell(x, y, color)? {
            return Ok(Action::None);
        }
        self.history.commit(next);
        Ok(Action::CellPainted { x, y, color: color.to_ascii_lowercase() })
    }

    // --- Strokes ---

    /// Start a stroke at `(x, y)` with the active tool's color.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] when `(x, y)` is off the grid; no
    /// stroke is started.
    pub fn pointer_down(&mut self, x: usize, y: usize) -> Result<Action, GridError> {
        self.end_stroke();
        self.history.present().check_bounds(x, y)?;
        let color = self.tool.stroke_color(&self.selected_color).to_string();
        match self.granularity {
            StrokeGranularity::PerCell => {
                self.stroke.begin(&color, (x, y), None);
                self.commit_cell(x, y, &color)
            }
            StrokeGranularity::PerStroke => {
                let mut pending = self.history.present().clone();
                let changed = pending.set_cell(x, y, &color)?;
                self.stroke.begin(&color, (x, y), Some(pending));
                Ok(if changed { Action::StrokeUpdated { x, y, color } } else { Action::None })
            }
        }
    }

    /// Pointer entered `(x, y)`. Paints only while a stroke is active and
    /// the cell differs from the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] when `(x, y)` is off the grid.
    pub fn pointer_move(&mut self, x: usize, y: usize) -> Result<Action, GridError> {
        if !self.stroke.is_active() {
            return Ok(Action::None);
        }
        self.history.present().check_bounds(x, y)?;
        if !self.stroke.enter((x, y)) {
            return Ok(Action::None);
        }
        let Some(color) = self.stroke.color().map(str::to_string) else {
            return Ok(Action::None);
        };
        match self.stroke.pending_mut() {
            Some(pending) => {
                let changed = pending.set_cell(x, y, &color)?;
                Ok(if changed { Action::StrokeUpdated { x, y, color } } else { Action::None })
            }
            None => self.commit_cell(x, y, &color),
        }
    }

    /// Pointer released.
    pub fn pointer_up(&mut self) -> Action {
        self.end_stroke()
    }

    /// Pointer left the grid; ends the stroke like a release.
    pub fn pointer_leave(&mut self) -> Action {
        self.end_stroke()
    }

    fn end_stroke(&mut self) -> Action {
        match self.stroke.finish() {
            Some(pending) if pending != *self.history.present() => {
                self.history.commit(pending);
                Action::StrokeCommitted
            }
            _ => Action::None,
        }
    }

    // --- History ---

    pub fn undo(&mut self) -> Action {
        self.end_stroke();
        match self.history.undo() {
            Some(_) => Action::HistoryMoved,
            None => Action::None,
        }
    }

    pub fn redo(&mut self) -> Action {
        self.end_stroke();
        match self.history.redo() {
            Some(_) => Action::HistoryMoved,
            None => Action::None,
        }
    }

    // --- Whole-grid operations ---

    /// Switch to `size`, discarding the grid and history. Same size is a
    /// no-op. Callers confirm first when [`Editor::would_lose_work`] is true.
    pub fn resize(&mut self, size: GridSize) -> Action {
        if size == self.size() {
            return Action::None;
        }
        self.replace_grid(Grid::empty(size))
    }

    /// Clear to an empty grid of the current size with fresh history.
    pub fn reset(&mut self) -> Action {
        let size = self.size();
        self.replace_grid(Grid::empty(size))
    }

    /// Replace the whole grid; history becomes the single new entry and the
    /// active size follows the grid.
    pub fn replace_grid(&mut self, grid: Grid) -> Action {
        self.stroke.finish();
        let size = grid.size();
        self.history.reset(grid);
        Action::GridReplaced { size }
    }
}
