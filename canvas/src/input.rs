//! Input model: drawing tools and the paint-stroke state machine.
//!
//! A stroke begins on pointer-down, paints every new cell the pointer enters
//! while held, and ends on pointer-up or when the pointer leaves the grid.
//! `StrokeState` tracks the active stroke between those events; the editor
//! decides how the painted cells reach history.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::consts::BACKGROUND;
use crate::grid::Grid;

/// Which drawing tool is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Paint with the selected color.
    #[default]
    Pencil,
    /// Paint with the background color.
    Eraser,
}

impl Tool {
    /// The color this tool lays down given the current selection.
    #[must_use]
    pub fn stroke_color(self, selected: &str) -> &str {
        match self {
            Self::Pencil => selected,
            Self::Eraser => BACKGROUND,
        }
    }
}

/// How painted cells are grouped into history entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeGranularity {
    /// Every changed cell is its own undo step.
    #[default]
    PerCell,
    /// A whole stroke, pointer-down to pointer-up, is one undo step.
    PerStroke,
}

/// The stroke currently being drawn, if any.
#[derive(Debug, Clone, Default)]
pub struct StrokeState {
    active: Option<ActiveStroke>,
}

#[derive(Debug, Clone)]
struct ActiveStroke {
    color: String,
    last_cell: (usize, usize),
    /// Working grid for per-stroke batching; `None` in per-cell mode.
    pending: Option<Grid>,
}

impl StrokeState {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Color of the active stroke.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.color.as_str())
    }

    /// The uncommitted grid of a batched stroke.
    #[must_use]
    pub fn pending(&self) -> Option<&Grid> {
        self.active.as_ref().and_then(|s| s.pending.as_ref())
    }

    pub(crate) fn begin(&mut self, color: &str, cell: (usize, usize), pending: Option<Grid>) {
        self.active = Some(ActiveStroke { color: color.to_string(), last_cell: cell, pending });
    }

    /// Record that the pointer entered `cell`. Returns `true` only when a
    /// stroke is active and `cell` differs from the previous one.
    pub(crate) fn enter(&mut self, cell: (usize, usize)) -> bool {
        match self.active.as_mut() {
            Some(stroke) if stroke.last_cell != cell => {
                stroke.last_cell = cell;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn pending_mut(&mut self) -> Option<&mut Grid> {
        self.active.as_mut().and_then(|s| s.pending.as_mut())
    }

    /// End the stroke, handing back any batched grid.
    pub(crate) fn finish(&mut self) -> Option<Grid> {
        self.active.take().and_then(|s| s.pending)
    }
}
