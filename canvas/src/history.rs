//! Undo/redo history over grid snapshots.
//!
//! The history is a linear state machine over `{past, present, future}`:
//!
//! - `past` holds prior snapshots, oldest first, capped at `max_history`
//!   (oldest evicted first).
//! - `present` is the authoritative current grid.
//! - `future` holds undone snapshots, most recently undone first.
//!
//! [`History::add`] is the only way to grow `past`, and it always clears
//! `future`: an edit after an undo discards the redo branch for good.
//! Undo and redo on an empty stack are no-ops that return `None`.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use crate::consts::DEFAULT_MAX_HISTORY;
use crate::grid::Grid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    past: VecDeque<Grid>,
    present: Grid,
    future: VecDeque<Grid>,
    max_history: usize,
}

impl History {
    /// A fresh history whose only entry is `present`.
    #[must_use]
    pub fn new(present: Grid) -> Self {
        Self::with_max_history(present, DEFAULT_MAX_HISTORY)
    }

    /// A fresh history retaining at most `max_history` past snapshots.
    #[must_use]
    pub fn with_max_history(present: Grid, max_history: usize) -> Self {
        Self { past: VecDeque::new(), present, future: VecDeque::new(), max_history }
    }

    #[must_use]
    pub fn present(&self) -> &Grid {
        &self.present
    }

    /// Past snapshots, oldest first.
    pub fn past(&self) -> impl ExactSizeIterator<Item = &Grid> {
        self.past.iter()
    }

    /// Redo snapshots, most recently undone first.
    pub fn future(&self) -> impl ExactSizeIterator<Item = &Grid> {
        self.future.iter()
    }

    #[must_use]
    pub fn max_history(&self) -> usize {
        self.max_history
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Record `grid` as the new present.
    ///
    /// The previous present moves to the tail of `past` (evicting the oldest
    /// entry when over capacity), `present` becomes a copy of `grid`, and
    /// `future` is cleared.
    pub fn add(&mut self, grid: &Grid) {
        self.commit(grid.clone());
    }

    /// Same as [`History::add`] but takes ownership, avoiding the copy.
    pub fn commit(&mut self, grid: Grid) {
        let previous = std::mem::replace(&mut self.present, grid);
        self.past.push_back(previous);
        while self.past.len() > self.max_history {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Step back one snapshot. Returns the new present, or `None` if there is
    /// nothing to undo.
    pub fn undo(&mut self) -> Option<&Grid> {
        let previous = self.past.pop_back()?;
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push_front(current);
        Some(&self.present)
    }

    /// Step forward one snapshot. Returns the new present, or `None` if there
    /// is nothing to redo.
    pub fn redo(&mut self) -> Option<&Grid> {
        let next = self.future.pop_front()?;
        let current = std::mem::replace(&mut self.present, next);
        self.past.push_back(current);
        Some(&self.present)
    }

    /// Drop all snapshots; `grid` becomes the only entry.
    pub fn reset(&mut self, grid: Grid) {
        self.past.clear();
        self.future.clear();
        self.present = grid;
    }
}
