//! Terminal rendering of the grid.

use std::fmt::Write;

use canvas::consts::BACKGROUND;
use canvas::grid::{Grid, hex_rgb};

/// Two-column truecolor blocks per cell, with column and row rulers.
#[must_use]
pub fn render_ansi(grid: &Grid) -> String {
    let background = hex_rgb(BACKGROUND).unwrap_or([255, 255, 255]);
    let mut out = header(grid.side());
    for (y, row) in grid.rows().iter().enumerate() {
        let _ = write!(out, "{y:>3} ");
        for cell in row {
            let [r, g, b] = hex_rgb(cell).unwrap_or(background);
            let _ = write!(out, "\x1b[48;2;{r};{g};{b}m  ");
        }
        out.push_str("\x1b[0m\n");
    }
    out
}

/// ASCII fallback: `.` for background, `#` for anything painted.
#[must_use]
pub fn render_plain(grid: &Grid) -> String {
    let mut out = header(grid.side());
    for (y, row) in grid.rows().iter().enumerate() {
        let _ = write!(out, "{y:>3} ");
        for cell in row {
            out.push_str(if cell.eq_ignore_ascii_case(BACKGROUND) { ". " } else { "# " });
        }
        out.push('\n');
    }
    out
}

fn header(side: usize) -> String {
    let mut out = String::from("    ");
    for x in 0..side {
        let _ = write!(out, "{:<2}", x % 100);
    }
    out.push('\n');
    out
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
