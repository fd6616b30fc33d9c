//! Terminal drawing surface.
//!
//! Rasterizes surface-unit drawing onto terminal cells, one cell covering a
//! [`CellSize`] block of pixels. Frames are composed in a back buffer and
//! [`present`](Surface::present) writes only the cells that changed since
//! the last presented frame.

use std::fmt;
use std::io::{self, Stdout, Write};
use std::str::FromStr;

use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::{queue, terminal};
use glam::Vec2;
use unicode_width::UnicodeWidthChar;

use super::{Align, Rgb, Rgba, Surface, TextStyle};
use crate::error::ClientError;
use crate::geometry::{Rect, Viewport};

/// Upper bound on cells visited by one diagonal line.
const MAX_LINE_STEPS: usize = 4096;

/// Pixels covered by one terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    pub width: u16,
    pub height: u16,
}

impl Default for CellSize {
    fn default() -> Self {
        Self {
            width: 8,
            height: 16,
        }
    }
}

impl fmt::Display for CellSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for CellSize {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ClientError::invalid_config("MITOSIS_CELL_SIZE", s, "expected WIDTHxHEIGHT, e.g. 8x16")
        };
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u16 = w.trim().parse().map_err(|_| invalid())?;
        let height: u16 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Rgb,
    pub bg: Rgb,
}

impl Cell {
    fn blank(bg: Rgb) -> Self {
        Self {
            ch: ' ',
            fg: Rgb::WHITE,
            bg,
        }
    }
}

pub struct TerminalSurface<W: Write> {
    out: W,
    cols: u16,
    rows: u16,
    cell: CellSize,
    back: Vec<Cell>,
    /// Last presented cells; `None` forces a redraw.
    front: Vec<Option<Cell>>,
}

impl TerminalSurface<Stdout> {
    /// Surface covering the whole terminal.
    pub fn stdout(cell: CellSize) -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        Ok(Self::new(io::stdout(), cols, rows, cell))
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, cols: u16, rows: u16, cell: CellSize) -> Self {
        let len = cols as usize * rows as usize;
        Self {
            out,
            cols,
            rows,
            cell,
            back: vec![Cell::blank(Rgb::BLACK); len],
            front: vec![None; len],
        }
    }

    /// Resize to a new terminal grid; the next present redraws everything.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let len = cols as usize * rows as usize;
        self.cols = cols;
        self.rows = rows;
        self.back = vec![Cell::blank(Rgb::BLACK); len];
        self.front = vec![None; len];
    }

    pub fn grid_size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    pub fn cell_size(&self) -> CellSize {
        self.cell
    }

    pub fn cell(&self, col: u16, row: u16) -> Option<Cell> {
        self.index(col as i64, row as i64).map(|i| self.back[i])
    }

    /// Pixel at the centre of a cell; pointer events land here.
    pub fn cell_center(&self, col: u16, row: u16) -> Vec2 {
        cell_center(self.cell, col, row)
    }

    /// Row of text as currently composed (for inspection).
    pub fn row_text(&self, row: u16) -> String {
        (0..self.cols)
            .filter_map(|col| self.cell(col, row))
            .map(|c| c.ch)
            .collect()
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn index(&self, col: i64, row: i64) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.cols as i64 || row >= self.rows as i64 {
            return None;
        }
        Some(row as usize * self.cols as usize + col as usize)
    }

    fn cell_coords(&self, p: Vec2) -> (f32, f32) {
        (p.x / self.cell.width as f32, p.y / self.cell.height as f32)
    }

    fn put_line_char(&mut self, col: i64, row: i64, ch: char, color: Rgb) {
        if let Some(i) = self.index(col, row) {
            let cell = &mut self.back[i];
            cell.ch = match (cell.ch, ch) {
                ('│', '─') | ('─', '│') | ('┼', _) => '┼',
                _ => ch,
            };
            cell.fg = color;
        }
    }
}

/// Pixel at the centre of cell `(col, row)`.
pub fn cell_center(cell: CellSize, col: u16, row: u16) -> Vec2 {
    Vec2::new(
        (col as f32 + 0.5) * cell.width as f32,
        (row as f32 + 0.5) * cell.height as f32,
    )
}

/// One character per cell: anything that is not exactly one column wide
/// (controls, combining marks, wide glyphs) is shown as `?`.
fn single_width(c: char) -> char {
    match c.width() {
        Some(1) => c,
        _ => '?',
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn viewport(&self) -> Viewport {
        Viewport::new(
            self.cols as f32 * self.cell.width as f32,
            self.rows as f32 * self.cell.height as f32,
        )
    }

    fn clear(&mut self, color: Rgb) {
        self.back.fill(Cell::blank(color));
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Rgb) {
        let (c0, r0) = self.cell_coords(from);
        let (c1, r1) = self.cell_coords(to);
        let (cols, rows) = (self.cols as f32, self.rows as f32);

        if r0.floor() == r1.floor() {
            let row = r0.floor() as i64;
            let start = c0.min(c1).max(0.0).floor() as i64;
            let end = c0.max(c1).min(cols - 1.0).floor() as i64;
            for col in start..=end {
                self.put_line_char(col, row, '─', color);
            }
        } else if c0.floor() == c1.floor() {
            let col = c0.floor() as i64;
            let start = r0.min(r1).max(0.0).floor() as i64;
            let end = r0.max(r1).min(rows - 1.0).floor() as i64;
            for row in start..=end {
                self.put_line_char(col, row, '│', color);
            }
        } else {
            let steps = ((c1 - c0).abs().max((r1 - r0).abs()).ceil() as usize).min(MAX_LINE_STEPS);
            for step in 0..=steps {
                let t = step as f32 / steps.max(1) as f32;
                let col = (c0 + (c1 - c0) * t).floor() as i64;
                let row = (r0 + (r1 - r0) * t).floor() as i64;
                self.put_line_char(col, row, '·', color);
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb) {
        let radius = radius.max(0.0);
        let (cw, ch) = (self.cell.width as f32, self.cell.height as f32);
        let min_col = ((center.x - radius) / cw).floor().max(0.0) as i64;
        let max_col = ((center.x + radius) / cw).floor().min(self.cols as f32 - 1.0) as i64;
        let min_row = ((center.y - radius) / ch).floor().max(0.0) as i64;
        let max_row = ((center.y + radius) / ch).floor().min(self.rows as f32 - 1.0) as i64;

        let mut painted = false;
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                let c = cell_center(self.cell, col as u16, row as u16);
                if c.distance(center) <= radius {
                    if let Some(i) = self.index(col, row) {
                        self.back[i] = Cell {
                            ch: ' ',
                            fg: Rgb::WHITE,
                            bg: color,
                        };
                        painted = true;
                    }
                }
            }
        }

        // Smaller than a cell: mark the cell holding the centre.
        if !painted {
            let col = (center.x / cw).floor() as i64;
            let row = (center.y / ch).floor() as i64;
            if let Some(i) = self.index(col, row) {
                self.back[i].ch = '•';
                self.back[i].fg = color;
            }
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let (cw, ch) = (self.cell.width as f32, self.cell.height as f32);
        let min_col = (rect.x / cw).floor().max(0.0) as i64;
        let max_col = ((rect.x + rect.width) / cw).ceil().min(self.cols as f32) as i64;
        let min_row = (rect.y / ch).floor().max(0.0) as i64;
        let max_row = ((rect.y + rect.height) / ch).ceil().min(self.rows as f32) as i64;

        for row in min_row..max_row {
            for col in min_col..max_col {
                if !rect.contains(cell_center(self.cell, col as u16, row as u16)) {
                    continue;
                }
                if let Some(i) = self.index(col, row) {
                    let cell = &mut self.back[i];
                    cell.bg = color.rgb.over(cell.bg, color.alpha);
                    cell.fg = color.rgb.over(cell.fg, color.alpha);
                }
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb) {
        let (cw, ch) = (self.cell.width as f32, self.cell.height as f32);
        let left = (rect.x / cw).floor() as i64;
        let right = ((rect.x + rect.width) / cw).floor() as i64;
        let top = (rect.y / ch).floor() as i64;
        let bottom = ((rect.y + rect.height) / ch).floor() as i64;
        if right <= left || bottom <= top {
            return;
        }

        let mut put = |col: i64, row: i64, c: char| {
            if let Some(i) = self.index(col, row) {
                self.back[i].ch = c;
                self.back[i].fg = color;
            }
        };
        for col in left + 1..right {
            put(col, top, '─');
            put(col, bottom, '─');
        }
        for row in top + 1..bottom {
            put(left, row, '│');
            put(right, row, '│');
        }
        put(left, top, '┌');
        put(right, top, '┐');
        put(left, bottom, '└');
        put(right, bottom, '┘');
    }

    fn text(&mut self, anchor: Vec2, text: &str, style: TextStyle) {
        // Terminals have a single font size; `style.size` is not applied.
        let (col, row) = self.cell_coords(anchor);
        let row = row.ceil() as i64 - 1;
        let len = text.chars().count() as i64;
        let start = match style.align {
            Align::Left => col.floor() as i64,
            Align::Center => col.floor() as i64 - len / 2,
            Align::Right => col.round() as i64 - len,
        };

        for (offset, c) in text.chars().enumerate() {
            let c = single_width(c);
            if let Some(i) = self.index(start + offset as i64, row) {
                self.back[i].ch = c;
                self.back[i].fg = style.color;
            }
        }
    }

    fn present(&mut self) -> io::Result<()> {
        let mut fg: Option<Rgb> = None;
        let mut bg: Option<Rgb> = None;
        let mut cursor: Option<(u16, u16)> = None;

        for row in 0..self.rows {
            for col in 0..self.cols {
                let i = row as usize * self.cols as usize + col as usize;
                let cell = self.back[i];
                if self.front[i] == Some(cell) {
                    continue;
                }
                if cursor != Some((col, row)) {
                    queue!(self.out, MoveTo(col, row))?;
                }
                if fg != Some(cell.fg) {
                    queue!(self.out, SetForegroundColor(to_color(cell.fg)))?;
                    fg = Some(cell.fg);
                }
                if bg != Some(cell.bg) {
                    queue!(self.out, SetBackgroundColor(to_color(cell.bg)))?;
                    bg = Some(cell.bg);
                }
                queue!(self.out, Print(cell.ch))?;
                cursor = Some((col + 1, row));
                self.front[i] = Some(cell);
            }
        }

        queue!(self.out, ResetColor)?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::TextSize;

    fn surface(cols: u16, rows: u16) -> TerminalSurface<Vec<u8>> {
        TerminalSurface::new(Vec::new(), cols, rows, CellSize { width: 10, height: 10 })
    }

    #[test]
    fn test_viewport_in_pixels() {
        let s = surface(80, 24);
        assert_eq!(s.viewport(), Viewport::new(800.0, 240.0));
    }

    #[test]
    fn test_grid_lines_cross() {
        let mut s = surface(10, 10);
        s.clear(Rgb::BLACK);
        s.line(Vec2::new(0.0, 55.0), Vec2::new(100.0, 55.0), Rgb::GRID);
        s.line(Vec2::new(35.0, 0.0), Vec2::new(35.0, 100.0), Rgb::GRID);

        assert_eq!(s.cell(0, 5).unwrap().ch, '─');
        assert_eq!(s.cell(3, 0).unwrap().ch, '│');
        assert_eq!(s.cell(3, 5).unwrap().ch, '┼');
    }

    #[test]
    fn test_offscreen_line_is_clipped() {
        let mut s = surface(10, 10);
        s.clear(Rgb::BLACK);
        s.line(Vec2::new(-5000.0, -50.0), Vec2::new(5000.0, -50.0), Rgb::GRID);
        s.line(Vec2::new(-1e6, 20.0), Vec2::new(1e6, 20.0), Rgb::GRID);
        assert!((0..10).all(|col| s.cell(col, 2).unwrap().ch == '─'));
    }

    #[test]
    fn test_circle_fills_cells() {
        let mut s = surface(10, 10);
        s.clear(Rgb::BLACK);
        let red = Rgb::new(255, 0, 0);
        s.fill_circle(Vec2::new(50.0, 50.0), 20.0, red);

        assert_eq!(s.cell(4, 4).unwrap().bg, red);
        assert_eq!(s.cell(5, 5).unwrap().bg, red);
        assert_eq!(s.cell(0, 0).unwrap().bg, Rgb::BLACK);
    }

    #[test]
    fn test_tiny_circle_marks_centre_cell() {
        let mut s = surface(10, 10);
        s.clear(Rgb::BLACK);
        let green = Rgb::new(0, 255, 0);
        s.fill_circle(Vec2::new(12.0, 12.0), 2.0, green);

        let cell = s.cell(1, 1).unwrap();
        assert_eq!(cell.ch, '•');
        assert_eq!(cell.fg, green);
    }

    #[test]
    fn test_overlay_darkens() {
        let mut s = surface(4, 4);
        s.clear(Rgb::WHITE);
        s.fill_rect(s.viewport().bounds(), Rgba::new(Rgb::BLACK, 0.8));
        assert_eq!(s.cell(2, 2).unwrap().bg, Rgb::new(51, 51, 51));
    }

    #[test]
    fn test_centered_text() {
        let mut s = surface(20, 5);
        s.clear(Rgb::BLACK);
        s.text(
            Vec2::new(100.0, 30.0),
            "abcd",
            TextStyle::new(Rgb::WHITE, TextSize::Body, Align::Center),
        );
        assert_eq!(s.row_text(2).trim(), "abcd");
        assert_eq!(s.cell(8, 2).unwrap().ch, 'a');
    }

    #[test]
    fn test_text_keeps_one_column_per_char() {
        let mut s = surface(10, 2);
        s.clear(Rgb::BLACK);
        s.text(
            Vec2::new(0.0, 10.0),
            "a\u{4e2d}b\u{301}\t",
            TextStyle::new(Rgb::WHITE, TextSize::Body, Align::Left),
        );
        assert_eq!(s.row_text(0), "a?b??     ");

        s.present().unwrap();
        let output = String::from_utf8_lossy(s.writer());
        assert!(!output.contains('\u{4e2d}'));
        assert!(!output.contains('\t'));
    }

    #[test]
    fn test_present_writes_only_changes() {
        let mut s = surface(4, 2);
        s.clear(Rgb::BLACK);
        s.present().unwrap();
        let first = s.writer().len();
        assert!(first > 0);

        s.present().unwrap();
        let unchanged = s.writer().len() - first;

        s.text(
            Vec2::new(0.0, 10.0),
            "x",
            TextStyle::new(Rgb::WHITE, TextSize::Body, Align::Left),
        );
        s.present().unwrap();
        let changed = s.writer().len() - first - unchanged;

        assert!(changed > unchanged);
        let output = String::from_utf8_lossy(s.writer());
        assert!(output.contains('x'));
    }

    #[test]
    fn test_resize_redraws_everything() {
        let mut s = surface(4, 2);
        s.clear(Rgb::BLACK);
        s.present().unwrap();

        s.resize(6, 3);
        assert_eq!(s.grid_size(), (6, 3));
        assert_eq!(s.viewport(), Viewport::new(60.0, 30.0));
        assert_eq!(s.row_text(2).len(), 6);

        let before = s.writer().len();
        s.clear(Rgb::BLACK);
        s.present().unwrap();
        let redraw = String::from_utf8_lossy(&s.writer()[before..]).matches(' ').count();
        assert_eq!(redraw, 18);
    }

    #[test]
    fn test_cell_size_parse() {
        assert_eq!("8x16".parse::<CellSize>().unwrap(), CellSize::default());
        assert_eq!(" 10X20 ".parse::<CellSize>().unwrap(), CellSize { width: 10, height: 20 });
        assert!("0x16".parse::<CellSize>().is_err());
        assert!("big".parse::<CellSize>().is_err());
    }
}
