//! Cell-buffer surfaces.
//!
//! A `Surface` is an owned grid of character cells with a position on the
//! screen. Window frames draw borders and titlebars into one; window content
//! regions feed raw shell output into another through a small text engine
//! with curses-like semantics (wrap, scroll-on-overflow, tab stops). Escape
//! sequences in shell output are consumed and dropped rather than
//! interpreted; attribute rendering is out of scope here.

use crossterm::style::Color;
use unicode_width::UnicodeWidthChar;

/// Marker stored in the cell covered by the right half of a wide glyph.
pub const CONTINUATION: char = '\0';

/// A rectangle in screen cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }
}

/// One screen cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self { ch: ' ', fg: Color::Reset }
    }
}

impl Cell {
    pub fn is_continuation(&self) -> bool {
        self.ch == CONTINUATION
    }
}

/// Border characters
struct BorderChars {
    top_left: char,
    top_right: char,
    bottom_left: char,
    bottom_right: char,
    horizontal: char,
    vertical: char,
    t_left: char,
    t_right: char,
}

impl BorderChars {
    fn single() -> Self {
        Self {
            top_left: '┌',
            top_right: '┐',
            bottom_left: '└',
            bottom_right: '┘',
            horizontal: '─',
            vertical: '│',
            t_left: '┤',
            t_right: '├',
        }
    }
}

/// Text-engine parser state, persisted across `feed` calls so escape
/// sequences split over read chunks are still dropped whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextState {
    Plain,
    Esc,
    Charset,
    Csi,
    Osc,
    OscEsc,
}

/// An owned cell grid placed somewhere on the screen.
pub struct Surface {
    rect: Rect,
    cells: Vec<Cell>,
    /// Text-engine cursor, relative to the surface.
    cursor: (u16, u16),
    state: TextState,
    /// Partial UTF-8 sequence carried over between chunks.
    utf8: Vec<u8>,
}

impl Surface {
    pub fn new(rect: Rect) -> Self {
        let size = rect.width as usize * rect.height as usize;
        Self {
            rect,
            cells: vec![Cell::default(); size],
            cursor: (0, 0),
            state: TextState::Plain,
            utf8: Vec::new(),
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Reposition without touching contents.
    pub fn move_to(&mut self, x: u16, y: u16) {
        self.rect.x = x;
        self.rect.y = y;
    }

    /// Text-engine cursor position, clamped into the surface.
    pub fn cursor(&self) -> (u16, u16) {
        (
            self.cursor.0.min(self.rect.width.saturating_sub(1)),
            self.cursor.1.min(self.rect.height.saturating_sub(1)),
        )
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.rect.width && y < self.rect.height {
            self.cells.get(self.index(x, y))
        } else {
            None
        }
    }

    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.rect.width as usize + x as usize
    }

    fn set(&mut self, x: u16, y: u16, ch: char, fg: Color) {
        if x < self.rect.width && y < self.rect.height {
            let idx = self.index(x, y);
            self.cells[idx] = Cell { ch, fg };
        }
    }

    /// Draw a single-line box around the surface perimeter.
    pub fn draw_border(&mut self) {
        let chars = BorderChars::single();
        let (w, h) = (self.rect.width, self.rect.height);
        if w < 2 || h < 2 {
            return;
        }
        let fg = Color::Reset;
        self.set(0, 0, chars.top_left, fg);
        self.set(w - 1, 0, chars.top_right, fg);
        self.set(0, h - 1, chars.bottom_left, fg);
        self.set(w - 1, h - 1, chars.bottom_right, fg);
        for x in 1..w - 1 {
            self.set(x, 0, chars.horizontal, fg);
            self.set(x, h - 1, chars.horizontal, fg);
        }
        for y in 1..h - 1 {
            self.set(0, y, chars.vertical, fg);
            self.set(w - 1, y, chars.vertical, fg);
        }
    }

    /// Draw a tee-connected horizontal rule across row `y`.
    pub fn draw_separator(&mut self, y: u16) {
        let chars = BorderChars::single();
        let w = self.rect.width;
        if w < 2 || y >= self.rect.height {
            return;
        }
        let fg = Color::Reset;
        self.set(0, y, chars.t_right, fg);
        for x in 1..w - 1 {
            self.set(x, y, chars.horizontal, fg);
        }
        self.set(w - 1, y, chars.t_left, fg);
    }

    /// Write `text` at (x, y) in `fg`, clipped to the surface.
    pub fn draw_text(&mut self, x: u16, y: u16, text: &str, fg: Color) {
        let mut col = x;
        for ch in text.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(1).clamp(1, 2) as u16;
            if col + w > self.rect.width {
                break;
            }
            self.set(col, y, ch, fg);
            if w == 2 {
                self.set(col + 1, y, CONTINUATION, fg);
            }
            col += w;
        }
    }

    /// Feed raw child output through the text engine.
    pub fn feed(&mut self, bytes: &[u8]) {
        for &b in bytes {
            match self.state {
                TextState::Plain => match b {
                    0x1b => {
                        self.utf8.clear();
                        self.state = TextState::Esc;
                    }
                    b'\n' => self.line_feed(),
                    b'\r' => self.cursor.0 = 0,
                    b'\t' => self.tab(),
                    0x08 => self.cursor.0 = self.cursor.0.saturating_sub(1),
                    0x00..=0x1f | 0x7f => {}
                    _ => self.put_byte(b),
                },
                TextState::Esc => match b {
                    b'[' => self.state = TextState::Csi,
                    b']' => self.state = TextState::Osc,
                    // charset designators carry one more byte
                    b'(' | b')' | b'*' | b'+' => self.state = TextState::Charset,
                    _ => self.state = TextState::Plain,
                },
                TextState::Charset => self.state = TextState::Plain,
                TextState::Csi => {
                    // parameter and intermediate bytes are 0x20..=0x3f,
                    // final bytes 0x40..=0x7e
                    if (0x40..=0x7e).contains(&b) {
                        self.state = TextState::Plain;
                    }
                }
                TextState::Osc => match b {
                    0x07 => self.state = TextState::Plain,
                    0x1b => self.state = TextState::OscEsc,
                    _ => {}
                },
                TextState::OscEsc => {
                    self.state = if b == b'\\' { TextState::Plain } else { TextState::Osc };
                }
            }
        }
    }

    fn put_byte(&mut self, b: u8) {
        self.utf8.push(b);
        match std::str::from_utf8(&self.utf8) {
            Ok(s) => {
                if let Some(ch) = s.chars().next() {
                    self.put_glyph(ch);
                }
                self.utf8.clear();
            }
            // error_len() == None means the sequence is incomplete so far
            Err(e) if e.error_len().is_none() && self.utf8.len() < 4 => {}
            Err(_) => self.utf8.clear(),
        }
    }

    fn put_glyph(&mut self, ch: char) {
        let w = UnicodeWidthChar::width(ch).unwrap_or(1).clamp(1, 2) as u16;
        if self.cursor.0 + w > self.rect.width {
            self.cursor.0 = 0;
            self.advance_row();
        }
        let (x, y) = self.cursor;
        self.set(x, y, ch, Color::Reset);
        if w == 2 {
            self.set(x + 1, y, CONTINUATION, Color::Reset);
        }
        self.cursor.0 = x + w;
    }

    // Curses newline: erase to end of line, then first column of the next row.
    fn line_feed(&mut self) {
        self.clear_to_eol();
        self.cursor.0 = 0;
        self.advance_row();
    }

    fn advance_row(&mut self) {
        if self.cursor.1 + 1 >= self.rect.height {
            self.scroll_up();
        } else {
            self.cursor.1 += 1;
        }
    }

    fn tab(&mut self) {
        let next = (self.cursor.0 / 8 + 1) * 8;
        self.cursor.0 = next.min(self.rect.width);
    }

    fn clear_to_eol(&mut self) {
        let (x, y) = self.cursor;
        for col in x..self.rect.width {
            self.set(col, y, ' ', Color::Reset);
        }
    }

    fn scroll_up(&mut self) {
        let w = self.rect.width as usize;
        if w == 0 || self.rect.height == 0 {
            return;
        }
        self.cells.drain(..w);
        self.cells.extend(std::iter::repeat(Cell::default()).take(w));
    }
}
