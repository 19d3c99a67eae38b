//! Host terminal output and event polling.
//!
//! Windows overlap, so they are composited back-to-front into an offscreen
//! cell buffer and the buffer is written out in one pass. The bottom row of
//! the buffer is the status line.
//!
//! # Rendering Architecture
//!
//! The renderer uses synchronized updates to prevent screen tearing:
//!
//! ```text
//! begin_frame()  → Hide cursor, disable autowrap, start sync
//!     ↓
//! render content → composited cell rows, status line, cursor parking
//!     ↓
//! end_frame()    → Enable autowrap, end sync, flush
//! ```

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event},
    execute,
    style::{Color, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use unicode_width::UnicodeWidthChar;

use crate::wm::WindowManager;

use super::surface::{Cell, Surface, CONTINUATION};

/// Begin a render frame (synchronized update, hide cursor, disable autowrap)
fn begin_frame<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "\x1b[?2026h")?; // Begin synchronized update
    write!(out, "\x1b[?7l")?; // Disable autowrap
    execute!(out, Hide)?;
    Ok(())
}

/// End a render frame (enable autowrap, end synchronized update, flush).
/// The cursor stays hidden unless the frame showed it while parking.
fn end_frame<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "\x1b[?7h")?; // Enable autowrap
    write!(out, "\x1b[?2026l")?; // End synchronized update
    out.flush()?;
    Ok(())
}

/// Execute a render operation with frame guards, ensuring cleanup on error
fn with_frame<W: Write, F, R>(out: &mut W, f: F) -> io::Result<R>
where
    F: FnOnce(&mut W) -> io::Result<R>,
{
    begin_frame(out)?;
    let result = f(out);
    // Always end frame, even on error
    let _ = end_frame(out);
    result
}

/// The host terminal: an offscreen composition buffer plus raw-mode setup,
/// event polling, and frame output.
pub struct Screen {
    cols: u16,
    rows: u16,
    back: Vec<Cell>,
    initialized: bool,
}

impl Screen {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            back: vec![Cell::default(); cols as usize * rows as usize],
            initialized: false,
        }
    }

    /// Get terminal size
    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }

    /// Initialize the terminal
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, terminal::EnterAlternateScreen, Clear(ClearType::All))?;
        stdout.flush()?;

        self.initialized = true;
        Ok(())
    }

    /// Cleanup
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }

        let mut stdout = io::stdout();

        // Restore terminal state (in case of abnormal exit)
        write!(stdout, "\x1b[?7h")?; // Enable autowrap
        write!(stdout, "\x1b[?2026l")?; // End synchronized update (if active)
        stdout.flush()?;

        execute!(stdout, Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()?;
        self.initialized = false;
        Ok(())
    }

    /// Drop raw mode while a shell is being forked so the child does not
    /// start under a raw tty discipline.
    pub fn suspend(&self) -> io::Result<()> {
        terminal::disable_raw_mode()
    }

    /// Restore raw mode after [`Screen::suspend`].
    pub fn resume(&self) -> io::Result<()> {
        terminal::enable_raw_mode()
    }

    /// Wait up to `timeout` for the next terminal event.
    pub fn poll_event(&self, timeout: Duration) -> io::Result<Option<Event>> {
        if event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }

    /// Track a host terminal resize.
    pub fn set_size(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.back = vec![Cell::default(); cols as usize * rows as usize];
    }

    /// Composite every window plus the status line and write the frame out.
    pub fn render(&mut self, wm: &WindowManager, status: Option<&str>) -> io::Result<()> {
        self.compose(wm, status);
        self.present(wm)
    }

    /// Rebuild the back buffer: windows bottom to top, then the status row.
    fn compose(&mut self, wm: &WindowManager, status: Option<&str>) {
        self.back.fill(Cell::default());
        for window in wm.stacked() {
            self.blit(window.frame());
            self.blit(window.content());
        }
        self.fixup_wide_pairs();
        self.draw_status(status);
    }

    /// Copy a surface into the back buffer, clipped to the screen.
    fn blit(&mut self, surface: &Surface) {
        let rect = surface.rect();
        for sy in 0..rect.height {
            let y = rect.y + sy;
            if y >= self.rows {
                break;
            }
            for sx in 0..rect.width {
                let x = rect.x + sx;
                if x >= self.cols {
                    break;
                }
                if let Some(cell) = surface.cell(sx, sy) {
                    self.back[y as usize * self.cols as usize + x as usize] = *cell;
                }
            }
        }
    }

    /// Repair wide glyphs cut apart by overlap or the screen edge: a lead
    /// cell without its continuation, or a continuation without its lead,
    /// becomes a blank.
    fn fixup_wide_pairs(&mut self) {
        let cols = self.cols as usize;
        for y in 0..self.rows as usize {
            for x in 0..cols {
                let idx = y * cols + x;
                let cell = self.back[idx];
                if cell.is_continuation() {
                    let orphan = x == 0
                        || UnicodeWidthChar::width(self.back[idx - 1].ch).unwrap_or(1) != 2;
                    if orphan {
                        self.back[idx] = Cell { ch: ' ', fg: cell.fg };
                    }
                } else if UnicodeWidthChar::width(cell.ch).unwrap_or(1) == 2 {
                    let cut = x + 1 >= cols || !self.back[idx + 1].is_continuation();
                    if cut {
                        self.back[idx] = Cell { ch: ' ', fg: cell.fg };
                    }
                }
            }
        }
    }

    /// Paint the bottom row: blank, or the status text in green.
    fn draw_status(&mut self, status: Option<&str>) {
        if self.rows == 0 {
            return;
        }
        let y = (self.rows - 1) as usize;
        let cols = self.cols as usize;
        for x in 0..cols {
            self.back[y * cols + x] = Cell::default();
        }
        let Some(text) = status else {
            return;
        };
        let mut x = 0usize;
        for ch in text.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(1).clamp(1, 2);
            if x + w > cols {
                break;
            }
            self.back[y * cols + x] = Cell { ch, fg: Color::Green };
            if w == 2 {
                self.back[y * cols + x + 1] = Cell { ch: CONTINUATION, fg: Color::Green };
            }
            x += w;
        }
    }

    /// Where the hardware cursor parks: the focused window's text cursor.
    /// With no focus the cursor stays hidden.
    fn park_position(&self, wm: &WindowManager) -> Option<(u16, u16)> {
        let window = wm.focused_window()?;
        let content = window.content();
        let rect = content.rect();
        let (cx, cy) = content.cursor();
        Some((
            (rect.x + cx).min(self.cols.saturating_sub(1)),
            (rect.y + cy).min(self.rows.saturating_sub(1)),
        ))
    }

    /// Write the back buffer to the terminal as one synchronized frame.
    fn present(&self, wm: &WindowManager) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = io::BufWriter::with_capacity(65536, stdout.lock());
        let park = self.park_position(wm);

        with_frame(&mut out, |out| {
            let cols = self.cols as usize;
            let mut line = String::with_capacity(cols);
            for y in 0..self.rows {
                execute!(out, MoveTo(0, y))?;
                let mut current = Color::Reset;
                execute!(out, SetForegroundColor(current))?;
                line.clear();
                for x in 0..cols {
                    let cell = self.back[y as usize * cols + x];
                    // The terminal advances two columns on the wide lead.
                    if cell.is_continuation() {
                        continue;
                    }
                    if cell.fg != current {
                        if !line.is_empty() {
                            write!(out, "{}", line)?;
                            line.clear();
                        }
                        current = cell.fg;
                        execute!(out, SetForegroundColor(current))?;
                    }
                    line.push(cell.ch);
                }
                if !line.is_empty() {
                    write!(out, "{}", line)?;
                }
            }
            execute!(out, ResetColor)?;
            if let Some((x, y)) = park {
                execute!(out, MoveTo(x, y), Show)?;
            }
            Ok(())
        })
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
