//! Window - one bordered shell window on the screen

use crossterm::style::Color;
use serde::Deserialize;
use unicode_width::UnicodeWidthStr;

use crate::core::pty::PtySession;
use crate::ui::surface::{Rect, Surface};

/// Unique identifier for a window
pub type WindowId = u64;

/// Shortest height a window can shrink to: border, titlebar, rule, one
/// content row, border.
pub const MIN_HEIGHT: u16 = 5;

/// Titlebar palette
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleColor {
    #[default]
    Blue,
    Red,
    Green,
}

impl TitleColor {
    pub fn to_crossterm(self) -> Color {
        match self {
            TitleColor::Blue => Color::Blue,
            TitleColor::Red => Color::Red,
            TitleColor::Green => Color::Green,
        }
    }
}

/// A single bordered window hosting one shell session.
///
/// The frame surface carries the border and titlebar; the content surface is
/// the scrolling region shell output lands in, inset two columns from the
/// left edge and three rows from the top.
pub struct Window {
    /// Unique identifier, shown in the titlebar, never reused
    pub id: WindowId,
    /// Rendered titlebar text, fixed at creation
    title: String,
    title_color: TitleColor,
    /// Reserved visibility flag; always false for now
    #[allow(dead_code)]
    hidden: bool,
    frame: Surface,
    content: Surface,
    /// The shell attached to this window
    pub session: PtySession,
}

/// Titlebar text for a window: the base title joined with its id.
pub fn titlebar_text(title: &str, id: WindowId) -> String {
    format!("{} : {}", title, id)
}

/// Smallest frame width that still fits `title` plus the corner padding.
/// Saturates for titles wider than the cell grid can address.
pub fn min_frame_width(title: &str) -> u16 {
    u16::try_from(title.width()).unwrap_or(u16::MAX).saturating_add(4)
}

impl Window {
    /// Build a window at `rect` around an already-spawned session. `title`
    /// is the rendered titlebar text from [`titlebar_text`].
    pub fn new(id: WindowId, title: String, color: TitleColor, rect: Rect, session: PtySession) -> Self {
        let mut window = Self {
            id,
            title,
            title_color: color,
            hidden: false,
            frame: Surface::new(rect),
            content: Surface::new(inner_rect(rect)),
            session,
        };
        window.redraw_frame();
        window
    }

    pub fn rect(&self) -> Rect {
        self.frame.rect()
    }

    pub fn frame(&self) -> &Surface {
        &self.frame
    }

    pub fn content(&self) -> &Surface {
        &self.content
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Smallest width that still fits the titlebar text.
    pub fn min_width(&self) -> u16 {
        min_frame_width(&self.title)
    }

    /// Push drained shell output into the content region.
    pub fn feed_output(&mut self, bytes: &[u8]) {
        self.content.feed(bytes);
    }

    /// Apply a new geometry.
    ///
    /// A pure move repositions both surfaces and keeps their contents. Any
    /// size change recreates them at the new geometry; content written so
    /// far is not preserved.
    pub fn apply_rect(&mut self, rect: Rect) {
        let old = self.frame.rect();
        if rect == old {
            return;
        }
        if rect.width == old.width && rect.height == old.height {
            self.frame.move_to(rect.x, rect.y);
            let inner = inner_rect(rect);
            self.content.move_to(inner.x, inner.y);
        } else {
            self.frame = Surface::new(rect);
            self.content = Surface::new(inner_rect(rect));
            self.redraw_frame();
        }
    }

    fn redraw_frame(&mut self) {
        self.frame.draw_border();
        self.frame.draw_separator(2);
        self.frame
            .draw_text(2, 1, &self.title, self.title_color.to_crossterm());
    }
}

/// Content region inset: two columns right, three rows down, stopping short
/// of the right and bottom border.
fn inner_rect(rect: Rect) -> Rect {
    Rect::new(
        rect.x + 2,
        rect.y + 3,
        rect.width.saturating_sub(3),
        rect.height.saturating_sub(4),
    )
}

/// Clamp a requested geometry to the minimums and the usable screen area.
///
/// `max_cols`/`max_rows` describe the region windows may occupy; the row
/// below it is the status line. Out-of-range positions slide back on-screen,
/// out-of-range sizes shrink, sub-minimum sizes grow. Degenerate screens
/// smaller than the minimums win over the minimums.
pub fn clamp_rect(rect: Rect, min_width: u16, max_cols: u16, max_rows: u16) -> Rect {
    let width = rect.width.max(min_width).min(max_cols);
    let height = rect.height.max(MIN_HEIGHT).min(max_rows);
    Rect::new(
        rect.x.min(max_cols - width),
        rect.y.min(max_rows - height),
        width,
        height,
    )
}
