//! Window manager - owns every live window plus the focus and stacking state
//!
//! All session state lives in [`WindowManager`]: the window arena, the focus
//! ring, the bottom-to-top render stack, the focused window id, and the
//! recorded screen size. Window ids count up from 1 and are never reused, so
//! a stale id is absent from the arena rather than pointing at some newer
//! window.
//!
//! The bottom screen row is reserved for the status line; windows live in
//! the rows above it.

use std::collections::HashMap;

use tracing::info;

use crate::core::pty::{Drained, PtySession, READ_CHUNK};
use crate::ui::surface::Rect;

use super::ring::FocusRing;
use super::window::{clamp_rect, min_frame_width, titlebar_text, TitleColor, Window, WindowId};

/// Parameters for a new window.
#[derive(Debug, Clone)]
pub struct WindowSpec {
    pub title: String,
    pub title_color: TitleColor,
    pub rect: Rect,
    pub shell: String,
}

/// The arena of live windows and the focus/stacking order over them.
pub struct WindowManager {
    /// Live windows by id
    windows: HashMap<WindowId, Window>,
    /// Focus traversal order (creation order, oldest first)
    ring: FocusRing,
    /// Render order, bottom to top
    stack: Vec<WindowId>,
    /// Focused window; always the top of the render stack
    focused: Option<WindowId>,
    /// Next id to hand out; never reused
    next_id: WindowId,
    /// Host terminal size in cells
    cols: u16,
    rows: u16,
}

impl WindowManager {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            windows: HashMap::new(),
            ring: FocusRing::new(),
            stack: Vec::new(),
            focused: None,
            next_id: 1,
            cols,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.focused
    }

    pub fn focused_window(&self) -> Option<&Window> {
        self.focused.and_then(|id| self.windows.get(&id))
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id)
    }

    /// Windows from bottom to top, for compositing.
    pub fn stacked(&self) -> impl Iterator<Item = &Window> + '_ {
        self.stack.iter().filter_map(|id| self.windows.get(id))
    }

    /// Rows available to windows; the bottom row belongs to the status line.
    fn usable_rows(&self) -> u16 {
        self.rows.saturating_sub(1)
    }

    /// Spawn a shell and open a window for it. The new window is focused and
    /// placed on top. The pty is sized to the window's full outer geometry.
    ///
    /// On failure nothing is registered and the id is not consumed.
    pub fn create_window(&mut self, spec: &WindowSpec) -> crate::core::pty::Result<WindowId> {
        let id = self.next_id;
        let title = titlebar_text(&spec.title, id);
        let rect = clamp_rect(spec.rect, min_frame_width(&title), self.cols, self.usable_rows());

        let session = PtySession::spawn(rect.height, rect.width, &spec.shell)?;
        info!("window {} opened at {:?} running {}", id, rect, spec.shell);

        self.windows.insert(id, Window::new(id, title, spec.title_color, rect, session));
        self.ring.insert(id);
        self.stack.push(id);
        self.focused = Some(id);
        self.next_id += 1;
        Ok(id)
    }

    /// Bring `id` to the top of the render stack and focus it. Ring order
    /// is untouched; raising never reorders traversal.
    pub fn raise(&mut self, id: WindowId) {
        if !self.windows.contains_key(&id) {
            return;
        }
        self.stack.retain(|&w| w != id);
        self.stack.push(id);
        self.focused = Some(id);
    }

    /// Advance focus to the ring successor of the focused window and raise
    /// it. From the newest window this wraps to the oldest still alive.
    pub fn focus_next(&mut self) {
        let target = match self.focused {
            Some(current) => self.ring.next(current),
            None => self.ring.oldest(),
        };
        if let Some(id) = target {
            self.raise(id);
        }
    }

    /// Close a window: shut down its shell, splice it out of the ring and
    /// stack, and drop its surfaces and record. If it was focused, focus
    /// passes to its ring successor.
    pub fn close(&mut self, id: WindowId) {
        let successor = self.ring.next(id).filter(|&next| next != id);
        let Some(mut window) = self.windows.remove(&id) else {
            return;
        };
        window.session.shutdown();
        self.ring.remove(id);
        self.stack.retain(|&w| w != id);
        if self.focused == Some(id) {
            self.focused = None;
            if let Some(next) = successor {
                self.raise(next);
            }
        }
        info!("window {} closed", id);
    }

    /// Move the focused window one step, keeping it fully on screen.
    pub fn move_focused(&mut self, dx: i32, dy: i32) {
        let (cols, rows) = (self.cols, self.usable_rows());
        let Some(window) = self.focused_window_mut() else {
            return;
        };
        let rect = window.rect();
        let requested = Rect::new(
            (rect.x as i32 + dx).max(0) as u16,
            (rect.y as i32 + dy).max(0) as u16,
            rect.width,
            rect.height,
        );
        let min_width = window.min_width();
        window.apply_rect(clamp_rect(requested, min_width, cols, rows));
    }

    /// Grow or shrink the focused window one step, clamped to the screen
    /// and to the window's minimum size.
    pub fn resize_focused(&mut self, dw: i32, dh: i32) {
        let (cols, rows) = (self.cols, self.usable_rows());
        let Some(window) = self.focused_window_mut() else {
            return;
        };
        let rect = window.rect();
        let requested = Rect::new(
            rect.x,
            rect.y,
            (rect.width as i32 + dw).max(1) as u16,
            (rect.height as i32 + dh).max(1) as u16,
        );
        let min_width = window.min_width();
        window.apply_rect(clamp_rect(requested, min_width, cols, rows));
    }

    /// Route keyboard bytes to the focused window's shell.
    pub fn write_focused(&mut self, bytes: &[u8]) {
        if let Some(window) = self.focused_window_mut() {
            window.session.write_input(bytes);
        }
    }

    /// Drain pending output from every live session into its window, one
    /// chunk per window per tick. Windows whose shell has exited are closed
    /// here. Returns true if anything on screen may have changed.
    pub fn pump_all(&mut self) -> bool {
        let mut buf = [0u8; READ_CHUNK];
        let mut dirty = false;
        let mut dead: Vec<WindowId> = Vec::new();
        for (&id, window) in self.windows.iter_mut() {
            match window.session.pump(&mut buf) {
                Drained::Bytes(n) => {
                    window.feed_output(&buf[..n]);
                    dirty = true;
                }
                Drained::Empty => {}
                Drained::Closed => dead.push(id),
            }
        }
        for id in dead {
            info!("window {} shell exited", id);
            self.close(id);
            dirty = true;
        }
        dirty
    }

    /// Record a new host terminal size and pull every window back inside it.
    pub fn set_screen_size(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        let max_rows = self.usable_rows();
        for window in self.windows.values_mut() {
            let min_width = window.min_width();
            window.apply_rect(clamp_rect(window.rect(), min_width, cols, max_rows));
        }
    }

    /// Shut everything down: hang up every shell first so they all exit in
    /// parallel, then reap them, then drop all window state.
    pub fn close_all(&mut self) {
        for window in self.windows.values_mut() {
            window.session.hangup();
        }
        for window in self.windows.values_mut() {
            window.session.reap();
        }
        self.windows.clear();
        self.stack.clear();
        self.ring = FocusRing::new();
        self.focused = None;
    }

    fn focused_window_mut(&mut self) -> Option<&mut Window> {
        let id = self.focused?;
        self.windows.get_mut(&id)
    }
}
