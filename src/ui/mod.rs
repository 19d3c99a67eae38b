//! User interface rendering and input handling.
//!
//! This module provides all UI-related functionality:
//!
//! - **surface**: Cell grids for window frames and shell content
//! - **screen**: Back-buffer compositing and host terminal output
//! - **input**: The Esc-prefixed keyboard command state machine
//! - **keymapper**: Keyboard input to pty byte sequence mapping

pub mod input;
pub mod keymapper;
pub mod screen;
pub mod surface;

pub use input::{Action, InputState};
pub use keymapper::KeyMapper;
pub use screen::Screen;
pub use surface::{Rect, Surface};
