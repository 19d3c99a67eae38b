//! Window management - overlapping windows, focus, and stacking.
//!
//! This module provides the session state of the multiplexer:
//!
//! - **manager**: Top-level `WindowManager` coordinating all windows
//! - **window**: A bordered window wrapping one shell session
//! - **ring**: Focus traversal order over live window ids
//!
//! # Module Hierarchy
//!
//! ```text
//! wm/
//! ├── mod.rs      - Module exports
//! ├── manager.rs  - WindowManager (arena, focus, render stack)
//! ├── window.rs   - Window (frame + content surfaces + session)
//! └── ring.rs     - FocusRing (creation-order traversal)
//! ```

pub mod manager;
pub mod ring;
pub mod window;

pub use manager::{WindowManager, WindowSpec};
pub use window::{TitleColor, Window, WindowId};
