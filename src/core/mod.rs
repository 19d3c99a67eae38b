//! Core process plumbing.
//!
//! This module contains the OS-facing half of the multiplexer:
//!
//! - **pty**: `forkpty` wrapper with non-blocking master I/O
//! - **shell**: child-side bootstrap that execs the shell
//!
//! # Architecture
//!
//! ```text
//! PtySession
//! ├── master fd (non-blocking, pump/write each tick)
//! └── child pid (SIGHUP on close, reaped with waitpid)
//! ```

pub mod pty;
pub mod shell;
