//! PTY session wrapper for Unix
//!
//! This module provides a safe wrapper around `forkpty` for creating and
//! managing pseudo-terminal sessions. The master side is switched to
//! non-blocking immediately after the fork so the frame loop can drain it
//! on every tick without stalling.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::OwnedFd;
use std::thread;
use std::time::Duration;

use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::pty::{forkpty, ForkptyResult, Winsize};
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use thiserror::Error;

use super::shell::exec_shell;

/// Bytes drained from a master per pump call.
pub const READ_CHUNK: usize = 1023;

#[derive(Error, Debug)]
pub enum PtyError {
    #[error("failed to fork pty: {0}")]
    Spawn(#[source] nix::Error),

    #[error("failed to set pty master non-blocking: {0}")]
    Nonblock(#[source] nix::Error),
}

pub type Result<T> = std::result::Result<T, PtyError>;

/// Result of a single non-blocking drain of the master fd.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drained {
    /// `n` bytes were read into the caller's buffer.
    Bytes(usize),
    /// Nothing buffered right now; the child is still attached.
    Empty,
    /// The child side is gone (EOF or unrecoverable read error).
    Closed,
}

/// One shell process on its own pty.
pub struct PtySession {
    /// Master side of the pty; `None` once hung up.
    master: Option<File>,
    child: Pid,
    /// Input the master would not accept yet (EAGAIN), retried each tick.
    pending: Vec<u8>,
    reaped: bool,
}

impl PtySession {
    /// Fork a child on a fresh pty and exec `command` in it.
    ///
    /// The initial terminal size is the window's full geometry and is not
    /// updated afterwards. The caller must suspend any raw-mode screen
    /// state around this call and restore it in the parent branch.
    pub fn spawn(rows: u16, cols: u16, command: &str) -> Result<PtySession> {
        let winsize = Winsize {
            ws_row: rows,
            ws_col: cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };

        // SAFETY: the child branch calls nothing but async-signal-safe
        // functions before exec (disposition reset and execvp).
        let fork = unsafe { forkpty(Some(&winsize), None) }.map_err(PtyError::Spawn)?;
        match fork {
            ForkptyResult::Child => exec_shell(command),
            ForkptyResult::Parent { child, master } => {
                if let Err(e) = set_nonblocking(&master) {
                    // Do not leave a child behind on the error path.
                    let _ = kill(child, Signal::SIGKILL);
                    let _ = waitpid(child, None);
                    return Err(e);
                }

                Ok(PtySession {
                    master: Some(File::from(master)),
                    child,
                    pending: Vec::new(),
                    reaped: false,
                })
            }
        }
    }

    /// Queue `bytes` for the child and push as much as the master accepts.
    ///
    /// A full pty buffer (EAGAIN) keeps the remainder queued; it is retried
    /// on the next tick rather than treated as an error.
    pub fn write_input(&mut self, bytes: &[u8]) {
        if self.master.is_none() {
            return;
        }
        self.pending.extend_from_slice(bytes);
        self.flush_pending();
    }

    /// Retry any queued input the master previously refused.
    pub fn flush_pending(&mut self) {
        while !self.pending.is_empty() {
            let Some(master) = self.master.as_mut() else {
                self.pending.clear();
                return;
            };
            match master.write(&self.pending) {
                Ok(0) => return,
                Ok(n) => {
                    self.pending.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => {
                    // EPIPE/EIO: the child is gone; pump() will say Closed.
                    self.pending.clear();
                    self.master = None;
                    return;
                }
            }
        }
    }

    /// Drain at most `buf.len()` bytes of child output without blocking.
    ///
    /// `Empty` (nothing buffered) and `Closed` (child exited) are distinct:
    /// the first is the normal idle-tick result, the second tells the owner
    /// to tear the session down.
    pub fn pump(&mut self, buf: &mut [u8]) -> Drained {
        self.flush_pending();
        let Some(master) = self.master.as_mut() else {
            return Drained::Closed;
        };
        match master.read(buf) {
            // A zero-length read on a pty master is end-of-file.
            Ok(0) => Drained::Closed,
            Ok(n) => Drained::Bytes(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Drained::Empty,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Drained::Empty,
            // Linux reports EIO on the master once the child side is gone.
            Err(_) => Drained::Closed,
        }
    }

    /// Close our side of the pty and ask the child to hang up.
    ///
    /// Safe to call more than once. The fd goes first so the child sees the
    /// hangup on its controlling terminal before the signal lands.
    pub fn hangup(&mut self) {
        self.pending.clear();
        self.master = None;
        if !self.reaped {
            let _ = kill(self.child, Signal::SIGHUP);
        }
    }

    /// Wait for the child, escalating to SIGKILL if it ignores the hangup.
    pub fn reap(&mut self) {
        if self.reaped {
            return;
        }
        for _ in 0..10 {
            match waitpid(self.child, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => thread::sleep(Duration::from_millis(5)),
                _ => {
                    self.reaped = true;
                    return;
                }
            }
        }
        let _ = kill(self.child, Signal::SIGKILL);
        let _ = waitpid(self.child, None);
        self.reaped = true;
    }

    /// Full close-terminate-reap sequence for one session.
    pub fn shutdown(&mut self) {
        self.hangup();
        self.reap();
    }

    /// Whether our master fd is still open (the child may still be exiting).
    pub fn is_open(&self) -> bool {
        self.master.is_some()
    }

    #[allow(dead_code)]
    pub fn child_pid(&self) -> Pid {
        self.child
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        if !self.reaped {
            self.shutdown();
        }
    }
}

fn set_nonblocking(fd: &OwnedFd) -> Result<()> {
    let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(PtyError::Nonblock)?;
    let mut flags = OFlag::from_bits_truncate(flags);
    flags.insert(OFlag::O_NONBLOCK);
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(PtyError::Nonblock)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn pump_until(session: &mut PtySession, deadline: Duration) -> Vec<u8> {
        let mut collected = Vec::new();
        let mut buf = [0u8; READ_CHUNK];
        let start = Instant::now();
        while start.elapsed() < deadline {
            match session.pump(&mut buf) {
                Drained::Bytes(n) => collected.extend_from_slice(&buf[..n]),
                Drained::Empty => thread::sleep(Duration::from_millis(10)),
                Drained::Closed => break,
            }
        }
        collected
    }

    #[test]
    fn test_spawn_is_idle_not_closed() {
        let mut session = PtySession::spawn(24, 80, "/bin/cat").unwrap();
        let mut buf = [0u8; READ_CHUNK];
        assert_eq!(session.pump(&mut buf), Drained::Empty);
        session.shutdown();
        assert!(!session.is_open());
    }

    #[test]
    fn test_roundtrip_through_child() {
        let mut session = PtySession::spawn(24, 80, "/bin/cat").unwrap();
        session.write_input(b"ping\n");
        let out = pump_until(&mut session, Duration::from_secs(2));
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("ping"), "child output was {text:?}");
        session.shutdown();
    }

    #[test]
    fn test_child_exit_reports_closed() {
        let mut session = PtySession::spawn(24, 80, "/bin/true").unwrap();
        let mut buf = [0u8; READ_CHUNK];
        let start = Instant::now();
        let mut saw_closed = false;
        while start.elapsed() < Duration::from_secs(2) {
            match session.pump(&mut buf) {
                Drained::Closed => {
                    saw_closed = true;
                    break;
                }
                _ => thread::sleep(Duration::from_millis(10)),
            }
        }
        assert!(saw_closed, "exited child never reported Closed");
        session.shutdown();
    }

    #[test]
    fn test_write_after_hangup_is_noop() {
        let mut session = PtySession::spawn(24, 80, "/bin/cat").unwrap();
        session.hangup();
        session.write_input(b"x");
        let mut buf = [0u8; READ_CHUNK];
        assert_eq!(session.pump(&mut buf), Drained::Closed);
        session.reap();
    }
}
