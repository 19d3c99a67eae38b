//! Child-side bootstrap run between `forkpty` and exec.

use std::ffi::CString;
use std::io::{self, Write};

use nix::sys::signal::{signal, SigHandler, Signal};
use nix::unistd::execvp;

/// Replace the forked child with `command`.
///
/// The parent ignores SIGINT and that disposition survives exec, so the
/// default is restored here first. `forkpty` already gave the child a fresh
/// session with the pty slave as its controlling terminal. Never returns;
/// on exec failure the child reports on stderr and exits 127.
pub fn exec_shell(command: &str) -> ! {
    // SAFETY: plain disposition reset in a freshly forked child.
    unsafe {
        let _ = signal(Signal::SIGINT, SigHandler::SigDfl);
    }

    if let Ok(prog) = CString::new(command) {
        let _ = execvp(&prog, &[prog.clone()]);
    }

    let _ = writeln!(io::stderr(), "stackmux: failed to exec {command}");
    // _exit, not exit: the child must not run the parent's atexit handlers.
    unsafe { libc::_exit(127) }
}
