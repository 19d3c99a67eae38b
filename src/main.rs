//! stackmux - a minimal stacking terminal multiplexer
//!
//! stackmux keeps several shells alive in overlapping bordered windows on
//! one terminal. Exactly one window has focus and receives the keyboard;
//! Esc-prefixed chords manage the windows themselves.
//!
//! # Features
//!
//! - **Overlapping Windows**: freely placed, raised on focus
//! - **One Shell per Window**: each window drives its own pty
//! - **Focus Ring**: windows cycle in creation order
//! - **Move/Resize Modes**: grab the focused window and steer it with arrows
//!
//! # Keybindings (Esc prefix; holding Alt works the same)
//!
//! | Key | Action |
//! |-----|--------|
//! | Esc Tab | Focus next window |
//! | Esc F1 | Move mode (arrows move, Enter exits) |
//! | Esc F2 | Resize mode (arrows resize, Enter exits) |
//! | Esc F8 | New window |
//! | Esc F12 | Quit |
//!
//! Any other key after Esc cancels the prefix. Windows close when their
//! shell exits.
//!
//! Configuration: ~/.stackmux/config.toml

mod config;
mod core;
mod ui;
mod wm;

use std::env;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, KeyEventKind};
use nix::sys::signal::{signal, SigHandler, Signal};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::ui::input::{Action, InputState};
use crate::ui::Screen;
use crate::wm::WindowManager;

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Status line once the last window is gone.
const EMPTY_HINT: &str = "No windows, press <ESC><F8> to open one or <ESC><F12> to quit";

/// Route tracing output to ~/.stackmux/stackmux.log; stdout belongs to the
/// composited frames. Best-effort: no log file, no logs.
fn init_logging() {
    let Some(log_path) = config::state_dir().map(|dir| dir.join("stackmux.log")) else {
        return;
    };

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

/// Signal setup. Ctrl+C must reach the focused shell as a byte, never kill
/// the multiplexer, so SIGINT is ignored here (children restore the default
/// before exec). SIGHUP and SIGTERM raise a flag the frame loop exits on.
fn init_signals() -> anyhow::Result<Arc<AtomicBool>> {
    unsafe { signal(Signal::SIGINT, SigHandler::SigIgn) }?;

    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGHUP, Arc::clone(&shutdown))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&shutdown))?;
    Ok(shutdown)
}

/// Open a window with the configured defaults. Raw mode is dropped around
/// the fork so the shell starts against a sane tty. Failure is not fatal;
/// the multiplexer keeps running with the windows it has.
fn open_window(wm: &mut WindowManager, screen: &Screen, config: &Config) {
    let _ = screen.suspend();
    let opened = wm.create_window(&config.window_spec());
    let _ = screen.resume();
    if let Err(e) = opened {
        error!("could not open window: {}", e);
    }
}

/// The frame loop: poll for one event, apply it, drain every shell, redraw
/// when something changed. Idle ticks draw nothing.
fn run(
    wm: &mut WindowManager,
    screen: &mut Screen,
    config: &Config,
    shutdown: &AtomicBool,
) -> anyhow::Result<()> {
    let poll_timeout = Duration::from_millis(10);
    let mut input = InputState::new();
    let mut dirty = true;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("shutdown signal received");
            break;
        }

        match screen.poll_event(poll_timeout)? {
            Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                match input.dispatch(&key) {
                    Action::None => {}
                    Action::Forward(bytes) => wm.write_focused(&bytes),
                    Action::FocusNext => wm.focus_next(),
                    Action::OpenWindow => open_window(wm, screen, config),
                    Action::Move { dx, dy } => wm.move_focused(dx, dy),
                    Action::Resize { dw, dh } => wm.resize_focused(dw, dh),
                    Action::Terminate => {
                        info!("terminate requested");
                        break;
                    }
                }
                dirty = true;
            }
            Some(Event::Resize(cols, rows)) => {
                info!("terminal resized to {}x{}", cols, rows);
                screen.set_size(cols, rows);
                wm.set_screen_size(cols, rows);
                dirty = true;
            }
            Some(_) | None => {}
        }

        if wm.pump_all() {
            dirty = true;
        }

        if dirty {
            let status = input
                .status_line()
                .or_else(|| wm.is_empty().then_some(EMPTY_HINT));
            screen.render(wm, status)?;
            dirty = false;
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging();
    info!("stackmux {} starting", VERSION);

    let shutdown = init_signals()?;
    let config = Config::load();

    // Child processes can detect they run inside stackmux.
    env::set_var("STACKMUX", "1");
    env::set_var("STACKMUX_VERSION", VERSION);

    let (cols, rows) = Screen::size()?;
    info!("terminal size {}x{}", cols, rows);

    let mut screen = Screen::new(cols, rows);
    screen.init()?;

    print!("\x1b]0;stackmux\x07");
    let _ = std::io::stdout().flush();

    let mut wm = WindowManager::new(cols, rows);
    open_window(&mut wm, &screen, &config);

    let result = run(&mut wm, &mut screen, &config, &shutdown);

    // Teardown runs on the error path too: hang up and reap every shell,
    // then restore the host terminal.
    wm.close_all();
    let _ = screen.cleanup();
    info!("stackmux exiting");
    result
}
