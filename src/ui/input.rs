//! Input dispatch - decides what each keypress means
//!
//! Keys normally pass straight through to the focused shell. Esc arms a
//! one-shot command prefix; the key after it picks a multiplexer command
//! instead of reaching the shell, and a second Esc just disarms it. F1/F2
//! switch into a grabbed mode where arrow keys move or resize the focused
//! window until Enter releases it.
//!
//! ALT works as an escape prefix too: terminals send Alt+key as ESC
//! followed by the key, and the dispatcher treats the modifier the same
//! way, so Alt+Tab and Esc Tab are one command.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::keymapper::KeyMapper;

/// What a grabbed window follows: the arrows move it or resize it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grab {
    Move,
    Resize,
}

/// Dispatcher mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Keys go to the focused shell
    Normal,
    /// Esc seen; the next key picks a command
    EscapePending,
    /// Arrows steer the focused window until Enter
    MoveResize(Grab),
}

/// What the frame loop should do with a keypress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Nothing, or the key only changed dispatcher state
    None,
    /// Write these bytes to the focused shell
    Forward(Vec<u8>),
    /// Focus the next window in the ring
    FocusNext,
    /// Open a new window
    OpenWindow,
    /// Shift the focused window by one cell
    Move { dx: i32, dy: i32 },
    /// Grow or shrink the focused window by one cell
    Resize { dw: i32, dh: i32 },
    /// Shut down the multiplexer
    Terminate,
}

/// The keyboard state machine.
pub struct InputState {
    mode: Mode,
}

impl InputState {
    pub fn new() -> Self {
        Self { mode: Mode::Normal }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Status line owed to the current mode, if any.
    pub fn status_line(&self) -> Option<&'static str> {
        match self.mode {
            Mode::MoveResize(Grab::Move) => Some("Moving mode, press <ENTER> to exit"),
            Mode::MoveResize(Grab::Resize) => Some("Resizing mode, press <ENTER> to exit"),
            _ => None,
        }
    }

    /// Feed one keypress through the state machine.
    pub fn dispatch(&mut self, key: &KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::ALT) {
            // Alt+key is Esc followed by the key. The Esc step never
            // produces an action of its own.
            let _ = self.step(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
            let stripped = KeyEvent::new(key.code, key.modifiers.difference(KeyModifiers::ALT));
            return self.step(&stripped);
        }
        self.step(key)
    }

    fn step(&mut self, key: &KeyEvent) -> Action {
        match self.mode {
            Mode::Normal => match key.code {
                KeyCode::Esc => {
                    self.mode = Mode::EscapePending;
                    Action::None
                }
                _ => match KeyMapper::map(key) {
                    Some(bytes) => Action::Forward(bytes),
                    None => Action::None,
                },
            },

            Mode::EscapePending => match key.code {
                // A second Esc toggles the prefix back off.
                KeyCode::Esc => {
                    self.mode = Mode::Normal;
                    Action::None
                }
                KeyCode::Tab => {
                    self.mode = Mode::Normal;
                    Action::FocusNext
                }
                KeyCode::F(1) => {
                    self.mode = Mode::MoveResize(Grab::Move);
                    Action::None
                }
                KeyCode::F(2) => {
                    self.mode = Mode::MoveResize(Grab::Resize);
                    Action::None
                }
                // Stays pending, so Esc F8 F8 opens two windows.
                KeyCode::F(8) => Action::OpenWindow,
                KeyCode::F(12) => Action::Terminate,
                // Any other key cancels the prefix and is swallowed, not
                // forwarded to the shell.
                _ => {
                    self.mode = Mode::Normal;
                    Action::None
                }
            },

            Mode::MoveResize(grab) => match key.code {
                KeyCode::Enter => {
                    self.mode = Mode::Normal;
                    Action::None
                }
                KeyCode::Up => Self::steer(grab, 0, -1),
                KeyCode::Down => Self::steer(grab, 0, 1),
                KeyCode::Left => Self::steer(grab, -1, 0),
                KeyCode::Right => Self::steer(grab, 1, 0),
                // Everything else, Esc included, is ignored until Enter.
                _ => Action::None,
            },
        }
    }

    fn steer(grab: Grab, dx: i32, dy: i32) -> Action {
        match grab {
            Grab::Move => Action::Move { dx, dy },
            Grab::Resize => Action::Resize { dw: dx, dh: dy },
        }
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn armed() -> InputState {
        let mut state = InputState::new();
        state.dispatch(&key(KeyCode::Esc));
        state
    }

    #[test]
    fn test_plain_keys_forward() {
        let mut state = InputState::new();
        assert_eq!(state.dispatch(&key(KeyCode::Char('a'))), Action::Forward(b"a".to_vec()));
        assert_eq!(state.dispatch(&key(KeyCode::Tab)), Action::Forward(vec![0x09]));
        assert_eq!(state.mode(), Mode::Normal);
    }

    #[test]
    fn test_esc_arms_the_prefix() {
        let mut state = InputState::new();
        assert_eq!(state.dispatch(&key(KeyCode::Esc)), Action::None);
        assert_eq!(state.mode(), Mode::EscapePending);
    }

    #[test]
    fn test_esc_tab_cycles_focus() {
        let mut state = armed();
        assert_eq!(state.dispatch(&key(KeyCode::Tab)), Action::FocusNext);
        assert_eq!(state.mode(), Mode::Normal);
    }

    #[test]
    fn test_alt_tab_equals_esc_tab() {
        let mut state = InputState::new();
        let alt_tab = KeyEvent::new(KeyCode::Tab, KeyModifiers::ALT);
        assert_eq!(state.dispatch(&alt_tab), Action::FocusNext);
        assert_eq!(state.mode(), Mode::Normal);
    }

    #[test]
    fn test_alt_char_never_reaches_the_shell() {
        let mut state = InputState::new();
        let alt_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT);
        // The leading Esc arms the prefix and x is not a command, so the
        // whole chord is swallowed; no ESC-prefixed bytes go to the shell.
        assert_eq!(state.dispatch(&alt_x), Action::None);
        assert_eq!(state.mode(), Mode::Normal);
    }

    #[test]
    fn test_esc_esc_toggles_off() {
        let mut state = armed();
        assert_eq!(state.dispatch(&key(KeyCode::Esc)), Action::None);
        assert_eq!(state.mode(), Mode::Normal);
        // The prefix is gone; Tab is plain input again.
        assert_eq!(state.dispatch(&key(KeyCode::Tab)), Action::Forward(vec![0x09]));
    }

    #[test]
    fn test_alt_key_while_armed_acts_like_two_escapes() {
        let mut state = armed();
        let alt_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT);
        // Alt's leading Esc toggles the pending prefix off, then x forwards.
        assert_eq!(state.dispatch(&alt_x), Action::Forward(b"x".to_vec()));
        assert_eq!(state.mode(), Mode::Normal);
    }

    #[test]
    fn test_f8_opens_and_stays_armed() {
        let mut state = armed();
        assert_eq!(state.dispatch(&key(KeyCode::F(8))), Action::OpenWindow);
        assert_eq!(state.mode(), Mode::EscapePending);
        // A second F8 without another Esc opens another window.
        assert_eq!(state.dispatch(&key(KeyCode::F(8))), Action::OpenWindow);
    }

    #[test]
    fn test_f12_terminates() {
        let mut state = armed();
        assert_eq!(state.dispatch(&key(KeyCode::F(12))), Action::Terminate);
    }

    #[test]
    fn test_unbound_key_cancels_prefix_without_forwarding() {
        let mut state = armed();
        assert_eq!(state.dispatch(&key(KeyCode::Char('x'))), Action::None);
        assert_eq!(state.mode(), Mode::Normal);
        // The x was swallowed; the next one goes through.
        assert_eq!(state.dispatch(&key(KeyCode::Char('x'))), Action::Forward(b"x".to_vec()));
    }

    #[test]
    fn test_f1_enters_move_mode() {
        let mut state = armed();
        assert_eq!(state.dispatch(&key(KeyCode::F(1))), Action::None);
        assert_eq!(state.mode(), Mode::MoveResize(Grab::Move));
        assert_eq!(state.status_line(), Some("Moving mode, press <ENTER> to exit"));
    }

    #[test]
    fn test_f2_enters_resize_mode() {
        let mut state = armed();
        assert_eq!(state.dispatch(&key(KeyCode::F(2))), Action::None);
        assert_eq!(state.mode(), Mode::MoveResize(Grab::Resize));
        assert_eq!(state.status_line(), Some("Resizing mode, press <ENTER> to exit"));
    }

    #[test]
    fn test_move_mode_arrows() {
        let mut state = armed();
        state.dispatch(&key(KeyCode::F(1)));
        assert_eq!(state.dispatch(&key(KeyCode::Up)), Action::Move { dx: 0, dy: -1 });
        assert_eq!(state.dispatch(&key(KeyCode::Down)), Action::Move { dx: 0, dy: 1 });
        assert_eq!(state.dispatch(&key(KeyCode::Left)), Action::Move { dx: -1, dy: 0 });
        assert_eq!(state.dispatch(&key(KeyCode::Right)), Action::Move { dx: 1, dy: 0 });
        assert_eq!(state.mode(), Mode::MoveResize(Grab::Move));
    }

    #[test]
    fn test_resize_mode_arrows() {
        let mut state = armed();
        state.dispatch(&key(KeyCode::F(2)));
        assert_eq!(state.dispatch(&key(KeyCode::Up)), Action::Resize { dw: 0, dh: -1 });
        assert_eq!(state.dispatch(&key(KeyCode::Right)), Action::Resize { dw: 1, dh: 0 });
    }

    #[test]
    fn test_move_mode_swallows_text_and_esc() {
        let mut state = armed();
        state.dispatch(&key(KeyCode::F(1)));
        assert_eq!(state.dispatch(&key(KeyCode::Char('q'))), Action::None);
        assert_eq!(state.dispatch(&key(KeyCode::Esc)), Action::None);
        assert_eq!(state.mode(), Mode::MoveResize(Grab::Move));
    }

    #[test]
    fn test_enter_releases_the_grab() {
        let mut state = armed();
        state.dispatch(&key(KeyCode::F(2)));
        assert_eq!(state.dispatch(&key(KeyCode::Enter)), Action::None);
        assert_eq!(state.mode(), Mode::Normal);
        assert_eq!(state.status_line(), None);
        // Back to passthrough.
        assert_eq!(state.dispatch(&key(KeyCode::Char('a'))), Action::Forward(b"a".to_vec()));
    }

    #[test]
    fn test_alt_key_in_move_mode_is_ignored() {
        let mut state = armed();
        state.dispatch(&key(KeyCode::F(1)));
        let alt_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT);
        assert_eq!(state.dispatch(&alt_x), Action::None);
        assert_eq!(state.mode(), Mode::MoveResize(Grab::Move));
    }
}
