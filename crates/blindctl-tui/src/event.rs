//! Event handling for the blindctl TUI.
//!
//! Converts key presses into [`AppEvent`]s. The mapping depends on the
//! [`InputMode`]: text prompts and confirmations capture the keyboard.

use blindctl_panel::Movement;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::view::View;

/// Application-level events that can trigger state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Switch to a specific view
    SwitchView(View),
    /// Cycle to the next view
    NextView,
    /// Cycle to the previous view
    PrevView,
    ShowHelp,
    HideHelp,
    Quit,
    /// Force quit (Ctrl+C)
    ForceQuit,
    /// Reload the channel list, or rescan networks on the network view
    Refresh,
    /// Cancel current prompt or overlay
    Cancel,
    NavigateUp,
    NavigateDown,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,
    /// Enter on the selected row
    Select,
    /// Send a movement to the selected channel
    Move(Movement),
    /// Enable or disable the selected channel
    ToggleEnabled,
    /// Re-pair the selected channel (asks first)
    Prog,
    /// Reset the selected channel's rolling code (asks first)
    ResetRollingCode,
    Rename,
    Create,
    /// Delete the selected channel (asks first)
    Delete,
    /// Restart the device (asks first)
    RestartDevice,
    /// Reopen a closed log socket
    ReconnectLog,
    CycleTheme,
    /// Answer yes to a confirmation
    Confirm,
    /// Text input character
    TextInput(char),
    Backspace,
    /// Submit text input
    Submit,
    /// No action needed
    None,
}

/// What the keyboard is currently driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// A text prompt has focus
    Text,
    /// A yes/no question is open
    Confirm,
}

/// Input handler for converting key events to app events.
#[derive(Debug, Default)]
pub struct InputHandler {
    mode: InputMode,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Handle a key event and return the corresponding app event.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppEvent {
        // Ctrl+C always force quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppEvent::ForceQuit;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('l') {
            return AppEvent::Refresh;
        }

        // Escape leaves any prompt
        if key.code == KeyCode::Esc {
            self.mode = InputMode::Normal;
            return AppEvent::Cancel;
        }

        match self.mode {
            InputMode::Text => self.handle_text_input(key),
            InputMode::Confirm => self.handle_confirm(key),
            InputMode::Normal => self.handle_normal_mode(key),
        }
    }

    fn handle_text_input(&self, key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Enter => AppEvent::Submit,
            KeyCode::Backspace => AppEvent::Backspace,
            KeyCode::Char(c) => AppEvent::TextInput(c),
            _ => AppEvent::None,
        }
    }

    fn handle_confirm(&mut self, key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.mode = InputMode::Normal;
                AppEvent::Confirm
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.mode = InputMode::Normal;
                AppEvent::Cancel
            }
            _ => AppEvent::None,
        }
    }

    fn handle_normal_mode(&mut self, key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => AppEvent::Quit,

            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') => AppEvent::ShowHelp,

            // View navigation hotkeys
            KeyCode::Char('c') | KeyCode::Char('C') => AppEvent::SwitchView(View::Channels),
            KeyCode::Char('l') | KeyCode::Char('L') => AppEvent::SwitchView(View::Logs),
            KeyCode::Char('n') | KeyCode::Char('N') => AppEvent::SwitchView(View::Network),

            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    AppEvent::PrevView
                } else {
                    AppEvent::NextView
                }
            }
            KeyCode::BackTab => AppEvent::PrevView,

            // List navigation
            KeyCode::Up | KeyCode::Char('k') => AppEvent::NavigateUp,
            KeyCode::Down | KeyCode::Char('j') => AppEvent::NavigateDown,
            KeyCode::PageUp => AppEvent::PageUp,
            KeyCode::PageDown => AppEvent::PageDown,
            KeyCode::Home | KeyCode::Char('g') => AppEvent::GoToTop,
            KeyCode::End | KeyCode::Char('G') => AppEvent::GoToBottom,
            KeyCode::Enter => AppEvent::Select,

            // Channel commands
            KeyCode::Char('u') | KeyCode::Char('U') => AppEvent::Move(Movement::Up),
            KeyCode::Char('d') | KeyCode::Char('D') => AppEvent::Move(Movement::Down),
            KeyCode::Char('s') | KeyCode::Char('S') => AppEvent::Move(Movement::Stop),
            KeyCode::Char(' ') => AppEvent::ToggleEnabled,
            KeyCode::Char('p') | KeyCode::Char('P') => AppEvent::Prog,
            KeyCode::Char('z') | KeyCode::Char('Z') => AppEvent::ResetRollingCode,
            KeyCode::Char('e') | KeyCode::Char('E') => AppEvent::Rename,
            KeyCode::Char('a') | KeyCode::Char('A') => AppEvent::Create,
            KeyCode::Delete | KeyCode::Char('x') | KeyCode::Char('X') => AppEvent::Delete,

            KeyCode::Char('r') | KeyCode::Char('R') => AppEvent::Refresh,
            KeyCode::Char('o') | KeyCode::Char('O') => AppEvent::ReconnectLog,
            KeyCode::Char('t') | KeyCode::Char('T') => AppEvent::CycleTheme,

            // Uppercase only: restarting drops every connection
            KeyCode::Char('B') => AppEvent::RestartDevice,

            _ => AppEvent::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn key_event_with_mods(code: KeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, mods)
    }

    #[test]
    fn test_view_hotkeys() {
        let mut handler = InputHandler::new();

        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('c'))),
            AppEvent::SwitchView(View::Channels)
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('L'))),
            AppEvent::SwitchView(View::Logs)
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('n'))),
            AppEvent::SwitchView(View::Network)
        );
    }

    #[test]
    fn test_channel_commands() {
        let mut handler = InputHandler::new();

        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('u'))),
            AppEvent::Move(Movement::Up)
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('d'))),
            AppEvent::Move(Movement::Down)
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('s'))),
            AppEvent::Move(Movement::Stop)
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char(' '))),
            AppEvent::ToggleEnabled
        );
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('p'))), AppEvent::Prog);
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('z'))),
            AppEvent::ResetRollingCode
        );
        assert_eq!(handler.handle_key(key_event(KeyCode::Delete)), AppEvent::Delete);
    }

    #[test]
    fn test_restart_needs_uppercase() {
        let mut handler = InputHandler::new();

        assert_eq!(handler.handle_key(key_event(KeyCode::Char('b'))), AppEvent::None);
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('B'))),
            AppEvent::RestartDevice
        );
    }

    #[test]
    fn test_text_mode_captures_hotkeys() {
        let mut handler = InputHandler::new();
        handler.set_mode(InputMode::Text);

        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('q'))),
            AppEvent::TextInput('q')
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Backspace)),
            AppEvent::Backspace
        );
        assert_eq!(handler.handle_key(key_event(KeyCode::Enter)), AppEvent::Submit);
        assert_eq!(handler.mode(), InputMode::Text);
    }

    #[test]
    fn test_escape_leaves_text_mode() {
        let mut handler = InputHandler::new();
        handler.set_mode(InputMode::Text);

        assert_eq!(handler.handle_key(key_event(KeyCode::Esc)), AppEvent::Cancel);
        assert_eq!(handler.mode(), InputMode::Normal);
    }

    #[test]
    fn test_confirm_mode() {
        let mut handler = InputHandler::new();
        handler.set_mode(InputMode::Confirm);

        // Unrelated keys do nothing while a question is open
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('u'))), AppEvent::None);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('y'))), AppEvent::Confirm);
        assert_eq!(handler.mode(), InputMode::Normal);

        handler.set_mode(InputMode::Confirm);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('n'))), AppEvent::Cancel);
        assert_eq!(handler.mode(), InputMode::Normal);
    }

    #[test]
    fn test_ctrl_c_force_quit() {
        let mut handler = InputHandler::new();

        assert_eq!(
            handler.handle_key(key_event_with_mods(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            AppEvent::ForceQuit
        );

        // Also works while typing
        handler.set_mode(InputMode::Text);
        assert_eq!(
            handler.handle_key(key_event_with_mods(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            AppEvent::ForceQuit
        );
    }

    #[test]
    fn test_tab_cycling() {
        let mut handler = InputHandler::new();

        assert_eq!(handler.handle_key(key_event(KeyCode::Tab)), AppEvent::NextView);
        assert_eq!(
            handler.handle_key(key_event_with_mods(KeyCode::Tab, KeyModifiers::SHIFT)),
            AppEvent::PrevView
        );
        assert_eq!(handler.handle_key(key_event(KeyCode::BackTab)), AppEvent::PrevView);
    }

    #[test]
    fn test_navigation_keys() {
        let mut handler = InputHandler::new();

        assert_eq!(handler.handle_key(key_event(KeyCode::Up)), AppEvent::NavigateUp);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('j'))), AppEvent::NavigateDown);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('g'))), AppEvent::GoToTop);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('G'))), AppEvent::GoToBottom);
    }

    #[test]
    fn test_help_and_quit() {
        let mut handler = InputHandler::new();

        assert_eq!(handler.handle_key(key_event(KeyCode::Char('?'))), AppEvent::ShowHelp);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('Q'))), AppEvent::Quit);
    }
}
