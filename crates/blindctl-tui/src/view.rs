//! View types and navigation for the blindctl TUI.

use std::fmt;

/// Available screens.
///
/// Views are switched with their hotkey or cycled with Tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Channel table with a tail of the device log
    #[default]
    Channels,
    /// Full device log
    Logs,
    /// Wi-Fi scan results and network configuration
    Network,
}

impl View {
    /// Returns the hotkey character for this view.
    pub fn hotkey(&self) -> char {
        match self {
            View::Channels => 'c',
            View::Logs => 'l',
            View::Network => 'n',
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Channels => "Channels",
            View::Logs => "Logs",
            View::Network => "Network",
        }
    }

    /// Returns the hotkey hint for status bar display.
    pub fn hotkey_hint(&self) -> String {
        format!("[{}] {}", self.hotkey(), self.title())
    }

    /// All views in display order (for Tab cycling).
    pub const ALL: [View; 3] = [View::Channels, View::Logs, View::Network];

    /// Returns the next view in the cycle.
    pub fn next(&self) -> View {
        let idx = Self::ALL.iter().position(|v| v == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Returns the previous view in the cycle (for Shift+Tab navigation).
    pub fn prev(&self) -> View {
        let idx = Self::ALL.iter().position(|v| v == self).unwrap_or(0);
        if idx == 0 {
            Self::ALL[Self::ALL.len() - 1]
        } else {
            Self::ALL[idx - 1]
        }
    }

    /// Try to parse a view from a hotkey character.
    pub fn from_hotkey(key: char) -> Option<View> {
        match key.to_ascii_lowercase() {
            'c' => Some(View::Channels),
            'l' => Some(View::Logs),
            'n' => Some(View::Network),
            _ => None,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Layout mode based on terminal width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// 100+ cols: channel table and log tail side by side.
    Wide,
    /// Below 100 cols: log tail stacked under the table.
    Narrow,
}

impl LayoutMode {
    pub fn from_width(width: u16) -> Self {
        if width >= 100 {
            LayoutMode::Wide
        } else {
            LayoutMode::Narrow
        }
    }
}
