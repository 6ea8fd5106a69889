//! Color themes for the blindctl TUI.
//!
//! Themes switch at runtime with `T`; the choice lasts for the session.

use ratatui::style::Color;

/// Theme name identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeName {
    #[default]
    Default,
    /// Enhanced contrast
    Dark,
    /// For bright environments
    Light,
}

impl ThemeName {
    /// All available themes in cycle order.
    pub fn all() -> &'static [ThemeName] {
        &[ThemeName::Default, ThemeName::Dark, ThemeName::Light]
    }

    /// Get the next theme in the cycle.
    pub fn next(&self) -> ThemeName {
        let themes = Self::all();
        let current_idx = themes.iter().position(|t| t == self).unwrap_or(0);
        themes[(current_idx + 1) % themes.len()]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ThemeName::Default => "Default",
            ThemeName::Dark => "Dark",
            ThemeName::Light => "Light",
        }
    }
}

/// Color palette for a theme.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    /// Primary headers and focused borders
    pub header: Color,
    /// Hotkey hints
    pub hotkey: Color,
    /// Normal text
    pub text: Color,
    /// Secondary text (timestamps, dim info)
    pub text_dim: Color,
    /// Unfocused borders
    pub border_dim: Color,
    /// Selected row
    pub selection: Color,
    /// Open socket, acknowledged commands
    pub status_ok: Color,
    /// Reconnecting, requests in flight
    pub status_warning: Color,
    /// Failures and closed socket
    pub status_error: Color,
    /// Rows of disabled channels
    pub channel_disabled: Color,
}

/// Complete theme definition.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: ThemeName,
    pub colors: ThemeColors,
}

impl Theme {
    pub fn default_theme() -> Self {
        Self {
            name: ThemeName::Default,
            colors: ThemeColors {
                header: Color::Cyan,
                hotkey: Color::Yellow,
                text: Color::White,
                text_dim: Color::Gray,
                border_dim: Color::DarkGray,
                selection: Color::Yellow,
                status_ok: Color::Green,
                status_warning: Color::Yellow,
                status_error: Color::Red,
                channel_disabled: Color::Rgb(80, 80, 80),
            },
        }
    }

    pub fn dark_theme() -> Self {
        Self {
            name: ThemeName::Dark,
            colors: ThemeColors {
                header: Color::LightBlue,
                hotkey: Color::LightYellow,
                text: Color::White,
                text_dim: Color::DarkGray,
                border_dim: Color::Black,
                selection: Color::LightYellow,
                status_ok: Color::LightGreen,
                status_warning: Color::LightYellow,
                status_error: Color::LightRed,
                channel_disabled: Color::Rgb(60, 60, 60),
            },
        }
    }

    pub fn light_theme() -> Self {
        Self {
            name: ThemeName::Light,
            colors: ThemeColors {
                header: Color::Blue,
                hotkey: Color::DarkGray,
                text: Color::Black,
                text_dim: Color::DarkGray,
                border_dim: Color::Gray,
                selection: Color::Rgb(0, 100, 255),
                status_ok: Color::Green,
                status_warning: Color::Yellow,
                status_error: Color::Red,
                channel_disabled: Color::Rgb(160, 160, 160),
            },
        }
    }

    /// Get a theme by name.
    pub fn by_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Default => Self::default_theme(),
            ThemeName::Dark => Self::dark_theme(),
            ThemeName::Light => Self::light_theme(),
        }
    }

    /// Color for a signal strength reading in dBm.
    pub fn rssi_color(&self, rssi: i32) -> Color {
        if rssi >= -60 {
            self.colors.status_ok
        } else if rssi >= -75 {
            self.colors.status_warning
        } else {
            self.colors.status_error
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

/// Holds the active theme.
#[derive(Debug, Clone, Default)]
pub struct ThemeManager {
    current: Theme,
}

impl ThemeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Theme {
        &self.current
    }

    /// Switch to the next theme and return its name.
    pub fn cycle_theme(&mut self) -> ThemeName {
        let next = self.current.name.next();
        self.current = Theme::by_name(next);
        next
    }

    pub fn set_theme(&mut self, name: ThemeName) {
        self.current = Theme::by_name(name);
    }

    pub fn theme_name(&self) -> ThemeName {
        self.current.name
    }
}
