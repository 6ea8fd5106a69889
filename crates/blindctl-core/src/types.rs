//! Shared type definitions used across blindctl crates.
//!
//! These mirror the JSON records exchanged with the device so every crate
//! agrees on field names and defaults.

use serde::{Deserialize, Serialize};

/// Maximum length of a channel name, in characters.
pub const MAX_NAME_LEN: usize = 15;

/// Backend-assigned identifier of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u32);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ChannelId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// One emulated remote paired to a motorized blind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Stable identifier, immutable once assigned
    pub id: ChannelId,
    /// Display name
    pub name: String,
    /// Whether movement/prog/reset are allowed
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Mirror of the RF replay-protection counter
    #[serde(default)]
    pub rolling_code: u32,
}

fn default_enabled() -> bool {
    true
}

impl Channel {
    /// Create an enabled channel with a zero rolling code.
    pub fn new(id: impl Into<ChannelId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: true,
            rolling_code: 0,
        }
    }

    /// Builder-style setter for the rolling code.
    pub fn with_rolling_code(mut self, rolling_code: u32) -> Self {
        self.rolling_code = rolling_code;
        self
    }

    /// Builder-style setter for the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Partial update applied to a channel in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelPatch {
    pub name: Option<String>,
    pub enabled: Option<bool>,
    pub rolling_code: Option<u32>,
}

impl ChannelPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Default::default()
        }
    }

    pub fn rolling_code(rolling_code: u32) -> Self {
        Self {
            rolling_code: Some(rolling_code),
            ..Default::default()
        }
    }

    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.enabled.is_none() && self.rolling_code.is_none()
    }

    /// Apply the set fields to `channel`, leaving the others untouched.
    pub fn apply(&self, channel: &mut Channel) {
        if let Some(name) = &self.name {
            channel.name.clone_from(name);
        }
        if let Some(enabled) = self.enabled {
            channel.enabled = enabled;
        }
        if let Some(rolling_code) = self.rolling_code {
            channel.rolling_code = rolling_code;
        }
    }
}

/// Command sent to the device for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteAction {
    Up,
    Down,
    Stop,
    Prog,
    Reset,
    Enable,
    Disable,
}

impl RemoteAction {
    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stop => "stop",
            Self::Prog => "prog",
            Self::Reset => "reset",
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }

    /// Up, down and stop.
    pub fn is_movement(&self) -> bool {
        matches!(self, Self::Up | Self::Down | Self::Stop)
    }

    /// Actions that transmit an RF frame and so need an enabled channel.
    pub fn requires_enabled(&self) -> bool {
        matches!(
            self,
            Self::Up | Self::Down | Self::Stop | Self::Prog | Self::Reset
        )
    }

    /// Actions that advance the rolling code by one.
    pub fn advances_rolling_code(&self) -> bool {
        matches!(self, Self::Up | Self::Down | Self::Stop | Self::Prog)
    }

    /// Enable/disable action that moves a channel to `enabled`.
    pub fn toggle_to(enabled: bool) -> Self {
        if enabled { Self::Enable } else { Self::Disable }
    }
}

impl std::fmt::Display for RemoteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wi-Fi network seen by the device scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiNetwork {
    pub ssid: String,
    /// Signal strength in dBm
    pub rssi: i32,
}

/// Station credentials the device connects with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub ssid: String,
    #[serde(default)]
    pub password: String,
}

/// Clean an operator-typed channel name.
///
/// Leading and trailing whitespace is removed, each inner whitespace run is
/// collapsed to its last character, and the result is cut to
/// [`MAX_NAME_LEN`] characters.
pub fn clean_name(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut chars = raw.trim().chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_whitespace() && chars.peek().is_some_and(|next| next.is_whitespace()) {
            continue;
        }
        cleaned.push(c);
    }
    cleaned.chars().take(MAX_NAME_LEN).collect()
}
