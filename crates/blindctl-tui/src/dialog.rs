//! Text prompts and yes/no confirmations shown over the current view.

use blindctl_core::{ChannelId, MAX_NAME_LEN, RemoteAction};
use blindctl_panel::ConfirmationPrompt;

/// What a text prompt's answer is used for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    Rename(ChannelId),
    Create,
    WifiSsid,
    /// Second step of the network form
    WifiPassword { ssid: String },
}

/// Single-line text entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPrompt {
    kind: PromptKind,
    input: String,
}

impl TextPrompt {
    pub fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            input: String::new(),
        }
    }

    /// Start with `input` already typed.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    pub fn kind(&self) -> &PromptKind {
        &self.kind
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn push(&mut self, c: char) {
        if !c.is_control() {
            self.input.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    pub fn title(&self) -> String {
        match &self.kind {
            PromptKind::Rename(id) => format!("Rename channel {id}"),
            PromptKind::Create => "New channel".to_string(),
            PromptKind::WifiSsid => "Network SSID".to_string(),
            PromptKind::WifiPassword { ssid } => format!("Password for {ssid}"),
        }
    }

    pub fn hint(&self) -> String {
        match &self.kind {
            PromptKind::Rename(_) | PromptKind::Create => {
                format!("Up to {MAX_NAME_LEN} characters. Enter to save, Esc to cancel.")
            }
            PromptKind::WifiSsid => "Enter to continue, Esc to cancel.".to_string(),
            PromptKind::WifiPassword { .. } => {
                "Enter to save. The device applies it after a restart.".to_string()
            }
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self.kind, PromptKind::WifiPassword { .. })
    }

    /// Input as it should appear on screen.
    pub fn display_input(&self) -> String {
        if self.is_secret() {
            "•".repeat(self.input.chars().count())
        } else {
            self.input.clone()
        }
    }

    pub fn into_parts(self) -> (PromptKind, String) {
        (self.kind, self.input)
    }
}

/// A question the operator has to answer before anything is sent.
#[derive(Debug)]
pub enum PendingConfirm {
    /// Prog or reset on a channel
    Remote(ConfirmationPrompt),
    Delete { id: ChannelId, name: String },
    Restart,
}

impl PendingConfirm {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Remote(prompt) if prompt.action() == RemoteAction::Reset => {
                "Reset rolling code"
            }
            Self::Remote(_) => "Program channel",
            Self::Delete { .. } => "Delete channel",
            Self::Restart => "Restart device",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Remote(prompt) => prompt.message(),
            Self::Delete { name, .. } => format!("Delete '{name}'? This cannot be undone."),
            Self::Restart => {
                "Restart the device? Commands and the log stream drop until it is back.".to_string()
            }
        }
    }
}
