//! Client-side refusals.

use blindctl_core::ChannelId;
use thiserror::Error;

/// A command the dispatcher refused before sending anything.
///
/// A refusal never mutates the store and never reaches the device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Channel {0} not found")]
    ChannelNotFound(ChannelId),

    #[error("Channel {0} is disabled")]
    ChannelDisabled(ChannelId),

    #[error("Channel name is empty")]
    EmptyName,

    /// The confirmation was issued for a different command or channel
    #[error("Command on channel {0} was not confirmed")]
    NotConfirmed(ChannelId),
}

impl DispatchError {
    /// Short text for the status line.
    pub fn friendly_message(&self) -> String {
        match self {
            Self::ChannelNotFound(id) => format!("No channel with id {id}."),
            Self::ChannelDisabled(id) => format!("Channel {id} is disabled. Enable it first."),
            Self::EmptyName => "Name cannot be empty.".to_string(),
            Self::NotConfirmed(_) => "Command needs confirmation.".to_string(),
        }
    }
}
