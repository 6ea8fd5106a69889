//! # blindctl-panel
//!
//! UI-independent core of the control panel.
//!
//! This crate provides:
//! - [`ChannelStore`] - Ordered client-side copy of the channel list
//! - [`Dispatcher`] - Optimistic channel commands with background requests
//! - [`LogStream`] - Log socket state and a bounded [`LogBuffer`]
//!
//! All three are owned by one thread. Network work happens on the tokio
//! runtime and comes back as values the owner applies.

pub mod dispatcher;
pub mod error;
pub mod log_stream;
pub mod store;

pub use dispatcher::{
    Command, ConfirmationPrompt, Confirmed, DispatchOutcome, Dispatcher, Movement,
};
pub use error::DispatchError;
pub use log_stream::{DEFAULT_BUFFER_CAPACITY, LogBuffer, LogEntry, LogStream, LogStreamState};
pub use store::ChannelStore;
