//! # blindctl-core
//!
//! Core types, errors, and utilities shared by the blindctl crates.
//!
//! This crate provides:
//! - [`types`] - Channel records and the device's JSON shapes
//! - [`PanelError`] - Setup and configuration errors
//! - [`logging`] - Tracing setup
//! - [`recovery`] - Backoff policy for the log socket

pub mod error;
pub mod logging;
pub mod recovery;
pub mod types;

pub use error::{PanelError, Result};
pub use logging::{LogGuard, init_logging};
pub use recovery::{RetryConfig, Retryable};
pub use types::{
    Channel, ChannelId, ChannelPatch, MAX_NAME_LEN, NetworkConfig, RemoteAction, WifiNetwork,
    clean_name,
};
