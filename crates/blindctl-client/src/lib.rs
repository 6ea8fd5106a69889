//! # blindctl-client
//!
//! Talks to the blind controller device over REST and WebSocket.
//!
//! This crate provides:
//! - [`Transport`] - Object-safe JSON request seam, with [`fetch_list`] and [`send`]
//! - [`HttpTransport`] - reqwest implementation with a per-request deadline
//! - [`Endpoint`] - The device's REST endpoint table and request bodies
//! - [`LogSocket`] - Log stream reader with backoff reconnect
//! - [`DeviceApi`] - Wi-Fi and restart pass-through calls
//! - [`MockTransport`] - Recording transport for tests
//!
//! HTTP requests are never retried. A failure is returned once as a
//! [`NetworkError`] and the caller decides how to surface it.
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use blindctl_client::{Endpoint, HttpTransport, fetch_list};
//! use blindctl_core::Channel;
//!
//! #[tokio::main]
//! async fn main() -> blindctl_client::Result<()> {
//!     let transport = HttpTransport::new("http://192.168.4.1/api/v1", Duration::from_secs(5))?;
//!     let channels: Vec<Channel> = fetch_list(&transport, Endpoint::Remotes).await?;
//!     for channel in channels {
//!         println!("{} {}", channel.id, channel.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod mock;
pub mod socket;
pub mod transport;

pub use device::DeviceApi;
pub use endpoint::{
    ActionRequest, CreateRequest, DeleteRequest, Endpoint, NetworkConfigRequest, UpdateData,
    UpdateRequest,
};
pub use error::{NetworkError, Result};
pub use http::HttpTransport;
pub use mock::MockTransport;
pub use socket::{DEFAULT_CHANNEL_CAPACITY, LogSocket, SocketEvent};
pub use transport::{Transport, fetch_list, fetch_one, send};
