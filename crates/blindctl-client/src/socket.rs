//! Device log socket.
//!
//! [`LogSocket`] owns the WebSocket connection and turns it into a stream of
//! [`SocketEvent`]s on a bounded channel. The reader waits on a full
//! channel instead of dropping lines, so every text frame reaches the
//! consumer in arrival order.
//!
//! A dropped connection is retried according to the [`RetryConfig`]; once
//! the attempts are used up the task emits [`SocketEvent::Closed`] and
//! exits. A successful open resets the attempt counter.

use std::time::Duration;

use blindctl_core::{RetryConfig, Retryable};
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use crate::error::NetworkError;

/// Default depth of the event channel between the socket task and the UI.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Lifecycle and data events from the log socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// A connection attempt is starting. `attempt` is 0 for the first try
    /// after an open (or at startup).
    Connecting { attempt: u32 },
    /// The handshake completed.
    Opened,
    /// One inbound text line, verbatim.
    Line(String),
    /// The connection dropped and will be retried after `retry_in`.
    Disconnected { reason: String, retry_in: Duration },
    /// No further connection attempts will be made.
    Closed { reason: Option<String> },
}

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum SessionEnd {
    /// Connection ended; eligible for reconnect.
    Dropped(String),
    /// Connection ended with an error that reconnecting will not fix.
    Fatal(String),
    /// Nobody is listening any more.
    ReceiverGone,
}

/// WebSocket reader with reconnect.
#[derive(Debug, Clone)]
pub struct LogSocket {
    url: String,
    policy: RetryConfig,
    channel_capacity: usize,
}

impl LogSocket {
    pub fn new(url: impl Into<String>, policy: RetryConfig) -> Self {
        Self {
            url: url.into(),
            policy,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Start the socket task on `handle`.
    ///
    /// Aborting the returned handle (or dropping the receiver) stops it.
    pub fn spawn(
        self,
        handle: &tokio::runtime::Handle,
    ) -> (JoinHandle<()>, mpsc::Receiver<SocketEvent>) {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let task = handle.spawn(self.run(tx));
        (task, rx)
    }

    /// Run the connect/read/reconnect loop until closed or until `tx` has
    /// no receiver.
    pub async fn run(self, tx: mpsc::Sender<SocketEvent>) {
        let mut retry: u32 = 0;

        loop {
            if tx.send(SocketEvent::Connecting { attempt: retry }).await.is_err() {
                return;
            }
            debug!(url = %self.url, attempt = retry, "connecting log socket");

            let end = match connect_async(self.url.as_str()).await {
                Ok((stream, _response)) => {
                    info!(url = %self.url, "log socket open");
                    retry = 0;
                    if tx.send(SocketEvent::Opened).await.is_err() {
                        return;
                    }
                    read_lines(stream, &tx).await
                }
                Err(e) => {
                    let err = NetworkError::from_socket(e);
                    if err.is_retryable() {
                        SessionEnd::Dropped(err.to_string())
                    } else {
                        SessionEnd::Fatal(err.to_string())
                    }
                }
            };

            let reason = match end {
                SessionEnd::ReceiverGone => return,
                SessionEnd::Fatal(reason) => {
                    warn!(url = %self.url, %reason, "log socket failed");
                    let _ = tx.send(SocketEvent::Closed { reason: Some(reason) }).await;
                    return;
                }
                SessionEnd::Dropped(reason) => reason,
            };

            retry += 1;
            if !self.policy.allows_attempt(retry) {
                warn!(url = %self.url, %reason, "log socket closed, not reconnecting");
                let _ = tx.send(SocketEvent::Closed { reason: Some(reason) }).await;
                return;
            }

            let delay = self.policy.delay_for_attempt(retry - 1);
            warn!(
                url = %self.url,
                %reason,
                retry,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "log socket dropped, reconnecting"
            );
            if tx
                .send(SocketEvent::Disconnected {
                    reason,
                    retry_in: delay,
                })
                .await
                .is_err()
            {
                return;
            }
            tokio::time::sleep(delay).await;
        }
    }
}

async fn read_lines(mut stream: Stream, tx: &mpsc::Sender<SocketEvent>) -> SessionEnd {
    while let Some(message) = stream.next().await {
        let line = match message {
            Ok(Message::Text(text)) => text.as_str().to_owned(),
            Ok(Message::Binary(data)) => String::from_utf8_lossy(&data).into_owned(),
            Ok(Message::Close(frame)) => {
                let reason = match frame {
                    Some(frame) if !frame.reason.is_empty() => {
                        format!("closed by device ({}): {}", frame.code, frame.reason.as_str())
                    }
                    Some(frame) => format!("closed by device ({})", frame.code),
                    None => "closed by device".to_string(),
                };
                return SessionEnd::Dropped(reason);
            }
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
            Err(e) => {
                let err = NetworkError::from_socket(e);
                return if err.is_retryable() {
                    SessionEnd::Dropped(err.to_string())
                } else {
                    SessionEnd::Fatal(err.to_string())
                };
            }
        };

        trace!(%line, "log line");
        if tx.send(SocketEvent::Line(line)).await.is_err() {
            return SessionEnd::ReceiverGone;
        }
    }
    SessionEnd::Dropped("connection ended".to_string())
}
