//! Device log stream consumer and ring buffer.
//!
//! [`LogStream`] folds [`SocketEvent`]s from the socket task into a
//! connection state and a bounded [`LogBuffer`]. It runs on the UI thread;
//! [`LogStream::drain`] pulls whatever the socket task has queued without
//! blocking.
//!
//! ## Example
//!
//! ```
//! use blindctl_client::SocketEvent;
//! use blindctl_panel::{LogStream, LogStreamState};
//!
//! let mut stream = LogStream::new(100);
//! stream.apply(SocketEvent::Opened);
//! stream.apply(SocketEvent::Line("boot".to_string()));
//! assert_eq!(stream.state(), &LogStreamState::Open);
//! assert_eq!(stream.buffer().len(), 1);
//! assert!(stream.take_scroll_request());
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use blindctl_client::SocketEvent;
use chrono::{DateTime, Local};
use tokio::sync::mpsc::Receiver;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info};

/// Default ring buffer capacity.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;

/// One line received from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Arrival order, starting at 0 for the session
    pub seq: u64,
    /// Raw text as sent by the device
    pub line: String,
    /// Local time the line was received
    pub received_at: DateTime<Local>,
}

/// Fixed-capacity buffer of log lines, oldest evicted first.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_seq: u64,
    total_received: u64,
    evicted: u64,
}

impl LogBuffer {
    /// Create a buffer holding at most `capacity` lines (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(10_000)),
            capacity,
            next_seq: 0,
            total_received: 0,
            evicted: 0,
        }
    }

    /// Append a line, evicting the oldest one when full. Returns its sequence number.
    pub fn push(&mut self, line: String) -> u64 {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }
        let seq = self.next_seq;
        self.entries.push_back(LogEntry {
            seq,
            line,
            received_at: Local::now(),
        });
        self.next_seq += 1;
        self.total_received += 1;
        seq
    }

    /// Drop every line. Counters keep running.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Lines received since creation, including evicted and cleared ones.
    pub fn total_received(&self) -> u64 {
        self.total_received
    }

    /// Lines pushed out by capacity.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// The `n` most recent lines, oldest first.
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &LogEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip)
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

/// Connection state of the log socket as seen by the panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogStreamState {
    #[default]
    Disconnected,
    Connecting { attempt: u32 },
    Open,
    /// Terminal. `reason` is the last failure, if any.
    Closed { reason: Option<String> },
}

impl LogStreamState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting { .. } => "connecting",
            Self::Open => "open",
            Self::Closed { .. } => "closed",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}

/// Consumer side of the log socket.
#[derive(Debug, Clone)]
pub struct LogStream {
    state: LogStreamState,
    buffer: LogBuffer,
    scroll_requested: bool,
    last_disconnect: Option<(String, Duration)>,
}

impl LogStream {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: LogStreamState::Disconnected,
            buffer: LogBuffer::new(capacity),
            scroll_requested: false,
            last_disconnect: None,
        }
    }

    pub fn state(&self) -> &LogStreamState {
        &self.state
    }

    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }

    /// Reason and backoff of the most recent drop, until the next open.
    pub fn last_disconnect(&self) -> Option<&(String, Duration)> {
        self.last_disconnect.as_ref()
    }

    /// Fold one socket event into the state.
    ///
    /// Once closed, further events are ignored until [`LogStream::reopen`].
    pub fn apply(&mut self, event: SocketEvent) {
        if self.state.is_closed() {
            debug!(?event, "log stream closed, ignoring event");
            return;
        }

        match event {
            SocketEvent::Connecting { attempt } => {
                self.state = LogStreamState::Connecting { attempt };
            }
            SocketEvent::Opened => {
                self.buffer.clear();
                self.last_disconnect = None;
                self.state = LogStreamState::Open;
                info!("log stream open");
            }
            SocketEvent::Line(line) => {
                self.buffer.push(line);
                self.scroll_requested = true;
            }
            SocketEvent::Disconnected { reason, retry_in } => {
                self.last_disconnect = Some((reason, retry_in));
                self.state = LogStreamState::Disconnected;
            }
            SocketEvent::Closed { reason } => {
                info!(reason = reason.as_deref().unwrap_or("none"), "log stream closed");
                self.state = LogStreamState::Closed { reason };
            }
        }
    }

    /// Apply every event already queued on `rx`. Returns how many were applied.
    ///
    /// A disconnected channel with no `Closed` event (socket task aborted)
    /// moves the stream to `Closed`.
    pub fn drain(&mut self, rx: &mut Receiver<SocketEvent>) -> usize {
        let mut applied = 0;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    self.apply(event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.state.is_closed() {
                        self.apply(SocketEvent::Closed {
                            reason: Some("log socket task ended".to_string()),
                        });
                    }
                    break;
                }
            }
        }
        applied
    }

    /// Returns true once after new lines arrived.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }

    /// Leave the terminal state so a fresh socket can feed this stream.
    pub fn reopen(&mut self) {
        self.state = LogStreamState::Disconnected;
        self.last_disconnect = None;
    }
}

impl Default for LogStream {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}
