//! Channel command dispatcher.
//!
//! Every command follows the same path: check the precondition against the
//! store, apply the local effect at once, then spawn exactly one request.
//! Requests run on the tokio runtime; their completions come back through a
//! [`JoinSet`] and are applied on the caller's thread by
//! [`Dispatcher::poll_completions`] or [`Dispatcher::settle`].
//!
//! The device is never asked for confirmation of an optimistic update. A
//! failed request is reported as [`DispatchOutcome::Failed`] and the local
//! state is left as it is. A completion for a channel that has since been
//! removed is dropped. A refresh reply never overrides a channel changed
//! locally after the refresh was sent, and never brings back one deleted
//! since.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use blindctl_client::MockTransport;
//! use blindctl_core::ChannelId;
//! use blindctl_panel::Dispatcher;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(MockTransport::new());
//! let mut dispatcher = Dispatcher::new(transport, tokio::runtime::Handle::current());
//! dispatcher.load_initial().await?;
//!
//! dispatcher.up(ChannelId(1))?;
//! let prompt = dispatcher.confirm_reset(ChannelId(1))?;
//! dispatcher.reset(prompt.accept())?;
//!
//! for outcome in dispatcher.settle().await {
//!     println!("{outcome}");
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use blindctl_client::{
    ActionRequest, CreateRequest, DeleteRequest, Endpoint, NetworkError, Transport, UpdateData,
    UpdateRequest, fetch_list, send,
};
use blindctl_core::{Channel, ChannelId, ChannelPatch, RemoteAction, clean_name, log_channel_event};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::error::DispatchError;
use crate::store::ChannelStore;

/// Result type for dispatcher operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Blind movement commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Up,
    Down,
    Stop,
}

impl From<Movement> for RemoteAction {
    fn from(movement: Movement) -> Self {
        match movement {
            Movement::Up => RemoteAction::Up,
            Movement::Down => RemoteAction::Down,
            Movement::Stop => RemoteAction::Stop,
        }
    }
}

/// A command that was sent to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action { id: ChannelId, action: RemoteAction },
    Rename { id: ChannelId, name: String },
    Delete { id: ChannelId },
    Create { name: String },
    Refresh,
}

impl Command {
    /// The channel this command targets, if it targets an existing one.
    pub fn channel(&self) -> Option<ChannelId> {
        match self {
            Self::Action { id, .. } | Self::Rename { id, .. } | Self::Delete { id } => Some(*id),
            Self::Create { .. } | Self::Refresh => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action { id, action } => write!(f, "{action} on channel {id}"),
            Self::Rename { id, name } => write!(f, "rename channel {id} to '{name}'"),
            Self::Delete { id } => write!(f, "delete channel {id}"),
            Self::Create { name } => write!(f, "create channel '{name}'"),
            Self::Refresh => f.write_str("refresh channels"),
        }
    }
}

/// What became of a spawned request.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The device accepted the command.
    Acknowledged(Command),
    /// The device created a channel; it is now in the store.
    Created(Channel),
    /// The channel list was re-fetched and loaded.
    Refreshed { count: usize },
    /// The request failed. Local state was not rolled back.
    Failed { command: Command, error: NetworkError },
    /// The target channel no longer exists; the completion was ignored.
    Dropped(Command),
}

impl DispatchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acknowledged(command) => write!(f, "{command}: ok"),
            Self::Created(channel) => write!(f, "created channel {} '{}'", channel.id, channel.name),
            Self::Refreshed { count } => write!(f, "loaded {count} channels"),
            Self::Failed { command, error } => {
                write!(f, "{command} failed: {}", error.friendly_message())
            }
            Self::Dropped(command) => write!(f, "{command}: ignored stale reply"),
        }
    }
}

/// Operator confirmation for a destructive command.
///
/// Created by [`Dispatcher::confirm_prog`] or [`Dispatcher::confirm_reset`].
/// Dropping or dismissing it sends nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    channel: ChannelId,
    channel_name: String,
    action: RemoteAction,
}

impl ConfirmationPrompt {
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn action(&self) -> RemoteAction {
        self.action
    }

    /// Warning shown to the operator.
    pub fn message(&self) -> String {
        match self.action {
            RemoteAction::Reset => format!(
                "Reset the rolling code of '{}'? The blind will stop responding until it is paired again.",
                self.channel_name
            ),
            _ => format!(
                "Send PROG from '{}'? Only do this with the blind in programming mode.",
                self.channel_name
            ),
        }
    }

    /// Operator said yes.
    pub fn accept(self) -> Confirmed {
        Confirmed {
            channel: self.channel,
            action: self.action,
        }
    }

    /// Operator said no.
    pub fn dismiss(self) {
        debug!(channel_id = %self.channel, action = %self.action, "confirmation dismissed");
    }
}

/// Proof that the operator accepted a [`ConfirmationPrompt`].
///
/// Only obtainable from [`ConfirmationPrompt::accept`] and consumed by use.
#[derive(Debug, PartialEq, Eq)]
pub struct Confirmed {
    channel: ChannelId,
    action: RemoteAction,
}

impl Confirmed {
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn action(&self) -> RemoteAction {
        self.action
    }
}

enum Reply {
    Ack,
    Created(Channel),
    Channels(Vec<Channel>),
}

struct Completion {
    command: Command,
    /// Value of the local change counter when the request was sent
    issued_at: u64,
    reply: blindctl_client::Result<Reply>,
}

/// Owns the channel store and every request in flight.
///
/// Dropping the dispatcher aborts all outstanding requests.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    runtime: Handle,
    store: ChannelStore,
    tasks: JoinSet<Completion>,
    in_flight: HashMap<ChannelId, usize>,
    /// Channel targeted by each running task
    task_channels: HashMap<Id, ChannelId>,
    /// Bumped on every local change to a channel
    changes: u64,
    /// Counter value of the latest local change per channel. Cleared once
    /// nothing is in flight.
    changed_at: HashMap<ChannelId, u64>,
}

impl Dispatcher {
    /// Create a dispatcher that spawns its requests on `runtime`.
    pub fn new(transport: Arc<dyn Transport>, runtime: Handle) -> Self {
        Self {
            transport,
            runtime,
            store: ChannelStore::new(),
            tasks: JoinSet::new(),
            in_flight: HashMap::new(),
            task_channels: HashMap::new(),
            changes: 0,
            changed_at: HashMap::new(),
        }
    }

    pub fn store(&self) -> &ChannelStore {
        &self.store
    }

    /// Requests in flight for `id`.
    pub fn in_flight(&self, id: ChannelId) -> usize {
        self.in_flight.get(&id).copied().unwrap_or(0)
    }

    /// Requests in flight across all channels, including create and refresh.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Fetch the channel list and load it into the store.
    ///
    /// On failure the store is left untouched.
    pub async fn load_initial(&mut self) -> blindctl_client::Result<usize> {
        let channels: Vec<Channel> =
            match fetch_list(self.transport.as_ref(), Endpoint::Remotes).await {
                Ok(channels) => channels,
                Err(e) => {
                    warn!(error = %e, "failed to fetch channels");
                    return Err(e);
                }
            };
        let count = channels.len();
        self.store.load(channels);
        info!(count, "channels loaded");
        Ok(count)
    }

    /// Re-fetch the channel list in the background.
    pub fn refresh(&mut self) {
        let transport = Arc::clone(&self.transport);
        self.spawn(Command::Refresh, async move {
            fetch_list(transport.as_ref(), Endpoint::Remotes)
                .await
                .map(Reply::Channels)
        });
    }

    pub fn move_channel(&mut self, id: ChannelId, movement: Movement) -> Result<()> {
        self.send_action(id, movement.into())
    }

    pub fn up(&mut self, id: ChannelId) -> Result<()> {
        self.move_channel(id, Movement::Up)
    }

    pub fn down(&mut self, id: ChannelId) -> Result<()> {
        self.move_channel(id, Movement::Down)
    }

    pub fn stop(&mut self, id: ChannelId) -> Result<()> {
        self.move_channel(id, Movement::Stop)
    }

    /// Flip the enabled flag. Returns the new state.
    pub fn toggle(&mut self, id: ChannelId) -> Result<bool> {
        let enabled = !self
            .store
            .get(id)
            .ok_or(DispatchError::ChannelNotFound(id))?
            .enabled;
        self.send_action(id, RemoteAction::toggle_to(enabled))?;
        Ok(enabled)
    }

    pub fn confirm_prog(&self, id: ChannelId) -> Result<ConfirmationPrompt> {
        self.prompt(id, RemoteAction::Prog)
    }

    pub fn confirm_reset(&self, id: ChannelId) -> Result<ConfirmationPrompt> {
        self.prompt(id, RemoteAction::Reset)
    }

    /// Send PROG. Advances the rolling code like a movement.
    pub fn prog(&mut self, proof: Confirmed) -> Result<()> {
        if proof.action != RemoteAction::Prog {
            return Err(DispatchError::NotConfirmed(proof.channel));
        }
        self.send_action(proof.channel, RemoteAction::Prog)
    }

    /// Send RESET. Zeroes the rolling code.
    pub fn reset(&mut self, proof: Confirmed) -> Result<()> {
        if proof.action != RemoteAction::Reset {
            return Err(DispatchError::NotConfirmed(proof.channel));
        }
        self.send_action(proof.channel, RemoteAction::Reset)
    }

    /// Run whichever command `proof` confirms.
    pub fn execute(&mut self, proof: Confirmed) -> Result<()> {
        match proof.action {
            RemoteAction::Reset => self.reset(proof),
            _ => self.prog(proof),
        }
    }

    /// Rename a channel. Returns the cleaned name that was applied.
    pub fn rename(&mut self, id: ChannelId, raw: &str) -> Result<String> {
        if !self.store.contains(id) {
            return Err(DispatchError::ChannelNotFound(id));
        }
        let name = clean_name(raw);
        if name.is_empty() {
            return Err(DispatchError::EmptyName);
        }

        self.store.patch(id, &ChannelPatch::name(name.clone()));
        self.mark_changed(id);
        log_channel_event!(id, "rename", name = %name);

        let request = UpdateRequest {
            remote_id: id,
            data: UpdateData { name: name.clone() },
        };
        let transport = Arc::clone(&self.transport);
        self.spawn(
            Command::Rename {
                id,
                name: name.clone(),
            },
            async move {
                send::<Value, _>(transport.as_ref(), Endpoint::RemoteUpdate, &request)
                    .await
                    .map(|_| Reply::Ack)
            },
        );
        Ok(name)
    }

    /// Ask the device to create a channel. Nothing is inserted until the
    /// device replies with the new record.
    pub fn create(&mut self, raw: &str) -> Result<()> {
        if raw.trim().is_empty() {
            return Err(DispatchError::EmptyName);
        }

        let name = raw.to_string();
        info!(%name, "creating channel");
        let request = CreateRequest { name: name.clone() };
        let transport = Arc::clone(&self.transport);
        self.spawn(Command::Create { name }, async move {
            send::<Channel, _>(transport.as_ref(), Endpoint::RemoteCreate, &request)
                .await
                .map(Reply::Created)
        });
        Ok(())
    }

    /// Remove a channel locally and tell the device. Returns whether a row
    /// was removed; the request is sent either way and never rolled back.
    pub fn delete(&mut self, id: ChannelId) -> bool {
        let removed = self.store.remove(id);
        self.mark_changed(id);
        log_channel_event!(id, "delete", removed);

        let request = DeleteRequest { remote_id: id };
        let transport = Arc::clone(&self.transport);
        self.spawn(Command::Delete { id }, async move {
            send::<Value, _>(transport.as_ref(), Endpoint::RemoteDelete, &request)
                .await
                .map(|_| Reply::Ack)
        });
        removed
    }

    /// Apply every completion that is already available, without waiting.
    pub fn poll_completions(&mut self) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        while let Some(joined) = self.tasks.try_join_next_with_id() {
            if let Some(outcome) = self.finish(joined) {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Wait for every in-flight request and apply the completions.
    pub async fn settle(&mut self) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        while let Some(joined) = self.tasks.join_next_with_id().await {
            if let Some(outcome) = self.finish(joined) {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    fn prompt(&self, id: ChannelId, action: RemoteAction) -> Result<ConfirmationPrompt> {
        let channel = self.store.get(id).ok_or(DispatchError::ChannelNotFound(id))?;
        if !channel.enabled {
            return Err(DispatchError::ChannelDisabled(id));
        }
        Ok(ConfirmationPrompt {
            channel: id,
            channel_name: channel.name.clone(),
            action,
        })
    }

    fn send_action(&mut self, id: ChannelId, action: RemoteAction) -> Result<()> {
        let channel = self.store.get(id).ok_or(DispatchError::ChannelNotFound(id))?;
        if action.requires_enabled() && !channel.enabled {
            debug!(channel_id = %id, %action, "refused on disabled channel");
            return Err(DispatchError::ChannelDisabled(id));
        }

        let patch = match action {
            RemoteAction::Reset => ChannelPatch::rolling_code(0),
            RemoteAction::Enable | RemoteAction::Disable => {
                ChannelPatch::enabled(action == RemoteAction::Enable)
            }
            // The device counter never wraps back to zero on its own
            _ => ChannelPatch::rolling_code(channel.rolling_code.saturating_add(1)),
        };
        self.store.patch(id, &patch);
        self.mark_changed(id);
        log_channel_event!(id, action.as_str());

        let request = ActionRequest {
            remote_id: id,
            action,
        };
        let transport = Arc::clone(&self.transport);
        self.spawn(Command::Action { id, action }, async move {
            send::<Value, _>(transport.as_ref(), Endpoint::RemoteAction, &request)
                .await
                .map(|_| Reply::Ack)
        });
        Ok(())
    }

    fn mark_changed(&mut self, id: ChannelId) {
        self.changes += 1;
        self.changed_at.insert(id, self.changes);
    }

    fn changed_since(&self, id: ChannelId, issued_at: u64) -> bool {
        self.changed_at.get(&id).is_some_and(|&at| at > issued_at)
    }

    fn spawn<F>(&mut self, command: Command, request: F)
    where
        F: Future<Output = blindctl_client::Result<Reply>> + Send + 'static,
    {
        let channel = command.channel();
        let issued_at = self.changes;
        let handle = self.tasks.spawn_on(
            async move {
                Completion {
                    command,
                    issued_at,
                    reply: request.await,
                }
            },
            &self.runtime,
        );
        if let Some(id) = channel {
            *self.in_flight.entry(id).or_default() += 1;
            self.task_channels.insert(handle.id(), id);
        }
    }

    fn finish(
        &mut self,
        joined: std::result::Result<(Id, Completion), JoinError>,
    ) -> Option<DispatchOutcome> {
        let outcome = match joined {
            Ok((task, completion)) => {
                self.release(task);
                Some(self.apply(completion))
            }
            Err(e) => {
                warn!(error = %e, "request task did not complete");
                self.release(e.id());
                None
            }
        };
        if self.tasks.is_empty() {
            self.changed_at.clear();
        }
        outcome
    }

    /// Drop the in-flight count held by `task`, if it targeted a channel.
    fn release(&mut self, task: Id) {
        let Some(id) = self.task_channels.remove(&task) else {
            return;
        };
        if let Some(count) = self.in_flight.get_mut(&id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.in_flight.remove(&id);
            }
        }
    }

    /// Merge a fetched channel list with local changes made after
    /// `issued_at`. Locally changed rows keep their local state, deleted
    /// ones stay deleted, and rows created locally since are kept.
    fn merge_refresh(&self, fetched: Vec<Channel>, issued_at: u64) -> Vec<Channel> {
        let mut merged: Vec<Channel> = Vec::with_capacity(fetched.len());
        for channel in fetched {
            if !self.changed_since(channel.id, issued_at) {
                merged.push(channel);
            } else if let Some(local) = self.store.get(channel.id) {
                debug!(channel_id = %channel.id, "keeping local state over refresh");
                merged.push(local.clone());
            } else {
                debug!(channel_id = %channel.id, "not restoring channel deleted during refresh");
            }
        }
        for local in self.store.iter() {
            if self.changed_since(local.id, issued_at) && !merged.iter().any(|c| c.id == local.id) {
                merged.push(local.clone());
            }
        }
        merged
    }

    fn apply(&mut self, completion: Completion) -> DispatchOutcome {
        let Completion {
            command,
            issued_at,
            reply,
        } = completion;

        if let Some(id) = command.channel() {
            let deleted = matches!(command, Command::Delete { .. });
            if !deleted && !self.store.contains(id) {
                debug!(channel_id = %id, %command, "dropping completion for removed channel");
                return DispatchOutcome::Dropped(command);
            }
        }

        match reply {
            Ok(Reply::Ack) => {
                debug!(%command, "acknowledged");
                DispatchOutcome::Acknowledged(command)
            }
            Ok(Reply::Created(channel)) => {
                log_channel_event!(channel.id, "created", name = %channel.name);
                self.store.upsert(channel.clone());
                self.mark_changed(channel.id);
                DispatchOutcome::Created(channel)
            }
            Ok(Reply::Channels(fetched)) => {
                let channels = self.merge_refresh(fetched, issued_at);
                let count = channels.len();
                self.store.load(channels);
                info!(count, "channels refreshed");
                DispatchOutcome::Refreshed { count }
            }
            Err(error) => {
                warn!(%command, error = %error, "request failed");
                DispatchOutcome::Failed { command, error }
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("channels", &self.store.len())
            .field("pending", &self.tasks.len())
            .finish()
    }
}
