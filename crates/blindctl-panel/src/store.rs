//! Client-side mirror of the device's channel list.
//!
//! Channels keep the order they were loaded or created in. The store is a
//! plain container: it checks nothing about the values it holds and every
//! write is applied as given.

use blindctl_core::{Channel, ChannelId, ChannelPatch};

#[derive(Debug, Clone, Default)]
pub struct ChannelStore {
    channels: Vec<Channel>,
    revision: u64,
}

impl ChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole set. A repeated id keeps its first position and
    /// the last record seen.
    pub fn load(&mut self, channels: impl IntoIterator<Item = Channel>) {
        self.channels.clear();
        for channel in channels {
            match self.position(channel.id) {
                Some(index) => self.channels[index] = channel,
                None => self.channels.push(channel),
            }
        }
        self.bump();
    }

    /// Insert `channel`, or replace the record with the same id in place.
    ///
    /// Returns true if the channel was new.
    pub fn upsert(&mut self, channel: Channel) -> bool {
        let inserted = match self.position(channel.id) {
            Some(index) => {
                self.channels[index] = channel;
                false
            }
            None => {
                self.channels.push(channel);
                true
            }
        };
        self.bump();
        inserted
    }

    /// Remove by id. Returns false if there was nothing to remove.
    pub fn remove(&mut self, id: ChannelId) -> bool {
        match self.position(id) {
            Some(index) => {
                self.channels.remove(index);
                self.bump();
                true
            }
            None => false,
        }
    }

    /// Apply a partial update. Returns false if the id is unknown.
    pub fn patch(&mut self, id: ChannelId, patch: &ChannelPatch) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        patch.apply(&mut self.channels[index]);
        self.bump();
        true
    }

    pub fn get(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// Channel at display row `index`.
    pub fn get_index(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn contains(&self, id: ChannelId) -> bool {
        self.position(id).is_some()
    }

    /// Display-order position of `id`.
    pub fn position(&self, id: ChannelId) -> Option<usize> {
        self.channels.iter().position(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn ids(&self) -> Vec<ChannelId> {
        self.channels.iter().map(|c| c.id).collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Incremented on every successful write.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
