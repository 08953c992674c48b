use dashmap::DashMap;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::Change;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for record-change notifications, one channel per topic.
/// Booking changes are keyed by spot id, posting changes by posting id.
pub struct NotifyHub {
    channels: DashMap<Ulid, broadcast::Sender<Change>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to changes for a topic. Creates the channel if needed.
    pub fn subscribe(&self, topic: Ulid) -> broadcast::Receiver<Change> {
        let sender = self
            .channels
            .entry(topic)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send a change. No-op if nobody is listening.
    pub fn send(&self, topic: Ulid, change: &Change) {
        if let Some(sender) = self.channels.get(&topic) {
            let _ = sender.send(change.clone());
        }
    }

    /// Remove a channel (e.g. when a spot is delisted).
    pub fn remove(&self, topic: &Ulid) {
        self.channels.remove(topic);
    }
}
