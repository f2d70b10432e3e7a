//! Subscriber registry: which subscribers are connected, and through which sockets.
//!
//! Every subscriber present in the map has at least one connection. Removing
//! the last connection removes the subscriber in the same critical section, so
//! readers never observe an empty entry.

use std::sync::Arc;

use dashmap::DashMap;
use turbo_core::{ConnectionId, SubscriberId};

use crate::connection::Connection;

/// Registry of live connections, keyed by subscriber.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: DashMap<SubscriberId, Vec<Arc<Connection>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection under its own subscriber id. Registering the same
    /// connection twice is a no-op.
    pub fn register(&self, connection: Arc<Connection>) {
        let mut conns = self
            .subscribers
            .entry(connection.subscriber_id.clone())
            .or_default();
        if !conns.iter().any(|c| c.id == connection.id) {
            conns.push(connection);
        }
    }

    /// Remove a connection from `id`, dropping the subscriber when none remain.
    ///
    /// Returns `true` if the connection was present. Unknown ids and
    /// connections are ignored, so racing cleanup paths are safe.
    pub fn unregister(&self, id: &SubscriberId, connection_id: &ConnectionId) -> bool {
        let mut removed = false;
        let _ = self.subscribers.remove_if_mut(id, |_, conns| {
            let before = conns.len();
            conns.retain(|c| &c.id != connection_id);
            removed = conns.len() != before;
            conns.is_empty()
        });
        removed
    }

    /// Whether `id` has at least one live connection.
    pub fn has(&self, id: &SubscriberId) -> bool {
        self.subscribers.contains_key(id)
    }

    /// Whether any subscriber is connected.
    pub fn has_any(&self) -> bool {
        !self.subscribers.is_empty()
    }

    /// Point-in-time copy of the connections of `id` (empty if unknown).
    pub fn connections_of(&self, id: &SubscriberId) -> Vec<Arc<Connection>> {
        self.subscribers
            .get(id)
            .map(|conns| conns.value().clone())
            .unwrap_or_default()
    }

    /// Point-in-time copy of every connection of every subscriber.
    pub fn all_connections(&self) -> Vec<Arc<Connection>> {
        self.subscribers
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    pub fn subscriber_ids(&self) -> Vec<SubscriberId> {
        self.subscribers.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn connection_count(&self) -> usize {
        self.subscribers.iter().map(|entry| entry.value().len()).sum()
    }
}
