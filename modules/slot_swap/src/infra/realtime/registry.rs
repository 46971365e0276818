//! Per-user registry of live realtime connections.
//!
//! A user may hold any number of concurrent connections (tabs, devices).
//! Delivery is best-effort: a sink that reports itself closed is pruned, any
//! other failure is logged and the connection is kept.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

/// Opaque handle for a single registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Named event with a JSON payload, as pushed to clients.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeEvent {
    pub name: &'static str,
    pub payload: Value,
}

impl RealtimeEvent {
    pub fn new(name: &'static str, payload: Value) -> Self {
        Self { name, payload }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Remote end is gone; the connection will never accept events again.
    #[error("connection closed")]
    Closed,
    /// Transient failure (for example a full outbound buffer).
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// Transport-side end of a connection.
pub trait EventSink: Send + Sync + 'static {
    fn deliver(&self, event: &RealtimeEvent) -> Result<(), DeliveryError>;
}

type SinkMap = HashMap<ConnectionId, Arc<dyn EventSink>>;

#[derive(Default)]
pub struct ConnectionRegistry {
    users: DashMap<Uuid, SinkMap>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sink` for `user_id`. The connection stays registered until
    /// the returned guard is dropped.
    pub fn register(self: &Arc<Self>, user_id: Uuid, sink: Arc<dyn EventSink>) -> ConnectionGuard {
        let connection_id = ConnectionId::new();
        self.users
            .entry(user_id)
            .or_default()
            .insert(connection_id, sink);
        info!(user_id = %user_id, connection_id = %connection_id, "Realtime connection registered");

        ConnectionGuard {
            registry: Arc::downgrade(self),
            user_id,
            connection_id,
        }
    }

    /// Remove one connection. Unknown ids are ignored.
    pub fn unregister(&self, user_id: Uuid, connection_id: ConnectionId) {
        let removed = self
            .users
            .get_mut(&user_id)
            .and_then(|mut sinks| sinks.remove(&connection_id))
            .is_some();
        self.users.remove_if(&user_id, |_, sinks| sinks.is_empty());
        if removed {
            info!(user_id = %user_id, connection_id = %connection_id, "Realtime connection unregistered");
        }
    }

    /// Deliver to every connection of `user_id`. Returns how many accepted it.
    pub fn send_to_user(&self, user_id: Uuid, event: &RealtimeEvent) -> usize {
        // Snapshot so no shard lock is held while sinks run.
        let sinks: Vec<(ConnectionId, Arc<dyn EventSink>)> = match self.users.get(&user_id) {
            Some(entry) => entry.iter().map(|(id, s)| (*id, s.clone())).collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for (connection_id, sink) in sinks {
            match sink.deliver(event) {
                Ok(()) => delivered += 1,
                Err(DeliveryError::Closed) => {
                    debug!(user_id = %user_id, connection_id = %connection_id, "Pruning closed connection");
                    self.unregister(user_id, connection_id);
                }
                Err(e) => {
                    debug!(
                        user_id = %user_id,
                        connection_id = %connection_id,
                        event = event.name,
                        error = %e,
                        "Realtime delivery failed"
                    );
                }
            }
        }
        delivered
    }

    /// Deliver to every connection of every user.
    pub fn broadcast(&self, event: &RealtimeEvent) -> usize {
        let users: Vec<Uuid> = self.users.iter().map(|e| *e.key()).collect();
        users
            .into_iter()
            .map(|user_id| self.send_to_user(user_id, event))
            .sum()
    }

    pub fn connection_count(&self, user_id: Uuid) -> usize {
        self.users.get(&user_id).map_or(0, |sinks| sinks.len())
    }

    pub fn total_connections(&self) -> usize {
        self.users.iter().map(|e| e.value().len()).sum()
    }
}

/// Unregisters its connection on drop.
#[must_use = "the connection is unregistered as soon as the guard is dropped"]
pub struct ConnectionGuard {
    registry: Weak<ConnectionRegistry>,
    user_id: Uuid,
    connection_id: ConnectionId,
}

impl ConnectionGuard {
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.user_id, self.connection_id);
        }
    }
}
