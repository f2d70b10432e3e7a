//! Liveness report served at `GET /health`.

use std::time::Instant;

use serde::Serialize;

use crate::registry::SubscriberRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    /// Subscribers with at least one open socket.
    pub subscribers: usize,
    /// Open sockets across all subscribers.
    pub connections: usize,
}

impl HealthResponse {
    /// Read the registry counts as of now.
    pub fn snapshot(registry: &SubscriberRegistry, started: Instant) -> Self {
        Self {
            status: "ok",
            uptime_secs: started.elapsed().as_secs(),
            subscribers: registry.subscriber_count(),
            connections: registry.connection_count(),
        }
    }
}
