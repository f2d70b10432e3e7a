//! Fan-out of Turbo Stream payloads to connected subscribers.

use std::collections::HashSet;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};
use turbo_core::{Payload, SubscriberId};
use turbo_telemetry::metrics::{PUSHES_TOTAL, PUSH_FAILURES_TOTAL};

use crate::connection::{Connection, SendError};
use crate::registry::SubscriberRegistry;

/// Which subscribers a push goes to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Target {
    /// Every subscriber connected when the push starts.
    #[default]
    All,
    One(SubscriberId),
    Many(Vec<SubscriberId>),
}

impl Target {
    fn label(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::One(_) => "one",
            Self::Many(_) => "many",
        }
    }
}

impl From<SubscriberId> for Target {
    fn from(id: SubscriberId) -> Self {
        Self::One(id)
    }
}

impl From<&SubscriberId> for Target {
    fn from(id: &SubscriberId) -> Self {
        Self::One(id.clone())
    }
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Self::One(SubscriberId::from_raw(id))
    }
}

impl From<Vec<SubscriberId>> for Target {
    fn from(ids: Vec<SubscriberId>) -> Self {
        Self::Many(ids)
    }
}

impl From<Option<SubscriberId>> for Target {
    fn from(id: Option<SubscriberId>) -> Self {
        id.map_or(Self::All, Self::One)
    }
}

/// Outcome of a push. Delivered means queued for the socket, not acknowledged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PushReport {
    pub attempted: usize,
    pub delivered: usize,
}

impl PushReport {
    pub fn failed(&self) -> usize {
        self.attempted - self.delivered
    }
}

/// Pushes payloads to the connections tracked by a [`SubscriberRegistry`].
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<SubscriberRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Deliver `payload` as one message to every connection of the targeted
    /// subscribers.
    ///
    /// Unknown subscribers are skipped. A failed send is logged and does not
    /// affect other recipients; the registry is left to the connection's own
    /// lifecycle to clean up.
    pub fn push(&self, payload: impl Into<Payload>, to: impl Into<Target>) -> PushReport {
        let to = to.into();
        let message: Arc<str> = Arc::from(payload.into().into_body());
        let recipients = self.recipients(&to);
        counter!(PUSHES_TOTAL, "target" => to.label()).increment(1);

        let mut report = PushReport {
            attempted: recipients.len(),
            delivered: 0,
        };
        for conn in &recipients {
            match conn.send(Arc::clone(&message)) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    counter!(PUSH_FAILURES_TOTAL, "reason" => err.reason()).increment(1);
                    match err {
                        SendError::QueueFull => warn!(
                            conn_id = %conn.id,
                            subscriber_id = %conn.subscriber_id,
                            dropped = conn.drop_count(),
                            "send queue full, dropping push"
                        ),
                        SendError::Closed => debug!(
                            conn_id = %conn.id,
                            subscriber_id = %conn.subscriber_id,
                            "skipping closed connection"
                        ),
                    }
                }
            }
        }

        debug!(
            target_kind = to.label(),
            recipients = report.attempted,
            delivered = report.delivered,
            bytes = message.len(),
            "push"
        );
        report
    }

    /// Whether a push to `to` would currently reach anyone.
    pub fn can_push(&self, to: Option<&SubscriberId>) -> bool {
        match to {
            None => self.registry.has_any(),
            Some(id) => self.registry.has(id),
        }
    }

    /// Snapshot of the connections to send to. No registry lock is held afterwards.
    fn recipients(&self, to: &Target) -> Vec<Arc<Connection>> {
        match to {
            Target::All => self.registry.all_connections(),
            Target::One(id) => self.registry.connections_of(id),
            Target::Many(ids) => {
                let mut seen = HashSet::new();
                ids.iter()
                    .flat_map(|id| self.registry.connections_of(id))
                    .filter(|conn| seen.insert(conn.id.clone()))
                    .collect()
            }
        }
    }
}
