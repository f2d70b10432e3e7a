//! A single live WebSocket connection, as seen by pushers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use turbo_core::{ConnectionId, SubscriberId};

/// Why a send did not reach the connection's outbound queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("connection closed")]
    Closed,
    #[error("send queue full")]
    QueueFull,
}

impl SendError {
    /// Short classification string for logging/metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::QueueFull => "queue_full",
        }
    }
}

/// Send half of a connection. The socket writer task owns the receiver.
pub struct Connection {
    pub id: ConnectionId,
    pub subscriber_id: SubscriberId,
    tx: mpsc::Sender<Arc<str>>,
    open: AtomicBool,
    connected_at: Instant,
    dropped_messages: AtomicU64,
}

impl Connection {
    /// Create a connection with a bounded outbound queue.
    pub fn channel(
        subscriber_id: SubscriberId,
        max_send_queue: usize,
    ) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(max_send_queue.max(1));
        let conn = Self {
            id: ConnectionId::new(),
            subscriber_id,
            tx,
            open: AtomicBool::new(true),
            connected_at: Instant::now(),
            dropped_messages: AtomicU64::new(0),
        };
        (conn, rx)
    }

    /// Queue a text payload for the socket. Never blocks.
    pub fn send(&self, message: Arc<str>) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::Closed);
        }
        match self.tx.try_send(message) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
                Err(SendError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.close();
                Err(SendError::Closed)
            }
        }
    }

    /// Mark the connection as closed. Later sends fail with [`SendError::Closed`].
    pub fn close(&self) {
        self.open.store(false, Ordering::Relaxed);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed) && !self.tx.is_closed()
    }

    /// Messages dropped because the queue was full.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("subscriber_id", &self.subscriber_id)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_connection() -> (Connection, mpsc::Receiver<Arc<str>>) {
        Connection::channel(SubscriberId::from_raw("u1"), 32)
    }

    #[tokio::test]
    async fn send_message_success() {
        let (conn, mut rx) = make_connection();
        assert!(conn.send(Arc::from("hello")).is_ok());
        let msg = rx.recv().await.unwrap();
        assert_eq!(&*msg, "hello");
    }

    #[test]
    fn send_to_dropped_receiver_fails_closed() {
        let (conn, rx) = make_connection();
        drop(rx);
        assert_eq!(conn.send(Arc::from("hello")), Err(SendError::Closed));
        assert!(!conn.is_open());
    }

    #[test]
    fn send_to_full_queue_fails_and_counts() {
        let (conn, _rx) = Connection::channel(SubscriberId::from_raw("u1"), 1);
        assert!(conn.send(Arc::from("msg1")).is_ok());
        assert_eq!(conn.send(Arc::from("msg2")), Err(SendError::QueueFull));
        assert_eq!(conn.drop_count(), 1);
        // a full queue does not close the connection
        assert!(conn.is_open());
    }

    #[test]
    fn closed_connection_rejects_sends() {
        let (conn, _rx) = make_connection();
        conn.close();
        assert!(!conn.is_open());
        assert_eq!(conn.send(Arc::from("late")), Err(SendError::Closed));
    }

    #[test]
    fn connections_get_distinct_ids() {
        let (a, _ra) = make_connection();
        let (b, _rb) = make_connection();
        assert_ne!(a.id, b.id);
        assert_eq!(a.subscriber_id, b.subscriber_id);
    }

    #[test]
    fn zero_capacity_is_bumped_to_one() {
        let (conn, _rx) = Connection::channel(SubscriberId::from_raw("u1"), 0);
        assert!(conn.send(Arc::from("x")).is_ok());
    }

    #[test]
    fn send_error_reasons() {
        assert_eq!(SendError::Closed.reason(), "closed");
        assert_eq!(SendError::QueueFull.reason(), "queue_full");
        assert_eq!(SendError::QueueFull.to_string(), "send queue full");
    }
}
