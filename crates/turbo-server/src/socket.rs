//! WebSocket lifecycle: register on accept, detect disconnection, unregister once.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, trace};
use turbo_core::SubscriberId;
use turbo_telemetry::metrics::{CONNECTIONS_ACTIVE, CONNECTIONS_TOTAL, DISCONNECTIONS_TOTAL};

use crate::connection::Connection;
use crate::server::Turbo;

/// WebSocket upgrade handler. The subscriber is resolved from the upgrade request.
pub(crate) async fn ws_handler(
    State(turbo): State<Turbo>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let subscriber_id = turbo.resolve_identity(&headers);
    ws.on_upgrade(move |socket| handle_socket(socket, subscriber_id, turbo))
}

/// Track one socket in the registry for as long as it stays open.
#[instrument(skip_all, fields(subscriber_id = %subscriber_id))]
pub async fn handle_socket(socket: WebSocket, subscriber_id: SubscriberId, turbo: Turbo) {
    let config = turbo.config();
    let registry = turbo.registry();

    let (conn, rx) = Connection::channel(subscriber_id.clone(), config.max_send_queue);
    let conn = Arc::new(conn);
    registry.register(Arc::clone(&conn));
    counter!(CONNECTIONS_TOTAL).increment(1);
    gauge!(CONNECTIONS_ACTIVE).increment(1.0);
    info!(conn_id = %conn.id, "turbo-stream client connected");

    serve_connection(
        socket,
        &conn,
        rx,
        config.idle_timeout(),
        config.ping_interval(),
    )
    .await;

    conn.close();
    if registry.unregister(&subscriber_id, &conn.id) {
        gauge!(CONNECTIONS_ACTIVE).decrement(1.0);
    }
    counter!(DISCONNECTIONS_TOTAL).increment(1);
    info!(
        conn_id = %conn.id,
        age_secs = conn.age().as_secs(),
        dropped = conn.drop_count(),
        "turbo-stream client disconnected"
    );
}

/// Run the writer and reader halves until either one stops.
async fn serve_connection(
    socket: WebSocket,
    conn: &Arc<Connection>,
    mut rx: mpsc::Receiver<Arc<str>>,
    idle_timeout: Duration,
    ping_interval: Duration,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer: queued pushes to the socket, plus periodic pings
    let writer_conn = Arc::clone(conn);
    let mut writer = tokio::spawn(async move {
        let mut ping = tokio::time::interval(ping_interval);
        ping.tick().await; // consume first immediate tick

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(text) = msg else { break };
                    if ws_tx.send(Message::Text(Utf8Bytes::from(&*text))).await.is_err() {
                        break;
                    }
                }
                _ = ping.tick() => {
                    if ws_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                    trace!(conn_id = %writer_conn.id, "sent ping");
                }
            }
        }
        writer_conn.close();
        let _ = ws_tx.close().await;
    });

    // Reader: inbound traffic only signals liveness
    let reader_conn = Arc::clone(conn);
    let mut reader = tokio::spawn(async move {
        loop {
            match tokio::time::timeout(idle_timeout, ws_rx.next()).await {
                Err(_elapsed) => {
                    if !reader_conn.is_open() {
                        break;
                    }
                }
                Ok(None) | Ok(Some(Ok(Message::Close(_)))) => break,
                Ok(Some(Err(e))) => {
                    debug!(conn_id = %reader_conn.id, error = %e, "websocket read failed");
                    break;
                }
                Ok(Some(Ok(_))) => {}
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }
}
