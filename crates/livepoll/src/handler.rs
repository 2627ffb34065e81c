//! Per-connection handler: viewer registration, action routing, and the
//! writer task.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register a viewer with the gateway and spawn its writer task
//!   2. Loop: receive frames → decode `ClientAction` → run it through the
//!      engine → enqueue the reply and broadcasts
//!   3. On close, or on idle timeout while watching no room, unregister
//!      the viewer

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use livepoll_gateway::{ViewerReceiver, viewer_channel};
use livepoll_protocol::{ClientAction, Codec, ErrorCode, JsonCodec, ServerEvent};
use livepoll_transport::{Connection, ConnectionId, WebSocketConnection};

use crate::LivepollError;
use crate::server::{ServerState, deliver};

/// Drop guard that unregisters a viewer when the handler exits.
///
/// `Drop` is synchronous, so the async lock is taken in a spawned task.
struct ViewerGuard {
    conn_id: ConnectionId,
    state: Arc<ServerState>,
}

impl Drop for ViewerGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.gateway.lock().await.unregister(conn_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), LivepollError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (sender, receiver) = viewer_channel();
    state.gateway.lock().await.register(conn_id, sender)?;
    let _guard = ViewerGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    let writer = tokio::spawn(write_events(Arc::clone(&conn), receiver, state.codec));
    let result = read_loop(&conn, &state).await;

    writer.abort();
    let _ = conn.close().await;
    result
}

/// Receives frames until the peer leaves, goes idle, or errors.
async fn read_loop(conn: &WebSocketConnection, state: &ServerState) -> Result<(), LivepollError> {
    let conn_id = conn.id();

    loop {
        let received = match idle_limit(conn_id, state).await {
            Some(limit) => tokio::time::timeout(limit, conn.recv()).await,
            None => Ok(conn.recv().await),
        };

        let data = match received {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%conn_id, "connection closed");
                return Ok(());
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                return Err(e.into());
            }
            Err(_) => {
                tracing::info!(%conn_id, "connection idle without a room, closing");
                return Ok(());
            }
        };

        let action: ClientAction = match state.codec.decode(&data) {
            Ok(action) => action,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode action");
                let reply = ServerEvent::error(ErrorCode::BadRequest, e.to_string());
                state.gateway.lock().await.send_to(conn_id, reply);
                continue;
            }
        };

        handle_action(conn_id, state, action).await?;
    }
}

/// How long the next `recv` may wait before the connection counts as idle.
///
/// Viewers of a room stay connected for as long as they like, since they
/// may only be listening for broadcasts. The limit applies to connections
/// that watch nothing. A zero timeout disables it.
async fn idle_limit(conn_id: ConnectionId, state: &ServerState) -> Option<Duration> {
    if state.idle_timeout.is_zero() {
        return None;
    }
    let watching = state
        .gateway
        .lock()
        .await
        .viewer(conn_id)
        .is_some_and(|viewer| viewer.rooms().next().is_some());
    (!watching).then_some(state.idle_timeout)
}

/// Runs one action through the engine and enqueues what it produced.
///
/// The gateway is locked while the engine lock is still held so replies
/// and broadcasts are enqueued in the order the engine ran them.
async fn handle_action(
    conn_id: ConnectionId,
    state: &ServerState,
    action: ClientAction,
) -> Result<(), LivepollError> {
    let kind = action.kind();
    let mut engine = state.engine.lock().await;
    let dispatch = engine.dispatch(action, Utc::now());
    let mut gateway = state.gateway.lock().await;

    if let Some(room) = &dispatch.subscribe {
        if gateway.subscribe(conn_id, room)? {
            tracing::info!(
                %conn_id,
                room_code = %room,
                viewers = gateway.group_size(room),
                "viewer joined room"
            );
        }
    }

    if let Some(reply) = dispatch.reply {
        if let ServerEvent::Error { code, message } = &reply {
            tracing::debug!(%conn_id, action = kind, %code, reason = %message, "action rejected");
        }
        if !gateway.send_to(conn_id, reply) {
            tracing::debug!(%conn_id, action = kind, "reply dropped, writer gone");
        }
    }

    deliver(&gateway, dispatch.broadcasts);
    Ok(())
}

/// Drains a viewer's channel onto the socket.
///
/// Ends when the channel closes or a write fails; a failed write also
/// closes the connection so the read loop stops.
async fn write_events(conn: Arc<WebSocketConnection>, mut receiver: ViewerReceiver, codec: JsonCodec) {
    let conn_id = conn.id();

    while let Some(event) = receiver.recv().await {
        let bytes = match codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn_id, event = event.kind(), error = %e, "failed to encode event");
                continue;
            }
        };

        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "write failed, closing connection");
            let _ = conn.close().await;
            return;
        }
    }
}
