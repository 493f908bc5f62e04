//! Per-connection handler.
//!
//! Each accepted connection gets its own task running this handler:
//!   1. Create the connection's outbound queue and register it with the relay
//!   2. Spawn a writer that drains the queue onto the socket, in order
//!   3. Loop: receive frames → decode `ClientEvent` → forward to the relay
//!   4. On close or failure: deregister, stop the writer, close the socket

use std::sync::Arc;

use sensorcast_protocol::{ClientEvent, Codec};
use sensorcast_relay::{PeerReceiver, peer_channel};
use sensorcast_transport::{Connection, WebSocketConnection};

use crate::SensorcastError;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), SensorcastError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::info!(%conn_id, "client connected");

    let (outbox_tx, outbox_rx) = peer_channel(state.outbox_capacity);
    state.relay.connect(conn_id, outbox_tx).await?;

    let writer = tokio::spawn(write_loop(
        Arc::clone(&conn),
        outbox_rx,
        Arc::clone(&state),
    ));

    let result = read_loop(&conn, &state).await;

    // Free the presenter role first; everything after this is teardown.
    if let Err(e) = state.relay.disconnect(conn_id).await {
        tracing::warn!(%conn_id, error = %e, "could not deregister connection");
    }
    writer.abort();
    let _ = writer.await;
    let _ = conn.close().await;

    tracing::info!(%conn_id, "client disconnected");
    result
}

/// Reads frames until the peer goes away.
///
/// Frames that don't decode to a [`ClientEvent`] are logged and skipped.
/// Browser clients send nothing else, so there is nobody to report to.
async fn read_loop<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
) -> Result<(), SensorcastError> {
    let conn_id = conn.id();

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                return Ok(());
            }
            // A dropped peer is the normal way a session ends.
            Err(e) if e.is_disconnect() => {
                tracing::debug!(%conn_id, error = %e, "connection dropped");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode event");
                continue;
            }
        };

        tracing::trace!(%conn_id, event = event.name(), "event received");
        state.relay.submit(conn_id, event).await?;
    }
}

/// Drains the outbound queue onto the socket. Ends when the relay drops
/// the sending half or the socket stops accepting writes.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut outbox: PeerReceiver,
    state: Arc<ServerState<C>>,
) {
    let conn_id = conn.id();

    while let Some(event) = outbox.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn_id, event = event.name(), error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}
