//! `SensorcastServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → relay.

use std::net::SocketAddr;
use std::sync::Arc;

use sensorcast_protocol::{Codec, JsonCodec};
use sensorcast_relay::{RelayHandle, spawn_relay};
use sensorcast_transport::{Transport, TransportError, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{SensorcastError, ServerConfig};

/// Shared server state passed to each connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) relay: RelayHandle,
    pub(crate) codec: C,
    pub(crate) outbox_capacity: usize,
}

/// Builder for configuring and starting a Sensorcast server.
///
/// # Example
///
/// ```rust,ignore
/// let server = SensorcastServer::builder()
///     .bind("127.0.0.1:0")
///     .outbox_capacity(64)
///     .build()
///     .await?;
/// ```
pub struct SensorcastServerBuilder {
    config: ServerConfig,
}

impl SensorcastServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the per-connection outbound queue depth.
    pub fn outbox_capacity(mut self, capacity: usize) -> Self {
        self.config.outbox_capacity = capacity;
        self
    }

    /// Binds the listener and starts the relay actor.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`. Must be called from
    /// inside a Tokio runtime.
    pub async fn build(self) -> Result<SensorcastServer<JsonCodec>, SensorcastError> {
        let config = self.config.validated();
        let transport = WebSocketTransport::bind(&config.bind_addr).await?;

        let state = Arc::new(ServerState {
            relay: spawn_relay(config.relay_channel_size),
            codec: JsonCodec,
            outbox_capacity: config.outbox_capacity,
        });

        Ok(SensorcastServer { transport, state })
    }
}

impl Default for SensorcastServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Sensorcast server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct SensorcastServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl SensorcastServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> SensorcastServerBuilder {
        SensorcastServerBuilder::new()
    }
}

impl<C: Codec> SensorcastServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// Returns a handle to the relay, for inspecting who is presenting.
    pub fn relay(&self) -> RelayHandle {
        self.state.relay.clone()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), SensorcastError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves.
    ///
    /// Spawns one handler task per accepted connection. A connection that
    /// fails never takes the loop down with it. On shutdown the listener is
    /// closed and the relay actor stopped; connections already accepted see
    /// their relay calls fail and wind down on their own.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), SensorcastError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(addr = %self.transport.local_addr(), "Sensorcast relay running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(TransportError::Shutdown) => break,
                    Err(e) => tracing::warn!(error = %e, "accept failed"),
                },
                () = &mut shutdown => break,
            }
        }

        self.transport.shutdown().await?;
        // An already stopped actor is fine here.
        let _ = self.state.relay.shutdown().await;
        tracing::info!("Sensorcast relay stopped");
        Ok(())
    }
}
