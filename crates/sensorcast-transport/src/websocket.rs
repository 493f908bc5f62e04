//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! A background acceptor owns the listener. Every TCP socket it accepts is
//! upgraded in its own task, and only finished upgrades are handed to
//! [`Transport::accept`]. A client that connects and then stalls the
//! handshake ties up nothing but its own task.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// How long a freshly accepted socket gets to finish the WebSocket upgrade.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Upgraded connections waiting for `accept()`.
const READY_QUEUE: usize = 64;

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    local_addr: SocketAddr,
    ready: mpsc::Receiver<WebSocketConnection>,
    acceptor: JoinHandle<()>,
    closed: AtomicBool,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address and starts
    /// accepting sockets in the background.
    ///
    /// Must be called from inside a Tokio runtime.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        let local_addr = listener.local_addr().map_err(TransportError::BindFailed)?;
        tracing::info!(%local_addr, "WebSocket transport listening");

        let (ready_tx, ready) = mpsc::channel(READY_QUEUE);
        let acceptor = tokio::spawn(accept_loop(listener, ready_tx));

        Ok(Self {
            local_addr,
            ready,
            acceptor,
            closed: AtomicBool::new(false),
        })
    }

    /// Returns the address the listener is bound to. Useful after binding
    /// to port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    /// Returns the next connection that has completed its upgrade.
    ///
    /// Fails with [`TransportError::Shutdown`] once
    /// [`shutdown`](Transport::shutdown) has been called.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Shutdown);
        }
        self.ready.recv().await.ok_or(TransportError::Shutdown)
    }

    /// Closes the listener and abandons any upgrades still in flight.
    /// Connections already handed out are left alone.
    async fn shutdown(&self) -> Result<(), Self::Error> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.acceptor.abort();
            tracing::info!(local_addr = %self.local_addr, "WebSocket transport shut down");
        }
        Ok(())
    }
}

/// Accepts TCP sockets until the transport goes away, upgrading each one
/// concurrently.
async fn accept_loop(listener: TcpListener, ready: mpsc::Sender<WebSocketConnection>) {
    // Dropping the set (on abort or return) cancels pending upgrades.
    let mut upgrades = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    upgrades.spawn(upgrade(stream, addr, ready.clone()));
                }
                Err(e) => tracing::warn!(error = %e, "TCP accept failed"),
            },
            Some(_) = upgrades.join_next(), if !upgrades.is_empty() => {}
            () = ready.closed() => break,
        }
    }
}

/// Runs the WebSocket handshake for one socket and queues the result.
async fn upgrade(stream: TcpStream, addr: SocketAddr, ready: mpsc::Sender<WebSocketConnection>) {
    let ws = match tokio::time::timeout(HANDSHAKE_TIMEOUT, tokio_tungstenite::accept_async(stream))
        .await
    {
        Ok(Ok(ws)) => ws,
        Ok(Err(e)) => {
            tracing::debug!(%addr, error = %e, "WebSocket upgrade failed");
            return;
        }
        Err(_) => {
            tracing::debug!(%addr, "WebSocket upgrade timed out");
            return;
        }
    };

    let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
    tracing::debug!(%id, %addr, "accepted WebSocket connection");

    // Reader and writer get their own locks so a pending `recv` never
    // holds up an outbound frame.
    let (sink, stream) = ws.split();
    let conn = WebSocketConnection {
        id,
        sink: Mutex::new(sink),
        stream: Mutex::new(stream),
    };
    if ready.send(conn).await.is_err() {
        tracing::debug!(%id, "transport closed before connection was accepted");
    }
}

/// A single WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    /// Sends `data` as a text frame when it is valid UTF-8 (every JSON
    /// payload is), otherwise as a binary frame.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = match std::str::from_utf8(data) {
            Ok(text) => Message::Text(text.to_owned().into()),
            Err(_) => Message::Binary(data.to_vec().into()),
        };
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
