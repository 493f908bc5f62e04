//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and talk to it
//! with a `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use sensorcast_transport::{Connection, Transport, TransportError, WebSocketTransport};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn bind() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().to_string();
        (transport, addr)
    }

    async fn connect_client(addr: &str) -> ClientWs {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        ws
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (mut transport, addr) = bind().await;
        let server_handle =
            tokio::spawn(async move { transport.accept().await.expect("should accept") });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.expect("task should complete");
        assert!(server_conn.id().to_string().starts_with("conn-"));

        // JSON goes out as a text frame.
        server_conn
            .send(br#"{"event":"clear_chart"}"#)
            .await
            .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_text());
        assert_eq!(msg.into_data().as_ref(), br#"{"event":"clear_chart"}"#);

        client_ws
            .send(Message::Text(r#"{"event":"select_role","data":"audience"}"#.into()))
            .await
            .unwrap();
        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, br#"{"event":"select_role","data":"audience"}"#);

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_non_utf8_payload_goes_out_as_binary() {
        let (mut transport, addr) = bind().await;
        let server_handle = tokio::spawn(async move { transport.accept().await.unwrap() });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        server_conn.send(&[0xff, 0xfe, 0x00]).await.unwrap();
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_binary());
        assert_eq!(msg.into_data().as_ref(), &[0xff, 0xfe, 0x00]);
    }

    #[tokio::test]
    async fn test_websocket_send_is_not_blocked_by_pending_recv() {
        let (mut transport, addr) = bind().await;
        let server_handle = tokio::spawn(async move { transport.accept().await.unwrap() });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = std::sync::Arc::new(server_handle.await.unwrap());

        // Park a reader on the connection; the client never sends anything.
        let reader = {
            let conn = std::sync::Arc::clone(&server_conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(1), server_conn.send(b"tick"))
            .await
            .expect("send must not wait for the reader")
            .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"tick");

        reader.abort();
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bind().await;
        let server_handle = tokio::spawn(async move { transport.accept().await.unwrap() });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_connection_ids_are_unique() {
        let (mut transport, addr) = bind().await;
        let server_handle = tokio::spawn(async move {
            let a = transport.accept().await.unwrap();
            let b = transport.accept().await.unwrap();
            (a.id(), b.id())
        });

        let _a = connect_client(&addr).await;
        let _b = connect_client(&addr).await;
        let (a, b) = server_handle.await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_websocket_idle_socket_does_not_delay_other_clients() {
        let (mut transport, addr) = bind().await;

        // Opens TCP and never starts the handshake.
        let _idle = tokio::net::TcpStream::connect(&addr)
            .await
            .expect("raw connect should succeed");
        tokio::time::sleep(Duration::from_millis(20)).await;

        let started = std::time::Instant::now();
        let (client, server_conn) = tokio::time::timeout(Duration::from_secs(1), async {
            tokio::join!(connect_client(&addr), transport.accept())
        })
        .await
        .expect("a stalled handshake must not hold up other clients");
        let server_conn = server_conn.expect("should accept");
        assert!(started.elapsed() < Duration::from_secs(1));

        drop(client);
        server_conn.close().await.ok();
    }

    #[tokio::test]
    async fn test_websocket_accept_after_shutdown_fails() {
        let (mut transport, _addr) = bind().await;

        transport.shutdown().await.expect("shutdown should succeed");
        let result = transport.accept().await;
        assert!(matches!(result, Err(TransportError::Shutdown)));

        // A second shutdown is harmless.
        transport.shutdown().await.expect("shutdown is idempotent");
    }

    #[tokio::test]
    async fn test_websocket_shutdown_stops_listening() {
        let (transport, addr) = bind().await;
        transport.shutdown().await.unwrap();

        // The acceptor releases the listener once its abort lands.
        let refused = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if tokio::net::TcpStream::connect(&addr).await.is_err() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(refused.is_ok(), "listener should close after shutdown");
    }
}
