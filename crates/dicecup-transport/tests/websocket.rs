//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener and a real `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use dicecup_transport::{
        Connection, Incoming, Transport, TransportError, WebSocketConnection, WebSocketTransport,
    };
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    type Client = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on an OS-assigned port, connects a client to `path`, and
    /// returns both ends.
    async fn pair(path: &str) -> (WebSocketConnection, Client) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        accept_one(transport, path).await
    }

    async fn accept_one(
        mut transport: WebSocketTransport,
        path: &str,
    ) -> (WebSocketConnection, Client) {
        let addr = transport.local_addr().expect("bound address");

        let server = tokio::spawn(async move { transport.accept().await.expect("should accept") });
        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}{path}"))
            .await
            .expect("client should connect");
        let conn = server.await.expect("accept task should complete");
        (conn, client)
    }

    #[tokio::test]
    async fn test_websocket_accept_records_request_path() {
        let (conn, _client) = pair("/ab12/ws").await;
        assert_eq!(conn.path(), "/ab12/ws");
        assert!(conn.id().into_inner() > 0);
    }

    #[tokio::test]
    async fn test_websocket_send_text_and_receive_data() {
        let (conn, mut client) = pair("/ab12").await;

        conn.send_text(r#"{"kind":"roll"}"#).await.expect("send should succeed");
        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_text());
        assert_eq!(msg.into_text().unwrap().as_str(), r#"{"kind":"roll"}"#);

        client
            .send(Message::Binary(b"hello from client".to_vec().into()))
            .await
            .unwrap();
        let received = conn.recv().await.expect("recv should succeed");
        assert_eq!(received, Some(Incoming::Data(b"hello from client".to_vec())));
    }

    #[tokio::test]
    async fn test_websocket_ping_reaches_client_and_pong_is_heartbeat() {
        let (conn, mut client) = pair("/ab12").await;

        conn.ping().await.expect("ping should succeed");
        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_ping());

        client.send(Message::Pong(Vec::new().into())).await.unwrap();
        assert_eq!(conn.recv().await.unwrap(), Some(Incoming::Heartbeat));
    }

    #[tokio::test]
    async fn test_websocket_send_while_recv_is_pending() {
        let (conn, mut client) = pair("/ab12").await;
        let conn = std::sync::Arc::new(conn);

        let reader = {
            let conn = std::sync::Arc::clone(&conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The parked reader must not hold up the writer.
        tokio::time::timeout(Duration::from_secs(1), conn.send_text("event"))
            .await
            .expect("send blocked behind recv")
            .unwrap();
        assert!(client.next().await.unwrap().unwrap().is_text());

        client.send(Message::Close(None)).await.unwrap();
        assert_eq!(reader.await.unwrap().unwrap(), None);
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (conn, mut client) = pair("/ab12").await;

        client.send(Message::Close(None)).await.unwrap();

        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_oversized_message_is_rejected() {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind")
            .with_max_message_size(16);
        let (conn, mut client) = accept_one(transport, "/ab12").await;

        client.send(Message::Text("small".into())).await.unwrap();
        assert_eq!(conn.recv().await.unwrap(), Some(Incoming::Data(b"small".to_vec())));

        client.send(Message::Text("x".repeat(64).into())).await.unwrap();
        let err = conn.recv().await.unwrap_err();
        assert!(
            matches!(err, TransportError::MessageTooLarge { limit: 16, .. }),
            "unexpected error: {err:?}"
        );
    }
}
