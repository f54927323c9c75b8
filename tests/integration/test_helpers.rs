// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use wsrelay::config::Config;
use wsrelay::core::ClientId;
use wsrelay::core::state::ServerState;
use wsrelay::server::build_router;

/// How long a test waits for an expected message before failing.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a test watches a client to assert that nothing arrives.
pub const SILENCE_WINDOW: Duration = Duration::from_millis(200);

/// Sets up minimal tracing for tests. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("warn"))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// A configuration suitable for tests: short writer timeout, defaults otherwise.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        writer_shutdown_timeout_ms: 200,
        ..Config::default()
    }
}

/// A relay server running on an ephemeral local port.
pub struct TestServer {
    pub state: Arc<ServerState>,
    pub addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    /// Starts a server with the default test configuration.
    pub async fn start() -> Self {
        Self::with_config(test_config()).await
    }

    /// Starts a server with a custom configuration.
    pub async fn with_config(config: Config) -> Self {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no local address");

        let state = ServerState::new(config);
        let (shutdown_tx, _) = broadcast::channel(1);
        let router = build_router(state.clone(), shutdown_tx.clone());
        let mut shutdown_rx = shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await
        });

        Self {
            state,
            addr,
            shutdown_tx,
            handle,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.addr, self.state.config.relay.ws_path)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Opens a WebSocket connection. The welcome message is left unread.
    pub async fn connect(&self) -> TestClient {
        self.try_connect()
            .await
            .expect("WebSocket handshake failed")
    }

    /// Opens a WebSocket connection, returning the handshake error on failure.
    pub async fn try_connect(&self) -> Result<TestClient, tokio_tungstenite::tungstenite::Error> {
        let stream = TcpStream::connect(self.addr)
            .await
            .expect("Failed to connect to test server");
        let local_addr = stream.local_addr().expect("Client has no local address");
        let (ws, _response) = tokio_tungstenite::client_async(self.ws_url(), stream).await?;
        Ok(TestClient {
            ws,
            local_addr,
            client_id: ClientId::derive(&local_addr.to_string()),
        })
    }

    /// Connects and consumes the welcome message, then waits until the server
    /// has registered `expected_total` clients.
    pub async fn join(&self, expected_total: usize) -> TestClient {
        let mut client = self.connect().await;
        client.expect_welcome().await;
        self.wait_for_clients(expected_total).await;
        client
    }

    /// Polls the registry until it holds exactly `n` connections.
    pub async fn wait_for_clients(&self, n: usize) {
        let result = tokio::time::timeout(RECV_TIMEOUT, async {
            while self.state.registry.len() != n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(
            result.is_ok(),
            "Expected {} registered clients, found {}",
            n,
            self.state.registry.len()
        );
    }

    /// Signals every session to close and stops the HTTP server.
    pub fn signal_shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    pub async fn shutdown(self) {
        self.signal_shutdown();
        let _ = tokio::time::timeout(RECV_TIMEOUT, self.handle).await;
    }
}

/// A WebSocket client connected to a `TestServer`.
pub struct TestClient {
    pub ws: WebSocketStream<TcpStream>,
    pub local_addr: SocketAddr,
    /// The identifier the server derives for this client.
    pub client_id: ClientId,
}

impl TestClient {
    /// Returns the next data message, skipping control frames.
    pub async fn recv(&mut self) -> Message {
        tokio::time::timeout(RECV_TIMEOUT, async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(msg)) => return msg,
                    Some(Err(e)) => panic!("WebSocket error while waiting for a message: {e}"),
                    None => panic!("Connection ended while waiting for a message"),
                }
            }
        })
        .await
        .expect("Timed out waiting for a message")
    }

    pub async fn recv_text(&mut self) -> String {
        match self.recv().await {
            Message::Text(t) => t.to_string(),
            other => panic!("Expected a text message, got {:?}", other),
        }
    }

    pub async fn expect_welcome(&mut self) {
        let welcome = self.recv_text().await;
        assert_eq!(welcome, format!("clientID:{}", self.client_id));
    }

    /// Asserts that no data message arrives within `SILENCE_WINDOW`.
    pub async fn expect_silence(&mut self) {
        let next = tokio::time::timeout(SILENCE_WINDOW, async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    other => return other,
                }
            }
        })
        .await;
        if let Ok(Some(Ok(msg))) = next {
            panic!("Expected no message, got {:?}", msg);
        }
    }

    pub async fn send_text(&mut self, text: &str) {
        self.ws
            .send(Message::text(text))
            .await
            .expect("Failed to send text message");
    }

    pub async fn send_binary(&mut self, data: &[u8]) {
        self.ws
            .send(Message::binary(data.to_vec()))
            .await
            .expect("Failed to send binary message");
    }

    /// Performs a client-initiated close and waits for the server's reply.
    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
        let _ = tokio::time::timeout(RECV_TIMEOUT, async {
            while let Some(Ok(_)) = self.ws.next().await {}
        })
        .await;
    }
}
