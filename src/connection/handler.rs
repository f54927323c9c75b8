// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a relay session.

use super::guard::ConnectionGuard;
use super::session::{SessionPhase, SessionState};
use super::writer::OutboundWriter;
use crate::core::metrics;
use crate::core::protocol::{RelayFrame, welcome_text};
use crate::core::state::{ClientConnection, ServerState};
use crate::core::RelayError;
use axum::extract::ws::{CloseFrame, Message};
use futures::{Sink, Stream, StreamExt};
use std::error::Error as _;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, broadcast, mpsc, oneshot};
use tokio_tungstenite::tungstenite::{self, error::ProtocolError};
use tracing::{debug, info, warn};

/// Why the relay loop ended.
#[derive(Debug)]
pub enum CloseReason {
    /// The peer sent a Close frame.
    PeerClosed(Option<CloseFrame>),
    /// The transport ended without a Close frame.
    StreamEnded,
    /// Reading from the transport failed.
    ReadError(axum::Error),
    /// The server is shutting down.
    Shutdown,
}

/// Runs one session to completion on an upgraded socket. This is the entry
/// point used by the upgrade route; the admission permit is released when the
/// session ends.
pub async fn serve<S>(
    socket: S,
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_rx: broadcast::Receiver<()>,
    permit: OwnedSemaphorePermit,
) where
    S: Stream<Item = Result<Message, axum::Error>>
        + Sink<Message, Error = axum::Error>
        + Send
        + 'static,
{
    let handler = ConnectionHandler::new(state, addr, shutdown_rx);
    if let Err(e) = handler.run(socket).await {
        warn!("Connection from {} terminated unexpectedly: {}", addr, e);
    }
    drop(permit);
}

/// Manages the full lifecycle of a relay session.
pub struct ConnectionHandler {
    state: Arc<ServerState>,
    conn: Arc<ClientConnection>,
    outbound_rx: Option<mpsc::Receiver<RelayFrame>>,
    shutdown_rx: broadcast::Receiver<()>,
    session: SessionState,
}

impl ConnectionHandler {
    /// Creates the connection record and its outbound queue. Nothing is
    /// registered until `run` is called.
    pub fn new(
        state: Arc<ServerState>,
        addr: SocketAddr,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        let (tx, outbound_rx) = mpsc::channel(state.config.outbound_queue_capacity);
        let conn = Arc::new(ClientConnection::new(state.next_connection_id(), addr, tx));
        let session = SessionState::new(conn.id, conn.client_id.clone());
        Self {
            state,
            conn,
            outbound_rx: Some(outbound_rx),
            shutdown_rx,
            session,
        }
    }

    pub fn connection(&self) -> &Arc<ClientConnection> {
        &self.conn
    }

    /// Drives the session: welcome, register, relay until close, deregister.
    pub async fn run<S>(mut self, socket: S) -> Result<(), RelayError>
    where
        S: Stream<Item = Result<Message, axum::Error>>
            + Sink<Message, Error = axum::Error>
            + Send
            + 'static,
    {
        let Some(outbound_rx) = self.outbound_rx.take() else {
            return Err(RelayError::Internal(
                "Outbound queue already taken for this session".into(),
            ));
        };
        let (sink, mut stream) = socket.split();
        let (finish_tx, finish_rx) = oneshot::channel();
        let mut writer =
            tokio::spawn(OutboundWriter::new(self.conn.id, sink, outbound_rx, finish_rx).run());

        self.state.stats.increment_total_connections();
        metrics::CONNECTIONS_RECEIVED_TOTAL.inc();

        // Queue the welcome before the connection becomes visible to other
        // sessions, so it is the first frame this peer receives.
        self.conn
            .send(RelayFrame::text(welcome_text(&self.conn.client_id)))?;
        let guard = ConnectionGuard::register(self.state.clone(), self.conn.clone());
        self.session.advance(SessionPhase::Registered);
        info!(
            "Client {} connected from {} (connection {}).",
            self.conn.client_id, self.conn.addr, self.conn.id
        );

        self.session.advance(SessionPhase::Relaying);
        let reason = self.relay_loop(&mut stream).await;
        self.log_close_reason(&reason);

        self.session.advance(SessionPhase::Closing);
        drop(guard);
        self.session.advance(SessionPhase::Deregistered);

        let _ = finish_tx.send(());
        let timeout = Duration::from_millis(self.state.config.writer_shutdown_timeout_ms);
        if tokio::time::timeout(timeout, &mut writer).await.is_err() {
            debug!(
                "Writer for connection {} did not finish within {:?}; aborting.",
                self.conn.id, timeout
            );
            writer.abort();
        }
        debug!(
            "Session {} ({}) ended in phase {:?} after relaying {} message(s).",
            self.conn.id,
            self.session.client_id,
            self.session.phase(),
            self.session.messages_relayed
        );
        Ok(())
    }

    /// Reads one message at a time and relays it, until the peer goes away or
    /// the server shuts down. Per-sender ordering follows from the single reader.
    async fn relay_loop<R>(&mut self, stream: &mut R) -> CloseReason
    where
        R: Stream<Item = Result<Message, axum::Error>> + Unpin,
    {
        loop {
            tokio::select! {
                // Prioritize shutdown signals over other events.
                biased;
                _ = self.shutdown_rx.recv() => return CloseReason::Shutdown,
                result = stream.next() => match result {
                    Some(Ok(Message::Close(frame))) => return CloseReason::PeerClosed(frame),
                    Some(Ok(message)) => {
                        if let Some(frame) = RelayFrame::from_message(message) {
                            self.relay(frame);
                        }
                    }
                    Some(Err(e)) => return CloseReason::ReadError(e),
                    None => return CloseReason::StreamEnded,
                },
            }
        }
    }

    fn relay(&mut self, frame: RelayFrame) {
        if let Some(text) = frame.as_text() {
            debug!("Received from {}: {}", self.conn.client_id, text);
        } else {
            debug!(
                "Received {} binary bytes from {}",
                frame.len(),
                self.conn.client_id
            );
        }
        self.state.dispatcher.broadcast_except(self.conn.id, frame);
        self.session.messages_relayed += 1;
        self.state.stats.increment_total_relayed();
        metrics::MESSAGES_RELAYED_TOTAL.inc();
    }

    fn log_close_reason(&self, reason: &CloseReason) {
        let addr = self.conn.addr;
        match reason {
            CloseReason::PeerClosed(Some(frame)) => info!(
                "Connection from {} closed by client (code {}, reason {:?}).",
                addr,
                frame.code,
                frame.reason.as_str()
            ),
            CloseReason::PeerClosed(None) => info!("Connection from {} closed by client.", addr),
            CloseReason::StreamEnded => debug!("Connection from {} closed by peer.", addr),
            CloseReason::ReadError(e) if is_normal_disconnect(e) => {
                debug!("Connection from {} closed by peer: {}", addr, e)
            }
            CloseReason::ReadError(e) => warn!("Error reading from {}: {}", addr, e),
            CloseReason::Shutdown => info!(
                "Connection handler for {} received shutdown signal.",
                addr
            ),
        }
    }
}

/// Returns true if a read error only means the peer went away.
///
/// axum wraps the transport error in its own `Error`, so the source chain is
/// searched for the underlying tungstenite or io error.
pub fn is_normal_disconnect(e: &axum::Error) -> bool {
    let mut source = e.source();
    while let Some(err) = source {
        if let Some(ws_err) = err.downcast_ref::<tungstenite::Error>() {
            return match ws_err {
                tungstenite::Error::ConnectionClosed
                | tungstenite::Error::AlreadyClosed
                | tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => {
                    true
                }
                tungstenite::Error::Io(io_err) => is_disconnect_io(io_err),
                _ => false,
            };
        }
        if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
            return is_disconnect_io(io_err);
        }
        source = err.source();
    }
    false
}

fn is_disconnect_io(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionAborted
    )
}
