// src/connection/writer.rs

//! The per-connection writer task that owns the outbound half of the transport.

use crate::core::protocol::RelayFrame;
use crate::core::state::ConnectionId;
use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Drains a connection's outbound queue into its transport sink.
pub(crate) struct OutboundWriter<S> {
    connection_id: ConnectionId,
    sink: S,
    rx: mpsc::Receiver<RelayFrame>,
    finish_rx: oneshot::Receiver<()>,
}

impl<S> OutboundWriter<S>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    pub(crate) fn new(
        connection_id: ConnectionId,
        sink: S,
        rx: mpsc::Receiver<RelayFrame>,
        finish_rx: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            connection_id,
            sink,
            rx,
            finish_rx,
        }
    }

    /// Writes frames in queue order until told to finish or the sink fails.
    ///
    /// On finish, frames already queued are flushed before a Close frame is
    /// sent. A write failure ends the task at once; dropping the receiver then
    /// marks the connection closed for any further dispatch.
    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                _ = &mut self.finish_rx => break,
                frame = self.rx.recv() => match frame {
                    Some(frame) => {
                        if let Err(e) = self.sink.send(frame.into()).await {
                            debug!("Writer for connection {} stopped: {}", self.connection_id, e);
                            return;
                        }
                    }
                    None => break,
                },
            }
        }

        self.rx.close();
        while let Some(frame) = self.rx.recv().await {
            if self.sink.send(frame.into()).await.is_err() {
                return;
            }
        }
        // The peer may already have closed its side; a failure here is expected.
        let _ = self.sink.send(Message::Close(None)).await;
        let _ = self.sink.close().await;
        debug!("Writer for connection {} finished.", self.connection_id);
    }
}
