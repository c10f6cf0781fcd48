//! Framed stream server.
//!
//! [`StreamServer`] drives a single duplex connection: one read loop pulls
//! frames off the stream and hands each one to the configured
//! [`MessageHandler`] in its own task, so a slow handler never blocks the
//! next frame. Replies are framed and flushed under a per-connection write
//! mutex, which keeps concurrent handler output from interleaving on the
//! wire.
//!
//! Because handlers run concurrently, replies across frames leave in
//! completion order, not arrival order. Peers must correlate by request id
//! rather than position; within one batch the dispatcher already preserves
//! order.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::{watch, Mutex};
use tokio::task::{JoinHandle, JoinSet};

use linerpc_common::protocol::{LinerpcError, Result};
use linerpc_common::transport::MessageFramer;

/// Handles one inbound message and produces the complete reply buffer.
///
/// An empty buffer means "nothing to send" (e.g. the message held only
/// notifications); the server then writes no frame at all.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_message(&self, msg: &[u8]) -> Vec<u8>;
}

type BoxReader = Box<dyn AsyncBufRead + Unpin + Send>;
type BoxWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Orchestrates framing, per-message task fan-out and serialized writes for
/// a single duplex connection.
pub struct StreamServer {
    conn: Mutex<Option<(BoxReader, BoxWriter)>>,
    framer: Arc<dyn MessageFramer>,
    handler: Arc<dyn MessageHandler>,
    shutdown_tx: watch::Sender<bool>,
    read_task: Mutex<Option<JoinHandle<()>>>,
}

impl StreamServer {
    /// Create a server over the given duplex stream halves.
    pub fn new(
        reader: impl AsyncRead + Unpin + Send + 'static,
        writer: impl AsyncWrite + Unpin + Send + 'static,
        framer: Arc<dyn MessageFramer>,
        handler: Arc<dyn MessageHandler>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            conn: Mutex::new(Some((
                Box::new(BufReader::new(reader)),
                Box::new(BufWriter::new(writer)),
            ))),
            framer,
            handler,
            shutdown_tx,
            read_task: Mutex::new(None),
        }
    }

    /// Start the read loop. Returns immediately; the loop runs until the
    /// peer closes the stream or [`shutdown`](Self::shutdown) is called.
    pub async fn serve(&self) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let Some((reader, writer)) = conn.take() else {
            return Err(LinerpcError::Connection(
                "server is already serving".to_string(),
            ));
        };

        let framer = Arc::clone(&self.framer);
        let handler = Arc::clone(&self.handler);
        let shutdown_rx = self.shutdown_tx.subscribe();

        let task = tokio::spawn(connection_loop(reader, writer, framer, handler, shutdown_rx));
        *self.read_task.lock().await = Some(task);
        Ok(())
    }

    /// Stop reading and wait for outstanding handler tasks.
    ///
    /// With a `deadline`, waits at most that long before giving up on
    /// stragglers; without one, waits until every handler task has
    /// finished.
    pub async fn shutdown(&self, deadline: Option<Duration>) -> Result<()> {
        let _ = self.shutdown_tx.send(true);

        let Some(task) = self.read_task.lock().await.take() else {
            return Ok(());
        };

        match deadline {
            None => task
                .await
                .map_err(|e| LinerpcError::Connection(format!("connection task failed: {}", e))),
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(result) => result.map_err(|e| {
                    LinerpcError::Connection(format!("connection task failed: {}", e))
                }),
                Err(_) => Err(LinerpcError::Connection(
                    "shutdown deadline exceeded".to_string(),
                )),
            },
        }
    }
}

async fn connection_loop(
    mut reader: BoxReader,
    writer: BoxWriter,
    framer: Arc<dyn MessageFramer>,
    handler: Arc<dyn MessageHandler>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let writer = Arc::new(Mutex::new(writer));
    let mut tasks: JoinSet<()> = JoinSet::new();

    loop {
        let frame = tokio::select! {
            _ = shutdown_rx.wait_for(|stop| *stop) => break,
            frame = framer.read_message(&mut *reader) => frame,
        };

        let msg = match frame {
            // Peer closed the stream.
            Ok(None) => break,
            Ok(Some(msg)) => msg,
            Err(LinerpcError::Io(e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                ) =>
            {
                tokio::time::sleep(Duration::from_micros(10)).await;
                continue;
            }
            Err(e) => {
                tracing::debug!(error = %e, "read failed, closing connection");
                break;
            }
        };

        let writer = Arc::clone(&writer);
        let framer = Arc::clone(&framer);
        let handler = Arc::clone(&handler);
        tasks.spawn(async move {
            let reply = handler.handle_message(&msg).await;
            if reply.is_empty() {
                return;
            }
            let mut writer = writer.lock().await;
            if let Err(e) = framer.write_message(writer.as_mut(), &reply).await {
                tracing::warn!(error = %e, "failed to write reply frame");
                return;
            }
            if let Err(e) = writer.flush().await {
                tracing::warn!(error = %e, "failed to flush reply");
            }
        });
    }

    // Let in-flight handlers finish before the connection goes away.
    while tasks.join_next().await.is_some() {}
    tracing::debug!("connection loop finished");
}
