//! Correlating stream client.
//!
//! The client has two strictly separate modes:
//!
//! - **Synchronous** (default): [`Client::send`] writes one framed message
//!   and then reads exactly one framed reply. There is no receiver task;
//!   callers must not invoke `send` concurrently.
//! - **Concurrent**: enabled by supplying a correlator pair at build time.
//!   `send` tags the message, registers a rendezvous keyed by the id,
//!   writes under the write mutex, and waits for the receiver task to
//!   deliver the matching reply, hit the timeout, or observe close.
//!
//! A single receiver task reads frames for the lifetime of a concurrent
//! client. Frames it cannot route (read errors, extract failures,
//! responses nobody is waiting for) land in a bounded dead-letter queue
//! that overflows by dropping, never by blocking.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;

use linerpc_common::protocol::{LinerpcError, Result};
use linerpc_common::transport::{LineFramer, MessageFramer};

use crate::correlate::{AssignId, ExtractId};

/// Default per-request timeout in concurrent mode.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Smallest dead-letter queue the client will allocate; larger capacities
/// are honored, smaller ones are raised to this floor.
pub const MIN_DEAD_LETTER_CAPACITY: usize = 4096;

/// A frame the receiver could not route back to a pending request.
#[derive(Debug)]
pub struct DeadLetterItem {
    /// The offending frame, empty when the read itself failed.
    pub response: Vec<u8>,
    /// Why the frame could not be delivered.
    pub error: LinerpcError,
}

type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<Vec<u8>>>>>;
type BoxReader = Box<dyn AsyncBufRead + Unpin + Send>;
type BoxWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Builder for [`Client`]. The synchronous/concurrent mode split is decided
/// here: supplying a correlator pair via [`correlated`](Self::correlated)
/// is the only way to enable the receiver task, so a half-configured
/// concurrent client cannot be constructed.
pub struct ClientBuilder {
    request_timeout: Duration,
    dead_letter_capacity: usize,
    framer: Arc<dyn MessageFramer>,
    correlator: Option<(AssignId, ExtractId)>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            dead_letter_capacity: MIN_DEAD_LETTER_CAPACITY,
            framer: Arc::new(LineFramer),
            correlator: None,
        }
    }

    /// Per-request timeout for concurrent sends. Defaults to one minute.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Dead-letter queue capacity. Values below the floor of 4096 are
    /// raised to it.
    pub fn dead_letter_capacity(mut self, capacity: usize) -> Self {
        self.dead_letter_capacity = capacity.max(MIN_DEAD_LETTER_CAPACITY);
        self
    }

    /// Replace the default line framer.
    pub fn framer(mut self, framer: Arc<dyn MessageFramer>) -> Self {
        self.framer = framer;
        self
    }

    /// Enable concurrent mode with the given correlator pair.
    pub fn correlated(mut self, assign_id: AssignId, extract_id: ExtractId) -> Self {
        self.correlator = Some((assign_id, extract_id));
        self
    }

    /// Connect the client over the given stream halves, spawning the
    /// receiver task when a correlator was supplied.
    pub fn connect(
        self,
        reader: impl AsyncRead + Unpin + Send + 'static,
        writer: impl AsyncWrite + Unpin + Send + 'static,
    ) -> Client {
        let boxed_reader: BoxReader = Box::new(BufReader::new(reader));
        let writer: Arc<Mutex<BoxWriter>> =
            Arc::new(Mutex::new(Box::new(BufWriter::new(writer))));

        let (dead_letter_tx, dead_letter_rx) = mpsc::channel(self.dead_letter_capacity);
        let (done_tx, _) = watch::channel(false);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let (reader, assign_id, receiver_task) = match self.correlator {
            None => (Some(Mutex::new(boxed_reader)), None, None),
            Some((assign_id, extract_id)) => {
                let task = tokio::spawn(receiver_loop(
                    boxed_reader,
                    Arc::clone(&self.framer),
                    extract_id,
                    Arc::clone(&pending),
                    dead_letter_tx.clone(),
                    done_tx.subscribe(),
                ));
                (None, Some(assign_id), Some(task))
            }
        };

        Client {
            writer,
            reader,
            framer: self.framer,
            pending,
            assign_id,
            dead_letter_rx: Mutex::new(dead_letter_rx),
            _dead_letter_tx: dead_letter_tx,
            request_timeout: self.request_timeout,
            done_tx,
            receiver_task: Mutex::new(receiver_task),
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A stream client that writes framed messages and waits for replies.
pub struct Client {
    writer: Arc<Mutex<BoxWriter>>,
    /// Present only in synchronous mode; concurrent mode moves the reader
    /// into the receiver task.
    reader: Option<Mutex<BoxReader>>,
    framer: Arc<dyn MessageFramer>,
    pending: PendingMap,
    assign_id: Option<AssignId>,
    dead_letter_rx: Mutex<mpsc::Receiver<DeadLetterItem>>,
    _dead_letter_tx: mpsc::Sender<DeadLetterItem>,
    request_timeout: Duration,
    done_tx: watch::Sender<bool>,
    receiver_task: Mutex<Option<JoinHandle<()>>>,
}

impl Client {
    /// A synchronous-mode client with default options over the given
    /// stream halves.
    pub fn new(
        reader: impl AsyncRead + Unpin + Send + 'static,
        writer: impl AsyncWrite + Unpin + Send + 'static,
    ) -> Self {
        ClientBuilder::new().connect(reader, writer)
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Whether this client runs in concurrent mode with a receiver task.
    pub fn is_correlated(&self) -> bool {
        self.assign_id.is_some()
    }

    /// Send a message and wait for its reply.
    ///
    /// In synchronous mode this writes the frame and reads exactly one
    /// frame back; callers must not overlap sends. In concurrent mode the
    /// reply is matched by correlation id; `Ok(None)` means the message was
    /// fire-and-forget (the assigner produced no id). Waiting ends with the
    /// matched reply, a [`LinerpcError::RequestTimedOut`], or
    /// [`LinerpcError::Closed`] when the client shuts down first.
    pub async fn send(&self, msg: &[u8]) -> Result<Option<Vec<u8>>> {
        if *self.done_tx.borrow() {
            return Err(LinerpcError::Closed);
        }

        let Some(assign_id) = self.assign_id.as_deref() else {
            return self.send_sync(msg).await;
        };

        let (id, payload) = assign_id(msg)?;
        let Some(id) = id else {
            // Untracked message: write it and move on.
            self.write_message(&payload).await?;
            return Ok(None);
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), reply_tx);

        if let Err(e) = self.write_message(&payload).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        let mut done_rx = self.done_tx.subscribe();
        tokio::select! {
            reply = reply_rx => match reply {
                Ok(bytes) => Ok(Some(bytes)),
                // The pending table was dropped during close.
                Err(_) => Err(LinerpcError::Closed),
            },
            _ = async {
                loop {
                    if *done_rx.borrow_and_update() {
                        return;
                    }
                    if done_rx.changed().await.is_err() {
                        return;
                    }
                }
            } => Err(LinerpcError::Closed),
            _ = tokio::time::sleep(self.request_timeout) => {
                self.pending.lock().await.remove(&id);
                Err(LinerpcError::RequestTimedOut)
            }
        }
    }

    async fn send_sync(&self, msg: &[u8]) -> Result<Option<Vec<u8>>> {
        self.write_message(msg).await?;

        let Some(reader) = &self.reader else {
            // Unreachable by construction: sync mode always keeps the
            // reader.
            return Err(LinerpcError::Closed);
        };
        let mut reader = reader.lock().await;
        match self.framer.read_message(&mut **reader).await? {
            Some(reply) => Ok(Some(reply)),
            None => Err(LinerpcError::Closed),
        }
    }

    async fn write_message(&self, msg: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        self.framer.write_message(writer.as_mut(), msg).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Take the oldest dead-lettered frame, waiting up to one second for
    /// one to arrive. `None` means the queue stayed empty.
    pub async fn pop_dead_letter(&self) -> Option<DeadLetterItem> {
        let mut rx = self.dead_letter_rx.lock().await;
        match tokio::time::timeout(Duration::from_secs(1), rx.recv()).await {
            Ok(item) => item,
            Err(_) => None,
        }
    }

    /// Shut the client down. Idempotent.
    ///
    /// Signals the done channel, shuts the writer down, drops the pending
    /// table (waiters observe the close, not a per-entry signal), and waits
    /// for the receiver task to finish.
    pub async fn close(&self) -> Result<()> {
        let was_closed = self.done_tx.send_replace(true);
        if !was_closed {
            let mut writer = self.writer.lock().await;
            if let Err(e) = writer.shutdown().await {
                tracing::debug!(error = %e, "error shutting down writer");
            }
        }

        self.pending.lock().await.clear();

        if let Some(task) = self.receiver_task.lock().await.take() {
            if let Err(e) = task.await {
                tracing::debug!(error = %e, "receiver task failed");
            }
        }
        Ok(())
    }
}

/// Reads frames for the lifetime of a concurrent-mode client and routes
/// them to waiting senders.
async fn receiver_loop(
    mut reader: BoxReader,
    framer: Arc<dyn MessageFramer>,
    extract_id: ExtractId,
    pending: PendingMap,
    dead_letters: mpsc::Sender<DeadLetterItem>,
    mut done_rx: watch::Receiver<bool>,
) {
    loop {
        let frame = tokio::select! {
            _ = done_rx.wait_for(|closed| *closed) => return,
            frame = framer.read_message(&mut *reader) => frame,
        };

        let frame = match frame {
            // Clean end of stream terminates the receiver.
            Ok(None) => return,
            Ok(Some(frame)) => frame,
            Err(LinerpcError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => return,
            Err(e) => {
                push_dead_letter(
                    &dead_letters,
                    DeadLetterItem {
                        response: Vec::new(),
                        error: e,
                    },
                );
                continue;
            }
        };

        match (*extract_id)(&frame) {
            Err(e) => push_dead_letter(
                &dead_letters,
                DeadLetterItem {
                    response: frame,
                    error: e,
                },
            ),
            Ok((None, _)) => {
                tracing::debug!("dropping frame without a correlation id");
            }
            Ok((Some(id), payload)) => {
                let waiter = pending.lock().await.remove(&id);
                match waiter {
                    Some(reply_tx) => {
                        // The waiter may have timed out between removal and
                        // delivery; nothing to do about it here.
                        let _ = reply_tx.send(payload);
                    }
                    None => push_dead_letter(
                        &dead_letters,
                        DeadLetterItem {
                            response: frame,
                            error: LinerpcError::NoPendingRequest,
                        },
                    ),
                }
            }
        }
    }
}

/// Queue a dead letter without blocking; a full queue drops the item.
fn push_dead_letter(queue: &mpsc::Sender<DeadLetterItem>, item: DeadLetterItem) {
    if queue.try_send(item).is_err() {
        tracing::debug!("dead letter queue full, dropping item");
    }
}
