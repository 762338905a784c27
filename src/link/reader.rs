//! Background link reader.
//!
//! One reader task pulls bytes from the transport, frames them into lines,
//! buffers non-empty lines on the [`LineQueue`], and forwards every line to a
//! single dispatch task that calls the listeners in arrival order.
//!
//! ```text
//!  Transport ──bytes──▶ reader task ──lines──▶ LineQueue (next_message)
//!                           │
//!                           └──mpsc──▶ dispatch task ──▶ ListenerSet
//! ```

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{Notify, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::core::Transport;
use crate::core::constants::READ_BURST;
use crate::protocol::{Framer, escape_line};

use super::config::SessionConfig;
use super::listener::ListenerSet;
use super::queue::LineQueue;

/// Transport shared between the reader and request senders.
pub(crate) type SharedTransport = Arc<Mutex<Box<dyn Transport>>>;

pub(crate) fn lock_transport(transport: &SharedTransport) -> MutexGuard<'_, Box<dyn Transport>> {
    transport.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a running reader and its dispatcher.
#[derive(Debug)]
pub(crate) struct ReaderHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    reader: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl ReaderHandle {
    /// Ask the reader to stop. Idempotent.
    pub(crate) fn signal(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// True once the reader loop has exited.
    pub(crate) fn is_finished(&self) -> bool {
        self.reader.is_finished()
    }

    /// Stop the reader and wait for queued dispatch to drain.
    pub(crate) async fn join(mut self) {
        self.signal();
        if let Err(err) = self.reader.await {
            tracing::error!(error = %err, "link reader task failed");
        }
        if let Err(err) = self.dispatcher.await {
            tracing::error!(error = %err, "listener dispatch task failed");
        }
    }
}

/// Spawn the reader and dispatcher tasks for an open transport.
pub(crate) fn spawn(
    transport: SharedTransport,
    queue: Arc<LineQueue>,
    listeners: Arc<ListenerSet>,
    config: &SessionConfig,
) -> ReaderHandle {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (line_tx, line_rx) = mpsc::unbounded_channel();

    let data_ready = Arc::new(Notify::new());
    {
        let notify = data_ready.clone();
        lock_transport(&transport).attach_waker(Arc::new(move || notify.notify_one()));
    }

    let reader = LinkReader {
        transport,
        queue,
        line_tx,
        data_ready,
        framer: Framer::with_max_len(config.max_frame_len),
        frame_poll: config.frame_poll,
        idle_poll: config.idle_poll,
    };

    ReaderHandle {
        shutdown_tx: Some(shutdown_tx),
        reader: tokio::spawn(reader.run(shutdown_rx)),
        dispatcher: tokio::spawn(dispatch(line_rx, listeners)),
    }
}

struct LinkReader {
    transport: SharedTransport,
    queue: Arc<LineQueue>,
    line_tx: mpsc::UnboundedSender<Vec<u8>>,
    data_ready: Arc<Notify>,
    framer: Framer,
    frame_poll: std::time::Duration,
    idle_poll: std::time::Duration,
}

impl LinkReader {
    async fn run(mut self, mut shutdown_rx: oneshot::Receiver<()>) {
        tracing::debug!("link reader started");
        let mut lines = Vec::new();

        loop {
            let outcome = self.read_burst(&mut lines);
            for line in lines.drain(..) {
                self.deliver(line);
            }

            match outcome {
                Err(err) => {
                    tracing::error!(error = %err, "link read failed, stopping reader");
                    break;
                }
                Ok(true) => {
                    if !matches!(shutdown_rx.try_recv(), Err(TryRecvError::Empty)) {
                        break;
                    }
                    tokio::task::yield_now().await;
                }
                Ok(false) => {
                    let wait = if self.framer.in_frame() {
                        self.frame_poll
                    } else {
                        self.idle_poll
                    };
                    tokio::select! {
                        _ = &mut shutdown_rx => break,
                        _ = self.data_ready.notified() => {}
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
            }
        }

        lock_transport(&self.transport).close();
        tracing::debug!(
            discarded = self.framer.discarded(),
            "link reader stopped, transport closed"
        );
    }

    /// Read while bytes are ready, up to one burst.
    ///
    /// Returns `Ok(true)` if the burst limit was hit and more may be waiting.
    fn read_burst(&mut self, lines: &mut Vec<Vec<u8>>) -> io::Result<bool> {
        let mut transport = lock_transport(&self.transport);
        for _ in 0..READ_BURST {
            if !transport.is_ready()? {
                return Ok(false);
            }
            let byte = transport.read_byte()?;
            if let Some(line) = self.framer.push(byte) {
                lines.push(line);
            }
        }
        Ok(true)
    }

    fn deliver(&self, line: Vec<u8>) {
        tracing::trace!(line = %escape_line(&line), "line received");
        if !line.is_empty() {
            self.queue.push(line.clone());
        }
        if self.line_tx.send(line).is_err() {
            tracing::warn!("listener dispatch stopped, dropping line");
        }
    }
}

async fn dispatch(mut rx: mpsc::UnboundedReceiver<Vec<u8>>, listeners: Arc<ListenerSet>) {
    while let Some(line) = rx.recv().await {
        listeners.dispatch(&line);
    }
    tracing::debug!("listener dispatch drained");
}
