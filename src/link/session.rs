//! Connection session: owns the transport and its reader.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::core::{LinkError, LinkResult, Transport};
use crate::protocol::{Message, Request, escape_line};

use super::config::SessionConfig;
use super::listener::{LineListener, ListenerId, ListenerSet};
use super::queue::LineQueue;
use super::reader::{self, ReaderHandle, SharedTransport, lock_transport};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport.
    Closed,
    /// Transport attached, handshake running.
    Opening,
    /// Reader running.
    Open,
    /// Reader stopping.
    Closing,
}

/// Base station version reported during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceVersion {
    /// Firmware version.
    pub version: String,
    /// Free-form info.
    pub info: String,
}

/// Cloneable handle for writing requests from other tasks.
#[derive(Clone)]
pub struct RequestSender {
    transport: SharedTransport,
}

impl std::fmt::Debug for RequestSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSender").finish_non_exhaustive()
    }
}

impl RequestSender {
    /// Write a request.
    pub fn send(&self, request: &Request) -> LinkResult<()> {
        write_request(&self.transport, request)
    }

    /// Write a request, logging instead of returning failures.
    pub fn send_checked(&self, request: &Request) -> bool {
        match self.send(request) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(request = %request, error = %err, "request not sent");
                false
            }
        }
    }
}

fn write_request(transport: &SharedTransport, request: &Request) -> LinkResult<()> {
    let mut transport = lock_transport(transport);
    if !transport.is_open() {
        return Err(LinkError::NotConnected);
    }
    transport.write(&request.to_wire())?;
    tracing::debug!(request = %request, "request sent");
    Ok(())
}

/// A link to one base station.
///
/// Owns the transport and the background reader. Inbound lines are buffered
/// for [`next_message`](Self::next_message) and fanned out to registered
/// listeners.
pub struct ConnectionSession {
    config: SessionConfig,
    state: SessionState,
    transport: Option<SharedTransport>,
    queue: Arc<LineQueue>,
    listeners: Arc<ListenerSet>,
    reader: Option<ReaderHandle>,
    version: Option<DeviceVersion>,
}

impl std::fmt::Debug for ConnectionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSession")
            .field("state", &self.state)
            .field("queued", &self.queue.len())
            .field("listeners", &self.listeners.len())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl Default for ConnectionSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl ConnectionSession {
    /// Create a closed session.
    pub fn new(config: SessionConfig) -> Self {
        let queue = Arc::new(LineQueue::new(config.queue_capacity));
        Self {
            config,
            state: SessionState::Closed,
            transport: None,
            queue,
            listeners: Arc::new(ListenerSet::new()),
            reader: None,
            version: None,
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Lifecycle state.
    ///
    /// An open session whose reader has stopped on a transport fault
    /// reports `Closed`.
    pub fn state(&self) -> SessionState {
        if self.reader_stopped() {
            SessionState::Closed
        } else {
            self.state
        }
    }

    /// True while the session is open and its reader is running.
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Open && !self.reader_stopped()
    }

    fn reader_stopped(&self) -> bool {
        self.state == SessionState::Open
            && self.reader.as_ref().is_some_and(ReaderHandle::is_finished)
    }

    /// Attach `transport`, start the reader, and run the version handshake.
    ///
    /// Handshake failures are logged and leave the version empty.
    pub async fn open<T: Transport>(&mut self, transport: T) -> LinkResult<()> {
        if self.reader_stopped() {
            tracing::info!("releasing link after reader stopped");
            self.release().await;
        }
        if self.state != SessionState::Closed {
            return Err(LinkError::AlreadyConnected);
        }
        self.config.validate()?;

        self.state = SessionState::Opening;
        self.version = None;
        if self.queue.capacity() != self.config.queue_capacity.max(1) {
            self.queue = Arc::new(LineQueue::new(self.config.queue_capacity));
        }
        self.queue.clear();

        let name = transport.describe();
        let boxed: Box<dyn Transport> = Box::new(transport);
        let shared: SharedTransport = Arc::new(Mutex::new(boxed));
        self.reader = Some(reader::spawn(
            shared.clone(),
            self.queue.clone(),
            self.listeners.clone(),
            &self.config,
        ));
        self.transport = Some(shared);
        tracing::info!(transport = %name, "link opened");

        if self.config.handshake {
            self.startup_checks().await;
        }
        self.state = SessionState::Open;
        Ok(())
    }

    /// Open a serial port and attach it.
    #[cfg(feature = "serial")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serial")))]
    pub async fn open_serial(&mut self, port: &str, baud_rate: u32) -> LinkResult<()> {
        if self.state() != SessionState::Closed {
            return Err(LinkError::AlreadyConnected);
        }
        let transport = super::serial::SerialTransport::open(port, baud_rate)?;
        self.open(transport).await
    }

    async fn startup_checks(&mut self) {
        let request = Request::version(self.config.firmware);
        if let Err(err) = self.write(&request) {
            tracing::warn!(error = %err, "version request failed");
            return;
        }

        let timeout = self.config.handshake_timeout;
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Some(line) = self.queue.pop_timeout(remaining).await else {
                tracing::warn!(?timeout, "no version reply from base station");
                return;
            };
            match Message::decode(&line) {
                Message::Version { version, info } => {
                    tracing::info!(%version, %info, "base station version");
                    self.version = Some(DeviceVersion { version, info });
                    return;
                }
                _ => tracing::debug!(line = %escape_line(&line), "skipping line during handshake"),
            }
        }
    }

    fn write(&self, request: &Request) -> LinkResult<()> {
        let transport = self.transport.as_ref().ok_or(LinkError::NotConnected)?;
        write_request(transport, request)
    }

    /// Write a request.
    pub fn send(&self, request: &Request) -> LinkResult<()> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        self.write(request)
    }

    /// Write a request, logging instead of returning failures.
    pub fn send_checked(&self, request: &Request) -> bool {
        match self.send(request) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(request = %request, error = %err, "request not sent");
                false
            }
        }
    }

    /// Handle for writing requests from another task.
    pub fn request_sender(&self) -> LinkResult<RequestSender> {
        match &self.transport {
            Some(transport) if self.is_connected() => Ok(RequestSender {
                transport: transport.clone(),
            }),
            _ => Err(LinkError::NotConnected),
        }
    }

    /// Pop and decode the next buffered line.
    ///
    /// Returns `Ok(None)` if nothing arrives within `timeout`. Single
    /// consumer only.
    pub async fn next_message(&self, timeout: Duration) -> LinkResult<Option<Message>> {
        if let Some(line) = self.queue.try_pop() {
            return Ok(Some(Message::decode(&line)));
        }
        match (&self.reader, self.state) {
            (Some(reader), SessionState::Open) if reader.is_finished() => {
                return Err(LinkError::ReaderStopped);
            }
            (Some(_), SessionState::Open) => {}
            _ => return Err(LinkError::NotConnected),
        }
        Ok(self
            .queue
            .pop_timeout(timeout)
            .await
            .map(|line| Message::decode(&line)))
    }

    /// Like [`next_message`](Self::next_message), but a timeout is an error.
    pub async fn next_message_strict(&self, timeout: Duration) -> LinkResult<Message> {
        self.next_message(timeout)
            .await?
            .ok_or(LinkError::Timeout(timeout))
    }

    /// Register a listener for every inbound line.
    ///
    /// Listeners survive close and reopen.
    pub fn add_listener(&self, listener: Arc<dyn LineListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Discard buffered lines.
    pub fn clear_queue(&self) {
        self.queue.clear();
    }

    /// Buffered line count.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Version reported during the handshake.
    pub fn device_version(&self) -> Option<&DeviceVersion> {
        self.version.as_ref()
    }

    /// One-line connection summary for display.
    pub fn connection_message(&self) -> String {
        match (&self.version, self.is_connected()) {
            (Some(v), true) => format!("Connected: {} [{}]", v.version, v.info),
            (None, true) => "Connected: unknown []".to_string(),
            (_, false) => "Not connected".to_string(),
        }
    }

    /// Stop the reader, wait for dispatch to drain, and release the
    /// transport. Closing a closed session only logs.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            tracing::warn!("close called on a closed link");
            return;
        }
        self.release().await;
        tracing::info!("link closed");
    }

    async fn release(&mut self) {
        self.state = SessionState::Closing;
        if let Some(reader) = self.reader.take() {
            reader.join().await;
        }
        if let Some(transport) = self.transport.take() {
            lock_transport(&transport).close();
        }
        self.state = SessionState::Closed;
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.as_mut() {
            reader.signal();
        }
    }
}
