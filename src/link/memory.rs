//! In-memory transport.
//!
//! [`MemoryTransport`] stands in for a serial port: bytes injected through
//! the paired [`DeviceEndpoint`] become readable, and everything written is
//! captured for inspection. Useful for tests and for running without
//! hardware.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::constants::{FRAME_END, FRAME_START, REQUEST_TERMINATOR};
use crate::core::{DataWaker, Transport};

#[derive(Default)]
struct MemoryState {
    inbound: VecDeque<u8>,
    written: Vec<u8>,
    closed: bool,
    read_fault: Option<io::ErrorKind>,
    waker: Option<DataWaker>,
}

type SharedState = Arc<Mutex<MemoryState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Host side of an in-memory link.
pub struct MemoryTransport {
    state: SharedState,
}

/// Device side of an in-memory link.
#[derive(Clone)]
pub struct DeviceEndpoint {
    state: SharedState,
}

impl MemoryTransport {
    /// Create a connected transport and device pair.
    pub fn pair() -> (Self, DeviceEndpoint) {
        let state = SharedState::default();
        (
            Self {
                state: state.clone(),
            },
            DeviceEndpoint { state },
        )
    }
}

impl Transport for MemoryTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(io::ErrorKind::NotConnected.into());
        }
        state.written.extend_from_slice(bytes);
        Ok(())
    }

    fn is_ready(&mut self) -> io::Result<bool> {
        let state = lock(&self.state);
        if let Some(kind) = state.read_fault {
            return Err(io::Error::new(kind, "injected read fault"));
        }
        Ok(!state.closed && !state.inbound.is_empty())
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(io::ErrorKind::NotConnected.into());
        }
        state
            .inbound
            .pop_front()
            .ok_or_else(|| io::ErrorKind::WouldBlock.into())
    }

    fn close(&mut self) {
        let mut state = lock(&self.state);
        state.closed = true;
        state.waker = None;
    }

    fn is_open(&self) -> bool {
        !lock(&self.state).closed
    }

    fn attach_waker(&mut self, waker: DataWaker) {
        lock(&self.state).waker = Some(waker);
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

impl DeviceEndpoint {
    /// Make raw bytes readable on the host side.
    pub fn inject(&self, bytes: &[u8]) {
        let waker = {
            let mut state = lock(&self.state);
            state.inbound.extend(bytes);
            state.waker.clone()
        };
        if let Some(wake) = waker {
            wake();
        }
    }

    /// Inject one framed line: `(` + body + `)`.
    pub fn send_line(&self, body: &[u8]) {
        let mut framed = Vec::with_capacity(body.len() + 2);
        framed.push(FRAME_START);
        framed.extend_from_slice(body);
        framed.push(FRAME_END);
        self.inject(&framed);
    }

    /// Take everything the host has written so far.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut lock(&self.state).written)
    }

    /// Take written bytes split into newline-terminated commands.
    pub fn take_commands(&self) -> Vec<Vec<u8>> {
        self.take_written()
            .split(|&b| b == REQUEST_TERMINATOR)
            .filter(|c| !c.is_empty())
            .map(<[u8]>::to_vec)
            .collect()
    }

    /// Make every later readiness check fail with `kind`.
    pub fn fail_reads(&self, kind: io::ErrorKind) {
        let waker = {
            let mut state = lock(&self.state);
            state.read_fault = Some(kind);
            state.waker.clone()
        };
        if let Some(wake) = waker {
            wake();
        }
    }

    /// Whether the host side is still open.
    pub fn is_open(&self) -> bool {
        !lock(&self.state).closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_inject_and_read() {
        let (mut host, device) = MemoryTransport::pair();
        assert!(!host.is_ready().unwrap());
        device.send_line(b"^1");
        let mut got = Vec::new();
        while host.is_ready().unwrap() {
            got.push(host.read_byte().unwrap());
        }
        assert_eq!(got, b"(^1)");
    }

    #[test]
    fn test_written_commands() {
        let (mut host, device) = MemoryTransport::pair();
        host.write(b"v\nL\n").unwrap();
        assert_eq!(device.take_commands(), vec![b"v".to_vec(), b"L".to_vec()]);
        assert!(device.take_written().is_empty());
    }

    #[test]
    fn test_close_rejects_io() {
        let (mut host, device) = MemoryTransport::pair();
        host.close();
        assert!(!device.is_open());
        assert!(host.write(b"s\n").is_err());
        device.inject(b"(x)");
        assert!(!host.is_ready().unwrap());
    }

    #[test]
    fn test_waker_called_on_inject() {
        let (mut host, device) = MemoryTransport::pair();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        host.attach_waker(Arc::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        device.inject(b"(");
        device.fail_reads(io::ErrorKind::BrokenPipe);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(host.is_ready().is_err());
    }
}
