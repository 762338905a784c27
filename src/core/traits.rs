//! Core traits for quizbox.
//!
//! These traits define the seams between the link layer and whatever
//! actually moves bytes or supplies teams.

use std::io;
use std::sync::Arc;

/// Callback a transport invokes when new bytes become readable.
pub type DataWaker = Arc<dyn Fn() + Send + Sync>;

/// An open duplex byte channel to the base station.
///
/// The link reader only calls [`read_byte`](Transport::read_byte) after
/// [`is_ready`](Transport::is_ready) returned `true`, so implementations may
/// treat a read on an empty channel as an error.
///
/// # Example
///
/// ```ignore
/// struct Loopback(std::collections::VecDeque<u8>);
///
/// impl Transport for Loopback {
///     fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
///         self.0.extend(bytes);
///         Ok(())
///     }
///     fn is_ready(&mut self) -> io::Result<bool> {
///         Ok(!self.0.is_empty())
///     }
///     fn read_byte(&mut self) -> io::Result<u8> {
///         self.0.pop_front().ok_or_else(|| io::ErrorKind::WouldBlock.into())
///     }
///     fn close(&mut self) {}
/// }
/// ```
pub trait Transport: Send + 'static {
    /// Write all bytes.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Whether at least one byte can be read without blocking.
    fn is_ready(&mut self) -> io::Result<bool>;

    /// Read one byte.
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Release the channel. Later reads and writes fail.
    fn close(&mut self);

    /// Whether the channel is still open.
    fn is_open(&self) -> bool {
        true
    }

    /// Register a callback for data arrival.
    ///
    /// Transports that cannot signal arrival ignore this and are polled.
    fn attach_waker(&mut self, waker: DataWaker) {
        let _ = waker;
    }

    /// Human-readable name for logs.
    fn describe(&self) -> String {
        "transport".to_string()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }

    fn is_ready(&mut self) -> io::Result<bool> {
        (**self).is_ready()
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        (**self).read_byte()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn attach_waker(&mut self, waker: DataWaker) {
        (**self).attach_waker(waker)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
