//! Link layer to the base station.
//!
//! A [`ConnectionSession`] owns one [`Transport`](crate::core::Transport)
//! and a background reader. Inbound bytes are framed into lines, buffered on
//! a bounded drop-oldest queue for [`ConnectionSession::next_message`], and
//! fanned out to every registered [`LineListener`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use quizbox::link::{ChannelListener, ConnectionSession, MemoryTransport, SessionConfig};
//! use quizbox::protocol::Request;
//!
//! # async fn demo() -> Result<(), quizbox::LinkError> {
//! let (transport, device) = MemoryTransport::pair();
//! let mut session = ConnectionSession::new(SessionConfig::default());
//! let (listener, mut events) = ChannelListener::new();
//! session.add_listener(Arc::new(listener));
//! session.open(transport).await?;
//!
//! session.send(&Request::ready())?;
//! device.send_line(b"#\x01\x02\x0330");
//! let _event = events.recv().await;
//! session.close().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod listener;
mod memory;
mod queue;
mod reader;
mod session;

#[cfg(feature = "serial")]
#[cfg_attr(docsrs, doc(cfg(feature = "serial")))]
mod serial;

pub use config::{SessionConfig, SessionConfigBuilder};
pub use listener::{ChannelListener, LineListener, ListenerId, ListenerSet};
pub use memory::{DeviceEndpoint, MemoryTransport};
pub use queue::LineQueue;
pub use session::{ConnectionSession, DeviceVersion, RequestSender, SessionState};

#[cfg(feature = "serial")]
#[cfg_attr(docsrs, doc(cfg(feature = "serial")))]
pub use serial::{SerialTransport, available_ports};
