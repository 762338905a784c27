//! Buzzer wire protocol.
//!
//! - **Framing**: [`Framer`] pulls `(`…`)` lines out of a noisy byte stream
//! - **Decoding**: [`Message::decode`] classifies a line by its first byte
//! - **Requests**: [`Request`] factories for outbound commands
//!
//! ```text
//!   inbound   (^2.1:base)  (#AAA30L)  (+AAA29)  (@AAABBBLL)  (!ML)  (%T:text)
//!   outbound  s v q L l R r T t D d P C UTFTF   + "\n"
//! ```

mod escape;
mod framer;
mod message;
mod request;

pub use escape::escape_line;
pub use framer::Framer;
pub use message::{Button, ButtonEvent, Message, MessageKind};
pub use request::{Firmware, Request};
