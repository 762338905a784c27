//! Control actor.
//!
//! [`QuizController`] ties the link and the scoring engine together. It owns
//! the registry and the engine, consumes decoded messages from a
//! [`ChannelListener`](crate::link::ChannelListener) queue, and issues lock
//! and clear commands through a [`RequestSender`](crate::link::RequestSender).

mod config;
mod controller;

pub use config::{ControllerConfig, ControllerConfigBuilder};
pub use controller::QuizController;
