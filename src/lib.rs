//! # Quizbox
//!
//! Host-side link layer and scoring engine for wireless quiz buzzers.
//!
//! A base station on a serial port relays button presses from team boxes as
//! parenthesis-framed lines. This crate frames and decodes those lines on a
//! background reader, keeps a registry of boxes and teams, and scores
//! multiple-choice and speed rounds.
//!
//! ## Feature Flags
//!
//! - `link` (default): Connection session, reader task, line queue, listeners
//! - `scoring` (default): Scoring engine, standings and round records
//! - `control` (default): Control actor tying link and scoring together
//! - `serial`: `serialport`-backed transport
//! - `cli`: `quizbox-monitor` binary
//!
//! ## Modules
//!
//! - [`core`]: Constants, errors, addresses and the transport trait (always included)
//! - [`protocol`]: Framing, message decoding and request encoding (always included)
//! - [`registry`]: Box states, teams and rosters (always included)
//! - [`scoring`]: Round scoring (requires `scoring` feature)
//! - [`link`]: Base station link (requires `link` feature)
//! - [`control`]: Control actor (requires `control` feature)
//!
//! ## Example Usage
//!
//! ```rust
//! use quizbox::prelude::*;
//!
//! let mut registry = AddressRegistry::new();
//! let roster = vec![
//!     RosterEntry::new("red_0A0B01", 1, "Red"),
//!     RosterEntry::new("blue_0A0B02", 2, "Blue"),
//! ];
//! registry.load_roster(&roster).unwrap();
//!
//! let mut engine = ScoreEngine::new(ScoringConfig::default());
//! engine.set_question_type_with_points(QuestionType::MultipleChoice, 10, 0);
//! engine.set_answer(Button::B);
//!
//! let red = BoxAddress::parse("0A0B01");
//! registry.box_state_mut(&red).unwrap().set_button(Button::B);
//! engine.update_scores_only_if_mult_choice(&mut registry);
//!
//! let results = engine.record_results(&mut registry);
//! assert_eq!(results.teams[0].total, 10.0);
//! assert_eq!(results.teams[0].standing, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Wire protocol (always included)
pub mod protocol;

// Box and team registry (always included)
pub mod registry;

// Scoring engine (feature-gated)
#[cfg(feature = "scoring")]
#[cfg_attr(docsrs, doc(cfg(feature = "scoring")))]
pub mod scoring;

// Link layer (feature-gated)
#[cfg(feature = "link")]
#[cfg_attr(docsrs, doc(cfg(feature = "link")))]
pub mod link;

// Control actor (feature-gated)
#[cfg(feature = "control")]
#[cfg_attr(docsrs, doc(cfg(feature = "control")))]
pub mod control;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::*;

    pub use crate::protocol::{Button, ButtonEvent, Firmware, Message, MessageKind, Request};

    pub use crate::registry::{
        AddressRegistry, BoxState, ConnectionStatus, RosterEntry, RosterProvider, Team,
    };

    #[cfg(feature = "scoring")]
    pub use crate::scoring::{
        QuestionType, RoundResults, ScoreEngine, ScoringConfig, SpeedResult, TeamResult,
    };

    #[cfg(feature = "link")]
    pub use crate::link::{
        ChannelListener, ConnectionSession, LineListener, MemoryTransport, RequestSender,
        SessionConfig,
    };

    #[cfg(feature = "control")]
    pub use crate::control::{ControllerConfig, QuizController};
}

// Re-export commonly used items at crate root
pub use crate::core::{BoxAddress, LinkError, QuizError, RegistryError, ScoreError, Transport};
pub use crate::protocol::{Message, Request};

#[cfg(feature = "link")]
pub use crate::link::{ConnectionSession, SessionConfig};

#[cfg(feature = "scoring")]
pub use crate::scoring::{RoundResults, ScoreEngine};
