//! Error types for quizbox.

use thiserror::Error;

/// Errors that can occur when parsing a box address.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Hex part is not valid hexadecimal.
    #[error("invalid hex in address {input:?}")]
    InvalidHex {
        /// The offending hex text.
        input: String,
    },

    /// Hex part is shorter than a full address.
    #[error("address {input:?} too short: expected 6 hex digits")]
    TooShort {
        /// The offending hex text.
        input: String,
    },
}

/// Errors in the link layer.
#[derive(Debug, Error)]
pub enum LinkError {
    /// A session is already open.
    #[error("already connected")]
    AlreadyConnected,

    /// No session is open.
    #[error("not connected")]
    NotConnected,

    /// Strict wait ran past its deadline.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The reader task stopped unexpectedly.
    #[error("link reader stopped")]
    ReaderStopped,

    /// Configuration rejected by validation.
    #[error("invalid link configuration: {0}")]
    InvalidConfig(String),

    /// Underlying transport fault.
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkError {
    /// Returns true if the session cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LinkError::Io(_) | LinkError::ReaderStopped)
    }

    /// Returns true if the caller violated an API precondition.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            LinkError::AlreadyConnected | LinkError::NotConnected | LinkError::InvalidConfig(_)
        )
    }

    /// Returns true for deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LinkError::Timeout(_))
    }
}

/// Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Errors raised by the address registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Address has no registered team.
    #[error("unknown box address {0}")]
    UnknownAddress(String),

    /// Address did not parse to a valid binary value.
    #[error("invalid box address {0:?}")]
    InvalidAddress(String),
}

/// Errors raised by the scoring engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// No point value configured under this preset index.
    #[error("no point preset at index {0}")]
    UnknownPreset(usize),

    /// Configuration rejected by validation.
    #[error("invalid scoring configuration: {0}")]
    InvalidConfig(String),

    /// Registry lookup failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Top-level quizbox errors.
#[derive(Debug, Error)]
pub enum QuizError {
    /// Address error.
    #[error("address error: {0}")]
    Address(#[from] AddressError),

    /// Link error.
    #[error("link error: {0}")]
    Link(#[from] LinkError),

    /// Registry error.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Scoring error.
    #[error("scoring error: {0}")]
    Score(#[from] ScoreError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
