//! Protocol and scoring constants.
//!
//! The wire values below are fixed by the box firmware and MUST NOT be changed.

use std::time::Duration;

// =============================================================================
// FRAMING
// =============================================================================

/// Byte that opens a protocol line.
pub const FRAME_START: u8 = b'(';

/// Byte that closes a protocol line.
pub const FRAME_END: u8 = b')';

/// Terminator appended to every outbound request.
pub const REQUEST_TERMINATOR: u8 = b'\n';

/// Longest line body accepted before the framer resynchronises.
pub const MAX_FRAME_LEN: usize = 256;

// =============================================================================
// MESSAGE PREFIXES
// =============================================================================

/// Version reply: `^version[:info]`.
pub const PREFIX_VERSION: u8 = b'^';

/// Button select: `#AAABB[L]`.
pub const PREFIX_BUTTON_SELECT: u8 = b'#';

/// Button status update: `+AAABB[L]`.
pub const PREFIX_BUTTON_STATUS: u8 = b'+';

/// Link status: `@AAABBB[L1][L2]`.
pub const PREFIX_LINK_STATUS: u8 = b'@';

/// Mode report: `!M[L]`.
pub const PREFIX_MODE: u8 = b'!';

/// Info report: `%T:payload`.
pub const PREFIX_INFO: u8 = b'%';

/// Separator between version and info in a version reply.
pub const VERSION_INFO_SEPARATOR: char = ':';

// =============================================================================
// BUTTON CODES
// =============================================================================

/// Raw hardware code for button A.
pub const RAW_BUTTON_A: u8 = 30;

/// Raw hardware code for button B.
pub const RAW_BUTTON_B: u8 = 29;

/// Raw hardware code for button C.
pub const RAW_BUTTON_C: u8 = 28;

/// Length of a binary box address in bytes.
pub const ADDRESS_LEN: usize = 3;

// =============================================================================
// LINK LAYER DEFAULTS
// =============================================================================

/// Default capacity of the inbound line queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default deadline for the version handshake after open.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Poll interval while waiting for the rest of a frame.
pub const DEFAULT_FRAME_POLL: Duration = Duration::from_millis(2);

/// Poll interval while the transport has nothing to read.
pub const DEFAULT_IDLE_POLL: Duration = Duration::from_millis(20);

/// Most bytes read in one go before the reader yields.
pub const READ_BURST: usize = 64;

// =============================================================================
// REGISTRY & SCORING DEFAULTS
// =============================================================================

/// A box that has not reported for this long is shown as disconnected.
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_millis(5000);

/// Correct speed answers needed to quiz out.
pub const DEFAULT_QUIZ_OUT_COUNT: u32 = 3;

/// Weight kept from the old link quality for a single sample.
pub const LQ_KEEP_SINGLE: f64 = 0.9;

/// Weight kept from the old link quality for a paired sample.
pub const LQ_KEEP_PAIR: f64 = 0.8;

/// Link quality at or above which a box is shown as mid signal.
pub const LQ_MID_THRESHOLD: u32 = 150;

/// Link quality at or above which a box is shown as high signal.
pub const LQ_HIGH_THRESHOLD: u32 = 200;
