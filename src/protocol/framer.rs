//! Line framing.
//!
//! A protocol line is every byte between `(` and `)`. Bytes outside a frame
//! are noise from the radio and are discarded.

use crate::core::constants::{FRAME_END, FRAME_START, MAX_FRAME_LEN};

/// Byte-at-a-time frame extractor.
#[derive(Debug, Clone)]
pub struct Framer {
    buf: Vec<u8>,
    in_frame: bool,
    max_len: usize,
    discarded: u64,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer {
    /// Create a framer with the default line limit.
    pub fn new() -> Self {
        Self::with_max_len(MAX_FRAME_LEN)
    }

    /// Create a framer that abandons lines longer than `max_len`.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(32),
            in_frame: false,
            max_len,
            discarded: 0,
        }
    }

    /// Feed one byte. Returns a line when `byte` closes a frame.
    pub fn push(&mut self, byte: u8) -> Option<Vec<u8>> {
        if !self.in_frame {
            if byte == FRAME_START {
                self.in_frame = true;
                self.buf.clear();
            } else {
                self.discarded += 1;
            }
            return None;
        }

        if byte == FRAME_END {
            self.in_frame = false;
            return Some(std::mem::take(&mut self.buf));
        }

        if self.buf.len() >= self.max_len {
            tracing::warn!(max_len = self.max_len, "frame too long, resynchronising");
            self.discarded += self.buf.len() as u64;
            self.buf.clear();
            // the overflowing byte may itself open the next frame
            self.in_frame = byte == FRAME_START;
            if !self.in_frame {
                self.discarded += 1;
            }
            return None;
        }

        self.buf.push(byte);
        None
    }

    /// Feed a slice and collect every completed line.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }

    /// True between a start delimiter and its end delimiter.
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Bytes dropped outside frames or from overlong frames.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Forget any partial line.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.in_frame = false;
    }
}
