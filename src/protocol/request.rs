//! Outbound command requests.
//!
//! A request is a literal command written to the base station followed by a
//! newline. Matching a request to its reply is left to the caller.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::BoxAddress;
use crate::core::constants::REQUEST_TERMINATOR;

use super::escape::escape_line;

/// Base station firmware generation.
///
/// Query commands changed case between generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Firmware {
    /// Uppercase `S`, `V` and `Q` queries.
    Legacy,
    /// Lowercase `s`, `v` and `q` queries.
    #[default]
    Current,
}

impl Firmware {
    fn query(self, lower: u8) -> u8 {
        match self {
            Firmware::Legacy => lower.to_ascii_uppercase(),
            Firmware::Current => lower,
        }
    }
}

/// A literal command for the base station.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
    command: Vec<u8>,
}

impl Request {
    /// Wrap an arbitrary command.
    pub fn raw(command: impl Into<Vec<u8>>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Ask every box for its status.
    pub fn status(firmware: Firmware) -> Self {
        Self::raw([firmware.query(b's')])
    }

    /// Ask the base station for its version.
    pub fn version(firmware: Firmware) -> Self {
        Self::raw([firmware.query(b'v')])
    }

    /// Ask every box for link quality.
    pub fn link_quality(firmware: Firmware) -> Self {
        Self::raw([firmware.query(b'q')])
    }

    /// Ask one box for link quality.
    pub fn link_quality_for(firmware: Firmware, address: &BoxAddress) -> Self {
        let mut command = vec![firmware.query(b'q')];
        if let Some(bytes) = address.bytes() {
            command.extend_from_slice(bytes);
        }
        Self::raw(command)
    }

    /// Stop accepting buttons.
    pub fn lock() -> Self {
        Self::raw("L")
    }

    /// Stop accepting buttons and clear box lights.
    pub fn lock_clear() -> Self {
        Self::raw("l")
    }

    /// Accept buttons.
    pub fn ready() -> Self {
        Self::raw("R")
    }

    /// Accept buttons after clearing box lights.
    pub fn ready_clear() -> Self {
        Self::raw("r")
    }

    /// Enter test mode.
    pub fn test() -> Self {
        Self::raw("T")
    }

    /// Leave test mode.
    pub fn test_clear() -> Self {
        Self::raw("t")
    }

    /// Enter demo mode.
    pub fn demo() -> Self {
        Self::raw("D")
    }

    /// Leave demo mode.
    pub fn demo_clear() -> Self {
        Self::raw("d")
    }

    /// Power the boxes down.
    pub fn power_down() -> Self {
        Self::raw("P")
    }

    /// Clear every box.
    pub fn clear() -> Self {
        Self::raw("C")
    }

    /// Set the display lights: `U` followed by `T`/`F` for A, B, C and power.
    pub fn display(a: bool, b: bool, c: bool, power: bool) -> Self {
        let flag = |on: bool| if on { b'T' } else { b'F' };
        Self::raw([b'U', flag(a), flag(b), flag(c), flag(power)])
    }

    /// Command bytes without the terminator.
    pub fn command(&self) -> &[u8] {
        &self.command
    }

    /// Command bytes as written to the wire.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut wire = Vec::with_capacity(self.command.len() + 1);
        wire.extend_from_slice(&self.command);
        wire.push(REQUEST_TERMINATOR);
        wire
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&escape_line(&self.command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_case_follows_firmware() {
        assert_eq!(Request::status(Firmware::Current).command(), b"s");
        assert_eq!(Request::status(Firmware::Legacy).command(), b"S");
        assert_eq!(Request::version(Firmware::Legacy).command(), b"V");
        assert_eq!(Request::link_quality(Firmware::Current).command(), b"q");
    }

    #[test]
    fn test_link_quality_for_box() {
        let addr = BoxAddress::parse("0x0A0B0C");
        let req = Request::link_quality_for(Firmware::Legacy, &addr);
        assert_eq!(req.command(), &[b'Q', 0x0A, 0x0B, 0x0C]);
        assert_eq!(req.to_string(), "Q<0A><0B><0C>");
    }

    #[test]
    fn test_display_flags() {
        assert_eq!(Request::display(true, false, true, false).command(), b"UTFTF");
    }

    #[test]
    fn test_wire_form_has_newline() {
        assert_eq!(Request::lock_clear().to_wire(), b"l\n");
        assert_eq!(Request::ready().to_wire(), b"R\n");
    }
}
