//! Printable rendering of raw protocol lines.

use std::fmt::Write;

/// Render a line for logs, replacing bytes outside `0x20..=0x7E` with `<HH>`.
pub fn escape_line(line: &[u8]) -> String {
    let mut out = String::with_capacity(line.len());
    for &b in line {
        if (0x20..=0x7E).contains(&b) {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "<{:02X}>", b);
        }
    }
    out
}
