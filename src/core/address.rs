//! Box hardware addresses.
//!
//! A box is identified by a 3-byte binary address. Roster entries and logs
//! carry a textual form with an optional cosmetic name:
//!
//! | Text | Name | Address |
//! |------|------|---------|
//! | `red_0x0A0B0C` | `red` | `0A0B0C` |
//! | `red_` | `red` | invalid |
//! | `_0x0A0B0C` | empty | `0A0B0C` |
//! | `0A0B0C` | empty | `0A0B0C` |

use std::fmt;
use std::hash::{Hash, Hasher};

use super::constants::ADDRESS_LEN;
use super::error::AddressError;

/// A box address: binary value plus cosmetic name.
///
/// Equality and hashing look only at the binary value.
#[derive(Debug, Clone, Default)]
pub struct BoxAddress {
    name: String,
    bytes: Option<[u8; ADDRESS_LEN]>,
}

impl BoxAddress {
    /// The invalid address.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Build an address from raw wire bytes.
    ///
    /// Anything other than exactly three bytes gives the invalid address.
    pub fn from_binary(raw: &[u8]) -> Self {
        Self {
            name: String::new(),
            bytes: raw.try_into().ok(),
        }
    }

    /// Parse the textual form, degrading to an invalid address on bad hex.
    ///
    /// A bad hex part is logged and the name, if any, is kept.
    pub fn parse(text: &str) -> Self {
        let (name, hex_part) = split_name(text.trim());
        let bytes = match hex_part.map(parse_hex) {
            Some(Ok(bytes)) => Some(bytes),
            Some(Err(err)) => {
                tracing::warn!(input = text, error = %err, "bad box address");
                None
            }
            None => None,
        };
        Self {
            name: name.to_string(),
            bytes,
        }
    }

    /// Parse the textual form, failing on a bad hex part.
    pub fn try_parse(text: &str) -> Result<Self, AddressError> {
        let (name, hex_part) = split_name(text.trim());
        let bytes = hex_part.map(parse_hex).transpose()?;
        Ok(Self {
            name: name.to_string(),
            bytes,
        })
    }

    /// Attach a cosmetic name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Cosmetic name, possibly empty.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binary value, if valid.
    pub fn bytes(&self) -> Option<&[u8; ADDRESS_LEN]> {
        self.bytes.as_ref()
    }

    /// True iff the binary value is exactly three bytes.
    pub fn is_valid(&self) -> bool {
        self.bytes.is_some()
    }

    /// Six uppercase hex digits, or `000000` when invalid.
    pub fn to_short_string(&self) -> String {
        match &self.bytes {
            Some(bytes) => hex::encode_upper(bytes),
            None => "000000".to_string(),
        }
    }

    /// `<HHHHHH>`, or empty when invalid.
    pub fn address_string(&self) -> String {
        if self.is_valid() {
            format!("<{}>", self.to_short_string())
        } else {
            String::new()
        }
    }
}

fn split_name(text: &str) -> (&str, Option<&str>) {
    if text.is_empty() {
        return ("", None);
    }
    if let Some(name) = text.strip_suffix('_') {
        return (name, None);
    }
    if let Some(hex) = text.strip_prefix('_') {
        return ("", Some(hex));
    }
    let mut parts = text.split('_');
    match (parts.next(), parts.next()) {
        (Some(name), Some(hex)) => (name, Some(hex)),
        (Some(hex), None) => ("", Some(hex)),
        _ => ("", None),
    }
}

fn parse_hex(text: &str) -> Result<[u8; ADDRESS_LEN], AddressError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    let Some(head) = digits.get(..ADDRESS_LEN * 2) else {
        return Err(AddressError::TooShort {
            input: digits.to_string(),
        });
    };
    let mut bytes = [0u8; ADDRESS_LEN];
    hex::decode_to_slice(head, &mut bytes).map_err(|_| AddressError::InvalidHex {
        input: digits.to_string(),
    })?;
    Ok(bytes)
}

impl PartialEq for BoxAddress {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for BoxAddress {}

impl Hash for BoxAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for BoxAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.address_string())
    }
}

impl std::str::FromStr for BoxAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s)
    }
}
