//! Decoded protocol messages.

use serde::{Deserialize, Serialize};

use crate::core::BoxAddress;
use crate::core::constants::{
    ADDRESS_LEN, PREFIX_BUTTON_SELECT, PREFIX_BUTTON_STATUS, PREFIX_INFO, PREFIX_LINK_STATUS,
    PREFIX_MODE, PREFIX_VERSION, RAW_BUTTON_A, RAW_BUTTON_B, RAW_BUTTON_C, VERSION_INFO_SEPARATOR,
};

use super::request::Request;

/// Logical button on a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Button {
    /// No button pressed.
    #[default]
    None,
    /// Button A.
    A,
    /// Button B.
    B,
    /// Button C.
    C,
}

impl Button {
    /// Map a raw hardware code: 30 → A, 29 → B, 28 → C, otherwise none.
    pub fn from_raw_code(code: u8) -> Self {
        match code {
            RAW_BUTTON_A => Button::A,
            RAW_BUTTON_B => Button::B,
            RAW_BUTTON_C => Button::C,
            _ => Button::None,
        }
    }

    /// Logical bit value (A=1, B=2, C=4, none=0).
    pub fn code(self) -> u8 {
        match self {
            Button::None => 0,
            Button::A => 1,
            Button::B => 2,
            Button::C => 4,
        }
    }

    /// Display label, empty for none.
    pub fn label(self) -> &'static str {
        match self {
            Button::None => "",
            Button::A => "A",
            Button::B => "B",
            Button::C => "C",
        }
    }

    /// True for A, B or C.
    pub fn is_pressed(self) -> bool {
        self != Button::None
    }
}

/// Payload of `#` and `+` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonEvent {
    /// Reporting box.
    pub address: BoxAddress,
    /// Raw two-digit hardware code.
    pub raw_button: u8,
    /// Mapped logical button.
    pub button: Button,
    /// Link quality byte, when present.
    pub link_quality: Option<u8>,
}

/// Message type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Unrecognised or truncated line.
    None,
    /// Outbound request.
    Request,
    /// `^` version reply.
    Version,
    /// `#` button select.
    ButtonSelect,
    /// `@` link status.
    LinkStatus,
    /// `+` button status update.
    ButtonStatus,
    /// `!` mode report.
    Mode,
    /// `%` info report.
    Info,
}

/// A decoded protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Unrecognised, empty or truncated line.
    None,
    /// Outbound request.
    Request(Request),
    /// Firmware version reply.
    Version {
        /// Version text.
        version: String,
        /// Free-form info after the separator.
        info: String,
    },
    /// A box reported a button press.
    ButtonSelect(ButtonEvent),
    /// A box re-reported its current button.
    ButtonStatus(ButtonEvent),
    /// Link telemetry for a box.
    LinkStatus {
        /// Reporting box.
        address: BoxAddress,
        /// Base station the box is paired with.
        base_address: BoxAddress,
        /// First link quality sample.
        link_quality: Option<u8>,
        /// Second link quality sample.
        second_link_quality: Option<u8>,
    },
    /// Base station mode report.
    Mode {
        /// Mode character.
        mode: char,
        /// Link quality byte, when present.
        link_quality: Option<u8>,
    },
    /// Informational report.
    Info {
        /// Info type character.
        info_type: char,
        /// Payload after the separator.
        payload: String,
    },
}

impl Message {
    /// Decode one framed line. Never fails: anything unusable is [`Message::None`].
    pub fn decode(line: &[u8]) -> Self {
        let Some((&prefix, _)) = line.split_first() else {
            return Message::None;
        };
        match prefix {
            PREFIX_VERSION => decode_version(line),
            PREFIX_BUTTON_SELECT => decode_button(line)
                .map(Message::ButtonSelect)
                .unwrap_or(Message::None),
            PREFIX_BUTTON_STATUS => decode_button(line)
                .map(Message::ButtonStatus)
                .unwrap_or(Message::None),
            PREFIX_LINK_STATUS => decode_link_status(line),
            PREFIX_MODE => match line.get(1) {
                Some(&mode) => Message::Mode {
                    mode: char::from(mode),
                    link_quality: line.get(2).copied(),
                },
                None => Message::None,
            },
            PREFIX_INFO => match line.get(1) {
                Some(&info_type) => Message::Info {
                    info_type: char::from(info_type),
                    payload: line
                        .get(3..)
                        .map(|p| String::from_utf8_lossy(p).into_owned())
                        .unwrap_or_default(),
                },
                None => Message::None,
            },
            _ => Message::None,
        }
    }

    /// Type discriminant.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::None => MessageKind::None,
            Message::Request(_) => MessageKind::Request,
            Message::Version { .. } => MessageKind::Version,
            Message::ButtonSelect(_) => MessageKind::ButtonSelect,
            Message::ButtonStatus(_) => MessageKind::ButtonStatus,
            Message::LinkStatus { .. } => MessageKind::LinkStatus,
            Message::Mode { .. } => MessageKind::Mode,
            Message::Info { .. } => MessageKind::Info,
        }
    }

    /// Button event of a `#` or `+` line.
    pub fn button_event(&self) -> Option<&ButtonEvent> {
        match self {
            Message::ButtonSelect(ev) | Message::ButtonStatus(ev) => Some(ev),
            _ => None,
        }
    }

    /// True for `#` and `+` lines.
    pub fn is_button(&self) -> bool {
        self.button_event().is_some()
    }

    /// Reporting box, for message types that carry one.
    pub fn address(&self) -> Option<&BoxAddress> {
        match self {
            Message::ButtonSelect(ev) | Message::ButtonStatus(ev) => Some(&ev.address),
            Message::LinkStatus { address, .. } => Some(address),
            _ => None,
        }
    }
}

impl From<Request> for Message {
    fn from(request: Request) -> Self {
        Message::Request(request)
    }
}

fn decode_version(line: &[u8]) -> Message {
    if line.len() < 3 {
        return Message::None;
    }
    let body = String::from_utf8_lossy(&line[1..]);
    let mut fields = body.split(VERSION_INFO_SEPARATOR);
    Message::Version {
        version: fields.next().unwrap_or_default().to_string(),
        info: fields.next().unwrap_or_default().to_string(),
    }
}

fn decode_button(line: &[u8]) -> Option<ButtonEvent> {
    let address = line.get(1..1 + ADDRESS_LEN)?;
    let digits = line.get(1 + ADDRESS_LEN..3 + ADDRESS_LEN)?;
    let raw_button = parse_two_digits(digits)?;
    Some(ButtonEvent {
        address: BoxAddress::from_binary(address),
        raw_button,
        button: Button::from_raw_code(raw_button),
        link_quality: line.get(3 + ADDRESS_LEN).copied(),
    })
}

fn decode_link_status(line: &[u8]) -> Message {
    let (Some(address), Some(base)) = (
        line.get(1..1 + ADDRESS_LEN),
        line.get(1 + ADDRESS_LEN..1 + 2 * ADDRESS_LEN),
    ) else {
        return Message::None;
    };
    Message::LinkStatus {
        address: BoxAddress::from_binary(address),
        base_address: BoxAddress::from_binary(base),
        link_quality: line.get(1 + 2 * ADDRESS_LEN).copied(),
        second_link_quality: line.get(2 + 2 * ADDRESS_LEN).copied(),
    }
}

fn parse_two_digits(digits: &[u8]) -> Option<u8> {
    digits.iter().try_fold(0u8, |acc, &d| {
        d.is_ascii_digit().then(|| acc * 10 + (d - b'0'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button_line(prefix: u8, code: &[u8; 2], lq: Option<u8>) -> Vec<u8> {
        let mut line = vec![prefix, 0x0A, 0x0B, 0x0C];
        line.extend_from_slice(code);
        line.extend(lq);
        line
    }

    #[test]
    fn test_button_table() {
        let cases: [(&[u8; 2], Button); 5] = [
            (b"30", Button::A),
            (b"29", Button::B),
            (b"28", Button::C),
            (b"05", Button::None),
            (b"00", Button::None),
        ];
        for (code, expected) in cases {
            let msg = Message::decode(&button_line(b'#', code, None));
            let ev = msg.button_event().expect("button event");
            assert_eq!(ev.button, expected, "code {:?}", code);
        }
    }

    #[test]
    fn test_button_select_fields() {
        let msg = Message::decode(&button_line(b'#', b"29", Some(180)));
        assert_eq!(msg.kind(), MessageKind::ButtonSelect);
        let ev = msg.button_event().unwrap();
        assert_eq!(ev.address, BoxAddress::from_binary(&[0x0A, 0x0B, 0x0C]));
        assert_eq!(ev.raw_button, 29);
        assert_eq!(ev.link_quality, Some(180));

        let update = Message::decode(&button_line(b'+', b"30", None));
        assert_eq!(update.kind(), MessageKind::ButtonStatus);
        assert_eq!(update.button_event().unwrap().link_quality, None);
    }

    #[test]
    fn test_truncated_lines_decode_to_none() {
        assert_eq!(Message::decode(b""), Message::None);
        assert_eq!(Message::decode(b"#"), Message::None);
        assert_eq!(Message::decode(b"#ab"), Message::None);
        assert_eq!(Message::decode(b"#abc3"), Message::None);
        assert_eq!(Message::decode(b"+abc"), Message::None);
        assert_eq!(Message::decode(b"@abcde"), Message::None);
        assert_eq!(Message::decode(b"!"), Message::None);
        assert_eq!(Message::decode(b"%"), Message::None);
        assert_eq!(Message::decode(b"^1"), Message::None);
        assert_eq!(Message::decode(b"zzz"), Message::None);
    }

    #[test]
    fn test_non_digit_button_is_none() {
        assert_eq!(Message::decode(b"#abcX0"), Message::None);
    }

    #[test]
    fn test_version() {
        assert_eq!(
            Message::decode(b"^2.1:base 7"),
            Message::Version {
                version: "2.1".into(),
                info: "base 7".into()
            }
        );
        assert_eq!(
            Message::decode(b"^2.1"),
            Message::Version {
                version: "2.1".into(),
                info: String::new()
            }
        );
    }

    #[test]
    fn test_link_status_lengths() {
        let base = b"@abcxyz";
        match Message::decode(base) {
            Message::LinkStatus {
                link_quality,
                second_link_quality,
                ..
            } => {
                assert_eq!(link_quality, None);
                assert_eq!(second_link_quality, None);
            }
            other => panic!("unexpected {:?}", other),
        }

        // one sample only: no out-of-range read
        match Message::decode(b"@abcxyz\x90") {
            Message::LinkStatus {
                base_address,
                link_quality,
                second_link_quality,
                ..
            } => {
                assert_eq!(base_address.bytes(), Some(b"xyz"));
                assert_eq!(link_quality, Some(0x90));
                assert_eq!(second_link_quality, None);
            }
            other => panic!("unexpected {:?}", other),
        }

        match Message::decode(b"@abcxyz\x90\xA0") {
            Message::LinkStatus {
                second_link_quality,
                ..
            } => assert_eq!(second_link_quality, Some(0xA0)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_mode_and_info() {
        assert_eq!(
            Message::decode(b"!D\x7f"),
            Message::Mode {
                mode: 'D',
                link_quality: Some(0x7f)
            }
        );
        assert_eq!(
            Message::decode(b"%E:radio reset"),
            Message::Info {
                info_type: 'E',
                payload: "radio reset".into()
            }
        );
        assert_eq!(
            Message::decode(b"%E"),
            Message::Info {
                info_type: 'E',
                payload: String::new()
            }
        );
    }
}
