//! HDMI-CEC frame decoding.
//!
//! The bus transport hands us traffic lines such as `>> 10:44:44`: a receive
//! marker followed by colon-separated hex bytes.  Field 0 is the header
//! (initiator / destination nibbles), field 1 the opcode, field 2 the first
//! operand.  Decoding is pure; what to do with an event is decided elsewhere.
//!
//! The bus is noisy and half-duplex, so anything that does not look like a
//! received frame is ignored rather than reported as an error.

use std::fmt;

use crate::config::RemoteConfig;

/// Prefix the transport puts in front of frames it received.
pub const RECEIVE_MARKER: &str = ">> ";

// ── opcodes ───────────────────────────────────────────────────────────────────

pub const OP_USER_CONTROL_PRESSED: u8 = 0x44;
pub const OP_USER_CONTROL_RELEASED: u8 = 0x45;
pub const OP_GIVE_OSD_NAME: u8 = 0x46;
pub const OP_SET_OSD_NAME: u8 = 0x47;
pub const OP_ACTIVE_SOURCE: u8 = 0x82;
pub const OP_GIVE_PHYSICAL_ADDRESS: u8 = 0x83;
pub const OP_REPORT_PHYSICAL_ADDRESS: u8 = 0x84;
pub const OP_DEVICE_VENDOR_ID: u8 = 0x87;
pub const OP_VENDOR_REMOTE_BUTTON_UP: u8 = 0x8b;
pub const OP_GIVE_DEVICE_VENDOR_ID: u8 = 0x8c;
pub const OP_CEC_VERSION: u8 = 0x9e;
pub const OP_GET_CEC_VERSION: u8 = 0x9f;

/// Our logical address on the bus: playback device 1.
pub const OWN_ADDRESS: u8 = 0x4;
/// Destination nibble addressing every device.
pub const BROADCAST: u8 = 0xf;
/// CEC 1.3a.
pub const CEC_VERSION: u8 = 0x04;
/// Device type operand for a playback device.
const DEVICE_TYPE_PLAYBACK: u8 = 0x04;

// ── Frame ─────────────────────────────────────────────────────────────────────

/// One CEC message as a list of bytes.  Always has a header and an opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    fields: Vec<u8>,
}

impl Frame {
    /// Build a frame from a header, an opcode and its operands.
    pub fn new(header: u8, opcode: u8, operands: &[u8]) -> Self {
        let mut fields = Vec::with_capacity(operands.len() + 2);
        fields.push(header);
        fields.push(opcode);
        fields.extend_from_slice(operands);
        Self { fields }
    }

    /// Parse a received traffic line.  Returns `None` when the receive marker
    /// is missing, when fewer than two fields follow it, or when a field is
    /// not a two-digit hex byte.
    pub fn parse(line: &str) -> Option<Self> {
        let body = line.strip_prefix(RECEIVE_MARKER)?.trim();
        let fields = parse_hex_fields(body)?;
        if fields.len() < 2 {
            return None;
        }
        Some(Self { fields })
    }

    pub fn initiator(&self) -> u8 {
        self.fields[0] >> 4
    }

    pub fn destination(&self) -> u8 {
        self.fields[0] & 0x0f
    }

    pub fn opcode(&self) -> u8 {
        self.fields[1]
    }

    /// First operand, when present.
    pub fn payload(&self) -> Option<u8> {
        self.fields.get(2).copied()
    }

    /// Colon-separated lowercase hex, e.g. `10:44:44`.
    pub fn to_wire(&self) -> String {
        self.fields
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Parse `aa:bb:cc` into bytes.  Every field must be exactly two hex digits.
pub fn parse_hex_fields(s: &str) -> Option<Vec<u8>> {
    if s.is_empty() {
        return Some(Vec::new());
    }
    s.split(':')
        .map(|field| {
            if field.len() != 2 {
                return None;
            }
            u8::from_str_radix(field, 16).ok()
        })
        .collect()
}

// ── RemoteKey ─────────────────────────────────────────────────────────────────

/// User-control codes carried by a key-pressed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteKey {
    Play,
    Pause,
    Stop,
    FastForward,
    Rewind,
    Forward,
    Back,
    Up,
    Down,
    Left,
    Right,
    /// Any code without a mapping.  Still reported.
    Unhandled(u8),
}

impl RemoteKey {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x44 => Self::Play,
            0x46 => Self::Pause,
            0x45 => Self::Stop,
            0x49 => Self::FastForward,
            0x48 => Self::Rewind,
            0x4b => Self::Forward,
            0x4c => Self::Back,
            0x01 => Self::Up,
            0x02 => Self::Down,
            0x03 => Self::Left,
            0x04 => Self::Right,
            other => Self::Unhandled(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Play => 0x44,
            Self::Pause => 0x46,
            Self::Stop => 0x45,
            Self::FastForward => 0x49,
            Self::Rewind => 0x48,
            Self::Forward => 0x4b,
            Self::Back => 0x4c,
            Self::Up => 0x01,
            Self::Down => 0x02,
            Self::Left => 0x03,
            Self::Right => 0x04,
            Self::Unhandled(code) => code,
        }
    }

    /// Short name for mapped keys, `None` for `Unhandled`.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::Play => Some("play"),
            Self::Pause => Some("pause"),
            Self::Stop => Some("stop"),
            Self::FastForward => Some("fast-forward"),
            Self::Rewind => Some("rewind"),
            Self::Forward => Some("forward"),
            Self::Back => Some("back"),
            Self::Up => Some("up"),
            Self::Down => Some("down"),
            Self::Left => Some("left"),
            Self::Right => Some("right"),
            Self::Unhandled(_) => None,
        }
    }
}

impl fmt::Display for RemoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "key unhandled: {:02x}", self.code()),
        }
    }
}

// ── RemoteEvent ───────────────────────────────────────────────────────────────

/// A decoded, actionable frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    VendorButtonUp(u8),
    KeyPressed(RemoteKey),
    KeyReleased(u8),
    ActiveSource(u8),
    /// Identification queries; each carries the initiator's address.
    OsdNameRequested(u8),
    VendorIdRequested(u8),
    PhysicalAddressRequested(u8),
    VersionRequested(u8),
    /// Well-formed frame we have no reaction for; carries its wire text.
    Unhandled(String),
}

/// Decode one traffic line.  `None` means the line is not a received frame.
pub fn decode(line: &str) -> Option<RemoteEvent> {
    Frame::parse(line).map(|frame| decode_frame(&frame))
}

pub fn decode_frame(frame: &Frame) -> RemoteEvent {
    let payload = frame.payload();
    match (frame.opcode(), payload) {
        (OP_VENDOR_REMOTE_BUTTON_UP, Some(code)) => RemoteEvent::VendorButtonUp(code),
        (OP_USER_CONTROL_PRESSED, Some(code)) => RemoteEvent::KeyPressed(RemoteKey::from_code(code)),
        (OP_USER_CONTROL_RELEASED, Some(code)) => RemoteEvent::KeyReleased(code),
        (OP_ACTIVE_SOURCE, Some(code)) => RemoteEvent::ActiveSource(code),
        (OP_GIVE_OSD_NAME, _) => RemoteEvent::OsdNameRequested(frame.initiator()),
        (OP_GIVE_DEVICE_VENDOR_ID, _) => RemoteEvent::VendorIdRequested(frame.initiator()),
        (OP_GIVE_PHYSICAL_ADDRESS, _) => RemoteEvent::PhysicalAddressRequested(frame.initiator()),
        (OP_GET_CEC_VERSION, _) => RemoteEvent::VersionRequested(frame.initiator()),
        _ => RemoteEvent::Unhandled(frame.to_wire()),
    }
}

// ── query replies ─────────────────────────────────────────────────────────────

/// Canned answers for the identification queries a TV sends on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryReplies {
    pub osd_name: String,
    pub physical_address: [u8; 2],
    pub vendor_id: [u8; 3],
}

impl QueryReplies {
    /// Build from config.  Malformed addresses fall back to `10:00` and the
    /// Pulse-Eight vendor id.
    pub fn from_config(config: &RemoteConfig) -> Self {
        let physical_address = parse_hex_fields(&config.physical_address)
            .and_then(|v| <[u8; 2]>::try_from(v).ok())
            .unwrap_or([0x10, 0x00]);
        let vendor_id = parse_hex_fields(&config.vendor_id)
            .and_then(|v| <[u8; 3]>::try_from(v).ok())
            .unwrap_or([0x00, 0x15, 0x82]);
        Self {
            osd_name: config.osd_name.clone(),
            physical_address,
            vendor_id,
        }
    }

    /// The frame answering `event`, if it is a query.  Name and version go
    /// back to the initiator; vendor id and physical address reports are
    /// broadcast messages on CEC.
    pub fn reply(&self, event: &RemoteEvent) -> Option<Frame> {
        match *event {
            RemoteEvent::OsdNameRequested(from) => {
                // OSD names are limited to 14 ASCII characters.
                let name: Vec<u8> = self
                    .osd_name
                    .bytes()
                    .filter(u8::is_ascii)
                    .take(14)
                    .collect();
                Some(Frame::new(reply_header(from), OP_SET_OSD_NAME, &name))
            }
            RemoteEvent::VendorIdRequested(_) => Some(Frame::new(
                reply_header(BROADCAST),
                OP_DEVICE_VENDOR_ID,
                &self.vendor_id,
            )),
            RemoteEvent::PhysicalAddressRequested(_) => Some(Frame::new(
                reply_header(BROADCAST),
                OP_REPORT_PHYSICAL_ADDRESS,
                &[
                    self.physical_address[0],
                    self.physical_address[1],
                    DEVICE_TYPE_PLAYBACK,
                ],
            )),
            RemoteEvent::VersionRequested(from) => Some(Frame::new(
                reply_header(from),
                OP_CEC_VERSION,
                &[CEC_VERSION],
            )),
            _ => None,
        }
    }
}

fn reply_header(destination: u8) -> u8 {
    (OWN_ADDRESS << 4) | (destination & 0x0f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_lines_are_ignored() {
        for line in [
            "",
            "10:44:44",
            "<< 10:44:44",
            ">>10:44:44",
            ">> ",
            ">> 10",
            ">> 10:",
            ">> zz:44",
            ">> 10:444",
            ">> 1:44",
            "TRAFFIC: [ 123] >> 10:44:44",
        ] {
            assert_eq!(decode(line), None, "line {:?}", line);
        }
    }

    #[test]
    fn test_key_pressed_table() {
        let cases = [
            ("44", RemoteKey::Play),
            ("46", RemoteKey::Pause),
            ("45", RemoteKey::Stop),
            ("49", RemoteKey::FastForward),
            ("48", RemoteKey::Rewind),
            ("4b", RemoteKey::Forward),
            ("4c", RemoteKey::Back),
            ("01", RemoteKey::Up),
            ("02", RemoteKey::Down),
            ("03", RemoteKey::Left),
            ("04", RemoteKey::Right),
        ];
        for (code, key) in cases {
            let line = format!(">> 10:44:{}", code);
            assert_eq!(decode(&line), Some(RemoteEvent::KeyPressed(key)));
            assert_eq!(RemoteKey::from_code(key.code()), key);
        }
    }

    #[test]
    fn test_unknown_key_is_reported() {
        assert_eq!(
            decode(">> 10:44:7f"),
            Some(RemoteEvent::KeyPressed(RemoteKey::Unhandled(0x7f)))
        );
        assert_eq!(RemoteKey::Unhandled(0x7f).to_string(), "key unhandled: 7f");
        assert_eq!(RemoteKey::FastForward.to_string(), "fast-forward");
    }

    #[test]
    fn test_opcode_table() {
        assert_eq!(decode(">> 10:8b:21"), Some(RemoteEvent::VendorButtonUp(0x21)));
        assert_eq!(decode(">> 10:45:44"), Some(RemoteEvent::KeyReleased(0x44)));
        assert_eq!(decode(">> 0f:82:10:00"), Some(RemoteEvent::ActiveSource(0x10)));
        assert_eq!(decode(">> 04:46"), Some(RemoteEvent::OsdNameRequested(0)));
        assert_eq!(decode(">> 04:8c"), Some(RemoteEvent::VendorIdRequested(0)));
        assert_eq!(decode(">> 04:83"), Some(RemoteEvent::PhysicalAddressRequested(0)));
        assert_eq!(decode(">> 14:9f"), Some(RemoteEvent::VersionRequested(1)));
    }

    #[test]
    fn test_uppercase_hex_and_trailing_whitespace() {
        assert_eq!(
            decode(">> 10:44:4B \r"),
            Some(RemoteEvent::KeyPressed(RemoteKey::Forward))
        );
    }

    #[test]
    fn test_unhandled_opcodes() {
        assert_eq!(decode(">> 0f:36"), Some(RemoteEvent::Unhandled("0f:36".into())));
        // key press without an operand
        assert_eq!(decode(">> 10:44"), Some(RemoteEvent::Unhandled("10:44".into())));
    }

    #[test]
    fn test_frame_accessors() {
        let frame = Frame::parse(">> 10:44:44").unwrap();
        assert_eq!(frame.initiator(), 1);
        assert_eq!(frame.destination(), 0);
        assert_eq!(frame.opcode(), 0x44);
        assert_eq!(frame.payload(), Some(0x44));
        assert_eq!(frame.to_wire(), "10:44:44");
    }

    #[test]
    fn test_query_replies() {
        let replies = QueryReplies::from_config(&RemoteConfig::default());
        assert_eq!(
            replies.reply(&RemoteEvent::OsdNameRequested(0)).unwrap().to_wire(),
            "40:47:70:6c:69:65:72"
        );
        assert_eq!(
            replies.reply(&RemoteEvent::VendorIdRequested(0)).unwrap().to_wire(),
            "4f:87:00:15:82"
        );
        assert_eq!(
            replies
                .reply(&RemoteEvent::PhysicalAddressRequested(0))
                .unwrap()
                .to_wire(),
            "4f:84:10:00:04"
        );
        assert_eq!(
            replies.reply(&RemoteEvent::VersionRequested(0)).unwrap().to_wire(),
            "40:9e:04"
        );
        assert!(replies
            .reply(&RemoteEvent::KeyPressed(RemoteKey::Play))
            .is_none());
    }

    #[test]
    fn test_directed_replies_go_back_to_initiator() {
        let replies = QueryReplies::from_config(&RemoteConfig::default());
        let version = decode(">> 1f:9f").unwrap();
        assert_eq!(replies.reply(&version).unwrap().to_wire(), "41:9e:04");
        let name = decode(">> 54:46").unwrap();
        let frame = replies.reply(&name).unwrap();
        assert_eq!(frame.initiator(), OWN_ADDRESS);
        assert_eq!(frame.destination(), 5);
        let vendor = decode(">> 14:8c").unwrap();
        assert_eq!(replies.reply(&vendor).unwrap().destination(), BROADCAST);
    }

    #[test]
    fn test_bad_reply_config_falls_back() {
        let config = RemoteConfig {
            physical_address: "nonsense".into(),
            vendor_id: "00:15".into(),
            ..RemoteConfig::default()
        };
        let replies = QueryReplies::from_config(&config);
        assert_eq!(replies.physical_address, [0x10, 0x00]);
        assert_eq!(replies.vendor_id, [0x00, 0x15, 0x82]);
    }
}
