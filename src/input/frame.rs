//! Framing of the UART link from the USB-host co-processor.
//!
//! Frame format:
//! - START (1 byte): 0xAA synchronization byte
//! - LENGTH (1 byte): payload length (0-64)
//! - KIND (1 byte): report kind (keyboard / mouse / generic)
//! - PAYLOAD (0-64 bytes): the raw USB HID report
//! - CHECKSUM (1 byte): XOR of LENGTH, KIND, and all PAYLOAD bytes

use heapless::Vec;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xAA;

/// Maximum payload size in bytes (one full-speed interrupt packet)
pub const MAX_PAYLOAD_SIZE: usize = 64;

/// Maximum complete frame size (START + LENGTH + KIND + MAX_PAYLOAD + CHECKSUM)
pub const MAX_FRAME_SIZE: usize = 1 + 1 + 1 + MAX_PAYLOAD_SIZE + 1;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Checksum mismatch
    InvalidChecksum,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Which USB callback a frame's payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportKind {
    Keyboard,
    Mouse,
    Generic,
}

impl ReportKind {
    pub fn from_byte(kind: u8) -> Option<Self> {
        match kind {
            0x01 => Some(ReportKind::Keyboard),
            0x02 => Some(ReportKind::Mouse),
            0x03 => Some(ReportKind::Generic),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ReportKind::Keyboard => 0x01,
            ReportKind::Mouse => 0x02,
            ReportKind::Generic => 0x03,
        }
    }
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw kind byte; see [`ReportKind::from_byte`]
    pub kind: u8,
    /// Raw USB report bytes
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given kind and payload
    pub fn new(kind: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { kind, payload })
    }

    pub fn report_kind(&self) -> Option<ReportKind> {
        ReportKind::from_byte(self.kind)
    }

    fn checksum(length: u8, kind: u8, payload: &[u8]) -> u8 {
        payload.iter().fold(length ^ kind, |acc, &b| acc ^ b)
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = 4 + self.payload.len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let length = self.payload.len() as u8;
        buffer[0] = FRAME_START;
        buffer[1] = length;
        buffer[2] = self.kind;
        buffer[3..3 + self.payload.len()].copy_from_slice(&self.payload);
        buffer[3 + self.payload.len()] = Self::checksum(length, self.kind, &self.payload);

        Ok(frame_len)
    }
}

/// State machine for parsing incoming frames
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
    expected_length: u8,
    kind: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    WaitingForStart,
    WaitingForLength,
    WaitingForKind,
    ReadingPayload,
    WaitingForChecksum,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    pub const fn new() -> Self {
        Self {
            state: ParseState::WaitingForStart,
            buffer: Vec::new(),
            expected_length: 0,
            kind: 0,
        }
    }

    /// Drop any partial frame and hunt for the next START byte
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForStart;
        self.buffer.clear();
        self.expected_length = 0;
        self.kind = 0;
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    /// After an error the parser is already resynchronising.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ParseState::WaitingForStart => {
                if byte == FRAME_START {
                    self.state = ParseState::WaitingForLength;
                }
                Ok(None)
            }
            ParseState::WaitingForLength => {
                if byte as usize > MAX_PAYLOAD_SIZE {
                    self.reset();
                    return Err(FrameError::PayloadTooLarge);
                }
                self.expected_length = byte;
                self.state = ParseState::WaitingForKind;
                Ok(None)
            }
            ParseState::WaitingForKind => {
                self.kind = byte;
                self.buffer.clear();
                self.state = if self.expected_length == 0 {
                    ParseState::WaitingForChecksum
                } else {
                    ParseState::ReadingPayload
                };
                Ok(None)
            }
            ParseState::ReadingPayload => {
                // Bounded by the length check above.
                let _ = self.buffer.push(byte);
                if self.buffer.len() == self.expected_length as usize {
                    self.state = ParseState::WaitingForChecksum;
                }
                Ok(None)
            }
            ParseState::WaitingForChecksum => {
                let expected = Frame::checksum(self.expected_length, self.kind, &self.buffer);
                if byte != expected {
                    self.reset();
                    return Err(FrameError::InvalidChecksum);
                }

                let frame = Frame {
                    kind: self.kind,
                    payload: core::mem::take(&mut self.buffer),
                };
                self.reset();
                Ok(Some(frame))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode(frame: &Frame) -> std::vec::Vec<u8> {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = frame.encode(&mut buf).unwrap();
        buf[..len].to_vec()
    }

    fn parse_all(parser: &mut FrameParser, bytes: &[u8]) -> std::vec::Vec<Frame> {
        bytes
            .iter()
            .filter_map(|&b| parser.feed(b).ok().flatten())
            .collect()
    }

    #[test]
    fn encode_keyboard_frame() {
        let frame = Frame::new(0x01, &[0x02, 0, 0x04, 0, 0, 0, 0, 0]).unwrap();
        let bytes = encode(&frame);
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[..3], &[FRAME_START, 8, 0x01]);
        // 8 ^ 1 ^ 2 ^ 4
        assert_eq!(bytes[11], 0x0F);
    }

    #[test]
    fn empty_payload_frame() {
        let frame = Frame::new(0x03, &[]).unwrap();
        let bytes = encode(&frame);
        assert_eq!(bytes, [FRAME_START, 0, 0x03, 0x03]);
        let mut parser = FrameParser::new();
        assert_eq!(parse_all(&mut parser, &bytes), [frame]);
    }

    #[test]
    fn payload_too_large() {
        let large = [0u8; MAX_PAYLOAD_SIZE + 1];
        assert_eq!(Frame::new(0x01, &large), Err(FrameError::PayloadTooLarge));

        let mut parser = FrameParser::new();
        parser.feed(FRAME_START).unwrap();
        assert_eq!(parser.feed(MAX_PAYLOAD_SIZE as u8 + 1), Err(FrameError::PayloadTooLarge));
    }

    #[test]
    fn bad_checksum_then_recovers() {
        let frame = Frame::new(0x02, &[0x01, 0x05, 0xFB]).unwrap();
        let mut corrupt = encode(&frame);
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0xFF;

        let mut parser = FrameParser::new();
        let mut result = Ok(None);
        for &b in &corrupt {
            result = parser.feed(b);
        }
        assert_eq!(result, Err(FrameError::InvalidChecksum));

        assert_eq!(parse_all(&mut parser, &encode(&frame)), [frame]);
    }

    #[test]
    fn frames_split_across_reads() {
        let a = Frame::new(0x01, &[0, 0, 4, 0, 0, 0, 0, 0]).unwrap();
        let b = Frame::new(0x02, &[1, 2, 3]).unwrap();
        let mut stream = encode(&a);
        stream.extend(encode(&b));

        let mut parser = FrameParser::new();
        let (head, tail) = stream.split_at(5);
        let mut frames = parse_all(&mut parser, head);
        frames.extend(parse_all(&mut parser, tail));
        assert_eq!(frames, [a, b]);
    }

    #[test]
    fn report_kinds() {
        assert_eq!(ReportKind::from_byte(0x01), Some(ReportKind::Keyboard));
        assert_eq!(ReportKind::from_byte(0x02), Some(ReportKind::Mouse));
        assert_eq!(ReportKind::from_byte(0x03), Some(ReportKind::Generic));
        assert_eq!(ReportKind::from_byte(0x00), None);
        assert_eq!(ReportKind::from_byte(0x7F), None);
        for kind in [ReportKind::Keyboard, ReportKind::Mouse, ReportKind::Generic] {
            assert_eq!(ReportKind::from_byte(kind.to_byte()), Some(kind));
        }
    }

    proptest! {
        #[test]
        fn resyncs_after_clean_garbage(
            garbage in proptest::collection::vec(any::<u8>().prop_filter("no start", |b| *b != FRAME_START), 0..100),
            kind in any::<u8>(),
            payload in proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_SIZE),
        ) {
            let frame = Frame::new(kind, &payload).unwrap();
            let mut stream = garbage.clone();
            stream.extend(encode(&frame));
            let mut parser = FrameParser::new();
            prop_assert_eq!(parse_all(&mut parser, &stream), [frame]);
        }

        #[test]
        fn resyncs_after_arbitrary_garbage_and_idle_line(
            garbage in proptest::collection::vec(any::<u8>(), 0..200),
            kind in any::<u8>(),
            payload in proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_SIZE),
        ) {
            // A line-idle gap of zeros longer than any frame flushes a
            // half-parsed bogus frame.
            let frame = Frame::new(kind, &payload).unwrap();
            let mut stream = garbage.clone();
            stream.extend(core::iter::repeat(0u8).take(MAX_FRAME_SIZE));
            stream.extend(encode(&frame));
            let mut parser = FrameParser::new();
            let frames = parse_all(&mut parser, &stream);
            prop_assert_eq!(frames.last(), Some(&frame));
        }
    }
}
