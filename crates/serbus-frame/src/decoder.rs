use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::checksum::{Checksum, Crc16};
use crate::wire::{FrameInfo, ESCAPE, FRAME_START};

/// Receive states, one per wire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Info,
    Length,
    Data,
    Crc,
}

/// A completed inbound frame, handed off by the decoder.
///
/// The payload is exactly the declared length. `crc_ok` reports whether the
/// received checksum matched the accumulated one; the frame is delivered
/// either way so the layer above can route the failure to the application.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub info: FrameInfo,
    pub payload: Bytes,
    pub crc_ok: bool,
}

/// Byte-driven frame reassembly.
///
/// All receive state lives in this one context: exactly one frame is ever
/// in flight. Feed raw wire bytes through [`Decoder::push`]; a completed
/// frame comes back as soon as its last checksum byte arrives. Bytes
/// outside a frame are ignored, so the decoder resynchronizes on the next
/// raw start byte after garbage or a partial frame.
pub struct Decoder<C: Checksum = Crc16> {
    state: State,
    /// A raw escape byte was seen; the next byte is literal.
    escaped: bool,
    crc: C,
    info: FrameInfo,
    declared_len: usize,
    buf: Option<BytesMut>,
    received_crc: u16,
    crc_high_seen: bool,
}

impl Decoder<Crc16> {
    pub fn new() -> Self {
        Self::with_checksum(Crc16::new())
    }
}

impl Default for Decoder<Crc16> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Checksum> Decoder<C> {
    /// Create a decoder around an explicit checksum engine.
    pub fn with_checksum(crc: C) -> Self {
        Self {
            state: State::Idle,
            escaped: false,
            crc,
            info: FrameInfo::default(),
            declared_len: 0,
            buf: None,
            received_crc: 0,
            crc_high_seen: false,
        }
    }

    /// Consume one raw wire byte.
    ///
    /// A raw escape byte produces nothing and marks the next byte literal;
    /// every other byte advances the state machine.
    pub fn push(&mut self, byte: u8) -> Option<Inbound> {
        if !self.escaped && byte == ESCAPE {
            self.escaped = true;
            return None;
        }
        self.escaped = false;
        self.advance(byte)
    }

    fn advance(&mut self, byte: u8) -> Option<Inbound> {
        match self.state {
            State::Idle => {
                if byte == FRAME_START {
                    self.crc.reset();
                    if self.buf.take().is_some() {
                        debug!("discarding incomplete frame on new start byte");
                    }
                    self.state = State::Info;
                }
                None
            }
            State::Info => {
                self.crc.update(byte);
                self.info = FrameInfo::from_byte(byte);
                self.state = State::Length;
                None
            }
            State::Length => {
                self.crc.update(byte);
                self.declared_len = byte as usize;
                self.buf = Some(BytesMut::with_capacity(self.declared_len));
                self.crc_high_seen = false;
                self.state = if self.declared_len == 0 {
                    State::Crc
                } else {
                    State::Data
                };
                None
            }
            State::Data => {
                self.crc.update(byte);
                let buf = self.buf.as_mut()?;
                buf.put_u8(byte);
                if buf.len() == self.declared_len {
                    self.crc_high_seen = false;
                    self.state = State::Crc;
                }
                None
            }
            State::Crc => {
                if !self.crc_high_seen {
                    self.received_crc = u16::from(byte) << 8;
                    self.crc_high_seen = true;
                    return None;
                }
                self.received_crc |= u16::from(byte);
                let crc_ok = self.received_crc == self.crc.finalize();
                self.state = State::Idle;

                let payload = self.buf.take().unwrap_or_default().freeze();
                let inbound = Inbound {
                    info: self.info,
                    payload,
                    crc_ok,
                };
                trace!(
                    topic = inbound.info.topic,
                    len = inbound.payload.len(),
                    crc_ok,
                    "frame complete"
                );
                Some(inbound)
            }
        }
    }
}

impl<C: Checksum> std::fmt::Debug for Decoder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("state", &self.state)
            .field("escaped", &self.escaped)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serbus_link::SerialLink;

    use super::*;
    use crate::encoder::write_frame;
    use crate::wire::MAX_PAYLOAD;

    #[derive(Default)]
    struct VecLink {
        wire: Vec<u8>,
    }

    impl SerialLink for VecLink {
        fn bytes_available(&mut self) -> serbus_link::Result<usize> {
            Ok(0)
        }

        fn read_byte(&mut self) -> serbus_link::Result<u8> {
            Err(serbus_link::LinkError::Closed)
        }

        fn write_byte(&mut self, byte: u8) -> serbus_link::Result<()> {
            self.wire.push(byte);
            Ok(())
        }
    }

    fn encode(info: FrameInfo, payload: &[u8]) -> Vec<u8> {
        let mut link = VecLink::default();
        let mut crc = Crc16::new();
        write_frame(&mut link, &mut crc, info, payload).unwrap();
        link.wire
    }

    fn feed(decoder: &mut Decoder, wire: &[u8]) -> Vec<Inbound> {
        wire.iter().filter_map(|&b| decoder.push(b)).collect()
    }

    #[test]
    fn roundtrip_plain_payload() {
        let wire = encode(FrameInfo::data(5, false), &[0x01, 0x02, 0x03]);
        let mut decoder = Decoder::new();

        let frames = feed(&mut decoder, &wire);
        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.info.topic, 5);
        assert!(!frame.info.is_ack);
        assert!(!frame.info.ack_requested);
        assert!(frame.crc_ok);
        assert_eq!(frame.payload.as_ref(), &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn roundtrip_marker_saturated_payload() {
        // Every byte collides with a protocol marker.
        let payload: Vec<u8> = [FRAME_START, ESCAPE]
            .into_iter()
            .cycle()
            .take(32)
            .collect();
        let wire = encode(FrameInfo::data(7, false), &payload);
        let mut decoder = Decoder::new();

        let frames = feed(&mut decoder, &wire);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].crc_ok);
        assert_eq!(frames[0].payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn roundtrip_all_byte_values() {
        let payload: Vec<u8> = (0..=255u8).collect();
        let wire = encode(FrameInfo::data(62, true), &payload[..MAX_PAYLOAD]);
        let mut decoder = Decoder::new();

        let frames = feed(&mut decoder, &wire);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].crc_ok);
        assert!(frames[0].info.ack_requested);
        assert_eq!(frames[0].payload.as_ref(), &payload[..MAX_PAYLOAD]);
    }

    #[test]
    fn zero_length_frame_completes() {
        let wire = encode(FrameInfo::data(3, false), &[]);
        let mut decoder = Decoder::new();

        let frames = feed(&mut decoder, &wire);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].crc_ok);
        assert!(frames[0].payload.is_empty());
    }

    #[test]
    fn corrupted_byte_fails_the_checksum() {
        let wire = encode(FrameInfo::data(5, false), &[0x10, 0x20, 0x30]);
        let mut decoder = Decoder::new();

        // Flip one bit in a payload byte, avoiding marker collisions.
        let mut corrupted = wire.clone();
        corrupted[3] ^= 0x01;

        let frames = feed(&mut decoder, &corrupted);
        assert_eq!(frames.len(), 1);
        assert!(!frames[0].crc_ok, "flipped bit must fail the checksum");
    }

    #[test]
    fn every_single_bit_flip_in_the_body_is_detected() {
        let original = encode(FrameInfo::data(1, false), &[0xA5, 0x5A]);

        // Body bytes only (skip start and the two crc bytes); a flip that
        // produces a marker byte changes framing instead, so skip those.
        // A flip in the length byte may leave the frame incomplete — no
        // frame at all counts as detected too.
        for index in 1..original.len() - 2 {
            for bit in 0..8 {
                let mut wire = original.clone();
                wire[index] ^= 1 << bit;
                if wire[index] == FRAME_START || wire[index] == ESCAPE {
                    continue;
                }

                let mut decoder = Decoder::new();
                let frames = feed(&mut decoder, &wire);
                assert!(
                    frames.iter().all(|frame| !frame.crc_ok),
                    "flip at byte {index} bit {bit} went undetected"
                );
            }
        }
    }

    #[test]
    fn garbage_before_the_start_byte_is_ignored() {
        let wire = encode(FrameInfo::data(2, false), &[0xAA]);
        let mut decoder = Decoder::new();

        let mut stream = vec![0x00, 0x13, 0x37, 0x55];
        stream.extend_from_slice(&wire);

        let frames = feed(&mut decoder, &stream);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].crc_ok);
        assert_eq!(frames[0].payload.as_ref(), &[0xAA]);
    }

    #[test]
    fn truncated_frame_corrupts_one_successor_then_recovers() {
        // Start detection only happens in the idle state, so a frame cut
        // mid-body swallows the head of the next frame as its own body.
        // That successor surfaces as a checksum mismatch; the frame after
        // it decodes clean again.
        let frame = encode(FrameInfo::data(5, false), &[0x01, 0x02, 0x03]);
        // Keep the scenario deterministic: no marker bytes past the start.
        assert!(frame[1..]
            .iter()
            .all(|&b| b != FRAME_START && b != ESCAPE));

        let mut stream = frame[..3].to_vec();
        stream.extend_from_slice(&frame);
        stream.extend_from_slice(&frame);

        let mut decoder = Decoder::new();
        let frames = feed(&mut decoder, &stream);
        assert_eq!(frames.len(), 2);
        assert!(!frames[0].crc_ok, "swallowed frame must fail its checksum");
        assert!(frames[1].crc_ok);
        assert_eq!(frames[1].info.topic, 5);
        assert_eq!(frames[1].payload.as_ref(), &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn back_to_back_frames_decode_independently() {
        let mut stream = encode(FrameInfo::data(1, false), b"one");
        stream.extend_from_slice(&encode(FrameInfo::data(2, true), b"two"));
        let mut decoder = Decoder::new();

        let frames = feed(&mut decoder, &stream);
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.crc_ok));
        assert_eq!(frames[0].info.topic, 1);
        assert_eq!(frames[0].payload.as_ref(), b"one");
        assert_eq!(frames[1].info.topic, 2);
        assert!(frames[1].info.ack_requested);
        assert_eq!(frames[1].payload.as_ref(), b"two");
    }

    #[test]
    fn escaped_literal_escape_is_data() {
        // ESC ESC inside the data phase is one literal 0x7F byte.
        let wire = encode(FrameInfo::data(6, false), &[ESCAPE]);
        let mut decoder = Decoder::new();

        let frames = feed(&mut decoder, &wire);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].crc_ok);
        assert_eq!(frames[0].payload.as_ref(), &[ESCAPE]);
    }

    #[test]
    fn ack_frame_parses_with_reserved_topic() {
        let wire = encode(FrameInfo::ack(), &[2]);
        let mut decoder = Decoder::new();

        let frames = feed(&mut decoder, &wire);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].crc_ok);
        assert!(frames[0].info.is_ack);
        assert_eq!(frames[0].payload.as_ref(), &[2]);
    }
}
