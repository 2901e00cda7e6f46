//! Wire-level constants, the info byte, and the status code set.

/// Frame boundary marker. Sent raw, never escaped.
pub const FRAME_START: u8 = 0x7E;

/// Escape marker. Precedes any literal 0x7E or 0x7F inside a frame body.
pub const ESCAPE: u8 = 0x7F;

/// Highest topic id usable for data frames. Topic ids occupy six bits;
/// the top value is reserved for acknowledgments.
pub const MAX_TOPIC: u8 = 62;

/// Reserved topic id carried by acknowledgment frames.
pub const ACK_TOPIC: u8 = 63;

/// Maximum payload size: the length field is one byte.
pub const MAX_PAYLOAD: usize = 255;

const TOPIC_MASK: u8 = 0x3F;
const ACK_FRAME_BIT: u8 = 0x40;
const ACK_REQUEST_BIT: u8 = 0x80;

/// Decoded form of the INFO byte.
///
/// Bit layout (little-endian bit order): bits 0-5 topic id, bit 6 marks an
/// acknowledgment frame, bit 7 requests an acknowledgment for a data frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInfo {
    /// Topic id, 0-62 for data frames, 63 for acknowledgments.
    pub topic: u8,
    /// This frame is an acknowledgment.
    pub is_ack: bool,
    /// The sender asks for an acknowledgment of this data frame.
    pub ack_requested: bool,
}

impl FrameInfo {
    /// Info byte for a data frame.
    pub fn data(topic: u8, ack_requested: bool) -> Self {
        Self {
            topic,
            is_ack: false,
            ack_requested,
        }
    }

    /// Info byte for an acknowledgment frame.
    pub fn ack() -> Self {
        Self {
            topic: ACK_TOPIC,
            is_ack: true,
            ack_requested: false,
        }
    }

    /// Pack into the wire byte.
    pub fn to_byte(self) -> u8 {
        let mut byte = self.topic & TOPIC_MASK;
        if self.is_ack {
            byte |= ACK_FRAME_BIT;
        }
        if self.ack_requested {
            byte |= ACK_REQUEST_BIT;
        }
        byte
    }

    /// Unpack from the wire byte.
    pub fn from_byte(byte: u8) -> Self {
        Self {
            topic: byte & TOPIC_MASK,
            is_ack: byte & ACK_FRAME_BIT != 0,
            ack_requested: byte & ACK_REQUEST_BIT != 0,
        }
    }
}

/// Delivery status of a frame, also the one-byte acknowledgment payload.
///
/// A subscriber handler receives the inbound status and returns the status
/// to acknowledge with, so an application-level rejection travels back to
/// the publisher the same way protocol-level success does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    /// Frame delivered and accepted.
    Ok = 0,
    /// No subscriber registered for the topic.
    NotSubscribed = 1,
    /// The frame arrived with a checksum mismatch.
    ChecksumMismatch = 2,
    /// Reserved frame-type error, currently never produced.
    FrameType = 3,
    /// No valid acknowledgment arrived within the deadline.
    AckTimeout = 4,
    /// The receiving application rejected the payload.
    Rejected = 5,
}

impl Status {
    /// Wire byte value.
    pub fn to_wire(self) -> u8 {
        self as u8
    }

    /// Decode a wire byte. Out-of-range values decode to [`Status::Rejected`]:
    /// a peer acknowledging with a code we do not know is refusing the
    /// frame as far as this side is concerned.
    pub fn from_wire(byte: u8) -> Self {
        match byte {
            0 => Status::Ok,
            1 => Status::NotSubscribed,
            2 => Status::ChecksumMismatch,
            3 => Status::FrameType,
            4 => Status::AckTimeout,
            _ => Status::Rejected,
        }
    }

    /// Human-readable name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::NotSubscribed => "not-subscribed",
            Status::ChecksumMismatch => "checksum-mismatch",
            Status::FrameType => "frame-type",
            Status::AckTimeout => "ack-timeout",
            Status::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
