//! Escaped, checksummed wire framing.
//!
//! This is the core value-add layer of serbus. Every message travels as one
//! frame:
//!
//! ```text
//! ┌───────────┬──────────┬────────────┬──────────────┬─────────────────┐
//! │ START (1) │ INFO (1) │ LENGTH (1) │ DATA (0-255) │ CRC hi, lo (2)  │
//! │ 0x7E raw  │ escaped  │ escaped    │ escaped      │ escaped         │
//! └───────────┴──────────┴────────────┴──────────────┴─────────────────┘
//! ```
//!
//! The start byte is the only byte ever sent raw; every 0x7E or 0x7F in the
//! remaining fields is prefixed with the 0x7F escape byte, so a raw 0x7E on
//! the wire is always a frame boundary. The CRC covers the logical
//! (pre-escape) INFO, LENGTH and DATA bytes and nothing else.

pub mod checksum;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod wire;

pub use checksum::{Checksum, Crc16};
pub use decoder::{Decoder, Inbound};
pub use encoder::{write_ack_frame, write_frame};
pub use error::{FrameError, Result};
pub use wire::{FrameInfo, Status, ACK_TOPIC, ESCAPE, FRAME_START, MAX_PAYLOAD, MAX_TOPIC};
