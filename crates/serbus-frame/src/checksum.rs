//! The checksum seam.
//!
//! Both ends of a line must run the same engine byte for byte; the trait is
//! the substitution point for deployments with different hardware on the
//! far side.

use crc::{Crc, CRC_16_IBM_3740};

static CCITT: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// An incremental 16-bit checksum accumulator.
pub trait Checksum {
    /// Clear the accumulator back to its initial state.
    fn reset(&mut self);

    /// Fold one byte into the running value.
    fn update(&mut self, byte: u8);

    /// Produce the checksum of everything fed since the last reset.
    /// Finalizing also resets the accumulator.
    fn finalize(&mut self) -> u16;
}

/// CRC-16/CCITT (IBM-3740 parameters: poly 0x1021, init 0xFFFF).
pub struct Crc16 {
    digest: crc::Digest<'static, u16>,
}

impl Crc16 {
    pub fn new() -> Self {
        Self {
            digest: CCITT.digest(),
        }
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

impl Checksum for Crc16 {
    fn reset(&mut self) {
        self.digest = CCITT.digest();
    }

    fn update(&mut self, byte: u8) {
        self.digest.update(&[byte]);
    }

    fn finalize(&mut self) -> u16 {
        let digest = std::mem::replace(&mut self.digest, CCITT.digest());
        digest.finalize()
    }
}

impl std::fmt::Debug for Crc16 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc16").finish_non_exhaustive()
    }
}
