use crate::error::Result;

/// A duplex byte-oriented serial link.
///
/// This is the fundamental I/O seam of the stack. Implementations move
/// exactly one byte per call and expose per-byte backpressure: a full
/// outbound buffer blocks `write_byte`, an empty inbound buffer blocks
/// `read_byte`, and `bytes_available` never blocks at all.
pub trait SerialLink {
    /// Number of bytes that can be read without blocking.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read one byte, blocking until one is available.
    fn read_byte(&mut self) -> Result<u8>;

    /// Write one byte, blocking until the link accepts it.
    fn write_byte(&mut self, byte: u8) -> Result<()>;
}

impl<L: SerialLink + ?Sized> SerialLink for &mut L {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        (**self).write_byte(byte)
    }
}
