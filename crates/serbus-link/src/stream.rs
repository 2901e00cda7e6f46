use std::io::{ErrorKind, Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;

use crate::error::{LinkError, Result};
use crate::traits::SerialLink;

/// A serial link over a Unix stream socket.
///
/// On a development host a stream socket stands in for the serial device:
/// same duplex byte semantics, same per-byte blocking behavior. The kernel
/// socket buffer provides the outbound backpressure.
pub struct StreamLink {
    inner: UnixStream,
}

impl StreamLink {
    /// Wrap a connected Unix stream.
    pub fn new(stream: UnixStream) -> Self {
        Self { inner: stream }
    }

    /// Create a connected pair of links over a socketpair.
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = UnixStream::pair()?;
        Ok((Self::new(left), Self::new(right)))
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &UnixStream {
        &self.inner
    }

    /// Consume the link and return the inner stream.
    pub fn into_inner(self) -> UnixStream {
        self.inner
    }
}

impl SerialLink for StreamLink {
    fn bytes_available(&mut self) -> Result<usize> {
        let fd = self.inner.as_raw_fd();
        let mut pending: libc::c_int = 0;

        // SAFETY: `fd` is an open socket descriptor owned by `self.inner`,
        // and `pending` is a valid writable int for FIONREAD to fill.
        let rc = unsafe { libc::ioctl(fd, libc::FIONREAD, &mut pending) };
        if rc != 0 {
            return Err(LinkError::Io(std::io::Error::last_os_error()));
        }
        Ok(pending.max(0) as usize)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Err(LinkError::Closed),
                Ok(_) => return Ok(byte[0]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(LinkError::Io(err)),
            }
        }
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        loop {
            match self.inner.write(&[byte]) {
                Ok(0) => return Err(LinkError::Closed),
                Ok(_) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(LinkError::Io(err)),
            }
        }
    }
}

impl std::fmt::Debug for StreamLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamLink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_cross_a_socketpair() {
        let (mut left, mut right) = StreamLink::pair().unwrap();

        left.write_byte(0xAB).unwrap();
        assert_eq!(right.read_byte().unwrap(), 0xAB);
    }

    #[test]
    fn available_reflects_pending_bytes() {
        let (mut left, mut right) = StreamLink::pair().unwrap();

        assert_eq!(right.bytes_available().unwrap(), 0);
        for byte in 0..5u8 {
            left.write_byte(byte).unwrap();
        }

        // Give the kernel a moment on slow CI machines.
        let mut pending = 0;
        for _ in 0..100 {
            pending = right.bytes_available().unwrap();
            if pending == 5 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        assert_eq!(pending, 5);

        for expected in 0..5u8 {
            assert_eq!(right.read_byte().unwrap(), expected);
        }
    }

    #[test]
    fn read_after_hangup_reports_closed() {
        let (left, mut right) = StreamLink::pair().unwrap();
        drop(left);

        assert!(matches!(right.read_byte(), Err(LinkError::Closed)));
    }
}
