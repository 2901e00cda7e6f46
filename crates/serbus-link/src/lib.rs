//! Byte-oriented serial link abstraction.
//!
//! Everything above this crate moves whole frames; this crate moves single
//! bytes. The [`SerialLink`] trait captures the three primitives the wire
//! layer needs — a non-blocking "how many bytes are waiting" query, a
//! blocking one-byte read, and a blocking one-byte write that waits for
//! buffer space — so the protocol engine runs unchanged over a hardware
//! UART, a Unix stream, or an in-memory loopback.

pub mod error;
pub mod mem;
pub mod traits;

#[cfg(unix)]
pub mod stream;
#[cfg(unix)]
pub mod uds;

pub use error::{LinkError, Result};
pub use mem::MemoryLink;
pub use traits::SerialLink;

#[cfg(unix)]
pub use stream::StreamLink;
#[cfg(unix)]
pub use uds::UnixLine;
