//! Point-to-point publish/subscribe messaging over raw serial byte links.
//!
//! serbus frames variable-length, topic-addressed messages directly onto a
//! duplex byte stream — no packet layer, no addressing, no sessions — with
//! byte-stuffed framing, CRC-16 integrity and optional blocking delivery
//! confirmation.
//!
//! # Crate Structure
//!
//! - [`link`] — Serial link abstraction (in-memory loopback, Unix streams)
//! - [`frame`] — Escaped, checksummed wire framing
//! - [`node`] — Topic registry, publish/subscribe engine, acknowledgments

/// Re-export link types.
pub mod link {
    pub use serbus_link::*;
}

/// Re-export frame types.
pub mod frame {
    pub use serbus_frame::*;
}

/// Re-export engine types.
pub mod node {
    pub use serbus_node::*;
}
