//! The serbus engine.
//!
//! This is the "just works" layer. A [`Node`] owns one serial link and
//! drives the whole protocol over it: subscribe handlers to topics, publish
//! payloads with or without delivery confirmation, and pump inbound bytes
//! with [`Node::poll`]. Everything is synchronous and single-threaded by
//! design — while a confirmed publish blocks for its acknowledgment, the
//! node keeps receiving and dispatching unrelated frames.

pub mod clock;
pub mod error;
pub mod node;
pub mod registry;

pub use clock::{Clock, MonotonicClock};
pub use error::{NodeError, Result};
pub use node::{AckMode, Node, NodeConfig};
pub use registry::{TopicHandler, TopicRegistry};
