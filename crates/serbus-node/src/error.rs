/// Errors that can occur in engine operations.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Transport-level error.
    #[error("link error: {0}")]
    Link(#[from] serbus_link::LinkError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] serbus_frame::FrameError),

    /// Topic ids above 62 are reserved.
    #[error("topic {0} out of range (0-62)")]
    TopicOutOfRange(u8),

    /// The payload exceeds the one-byte length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The topic already has a subscriber.
    #[error("topic {0} already subscribed")]
    AlreadySubscribed(u8),

    /// All registry slots are occupied.
    #[error("registry full ({capacity} topics)")]
    RegistryFull { capacity: usize },

    /// No subscriber registered for the topic.
    #[error("topic {0} not subscribed")]
    NotSubscribed(u8),

    /// No valid acknowledgment arrived within the deadline.
    #[error("no acknowledgment within {0:?}")]
    AckTimeout(std::time::Duration),
}

pub type Result<T> = std::result::Result<T, NodeError>;
