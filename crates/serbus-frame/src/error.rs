/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the one-byte length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The underlying link failed while moving frame bytes.
    #[error("frame link error: {0}")]
    Link(#[from] serbus_link::LinkError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
