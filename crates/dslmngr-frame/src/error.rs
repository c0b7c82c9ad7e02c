/// Errors that can occur while framing bus traffic.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame header does not start with the bus magic.
    #[error("invalid frame magic (expected 0x4442 \"DB\")")]
    InvalidMagic,

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// True for read timeouts configured through [`FrameConfig`](crate::FrameConfig).
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FrameError::Io(err)
                if err.kind() == std::io::ErrorKind::WouldBlock
                    || err.kind() == std::io::ErrorKind::TimedOut
        )
    }
}

impl From<dslmngr_transport::TransportError> for FrameError {
    fn from(err: dslmngr_transport::TransportError) -> Self {
        match err {
            dslmngr_transport::TransportError::Io(io)
            | dslmngr_transport::TransportError::Accept(io) => FrameError::Io(io),
            dslmngr_transport::TransportError::Bind { source, .. }
            | dslmngr_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
            other => FrameError::Io(std::io::Error::other(other.to_string())),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
