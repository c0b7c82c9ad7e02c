use crate::status::Status;

/// Errors raised by the bus client.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] dslmngr_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] dslmngr_frame::FrameError),

    /// Hello exchange with the broker failed.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// The broker hung up.
    #[error("bus disconnected: {0}")]
    Disconnected(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A method argument policy could not be compiled.
    #[error("policy error: {0}")]
    Policy(#[from] dslmngr_schema::SchemaError),

    /// The broker rejected an `add_object` or `remove_object` request.
    #[error("bus refused object '{object}': {status}")]
    Rejected { object: String, status: Status },

    /// Two objects in one set share a name.
    #[error("duplicate object name '{0}'")]
    DuplicateObject(String),

    /// The broker sent something that is not part of the protocol.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Request timed out.
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

pub type Result<T> = std::result::Result<T, BusError>;
