/// Errors from the generic netlink side of the bridge.
#[derive(Debug, thiserror::Error)]
pub enum NetlinkError {
    /// Socket I/O failed.
    #[error("netlink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A message or attribute is shorter than its header claims.
    #[error("truncated netlink data (expected {expected} bytes, got {actual})")]
    Truncated { expected: usize, actual: usize },

    /// An attribute does not fit the u16 length field.
    #[error("netlink attribute {kind} too long ({len} bytes)")]
    AttributeTooLong { kind: u16, len: usize },

    /// The kernel answered a request with an error.
    #[error("kernel returned error {0}")]
    Kernel(i32),

    /// The generic netlink family is not registered.
    #[error("generic netlink family '{0}' not found")]
    FamilyNotFound(String),

    /// The family has no multicast group of that name.
    #[error("multicast group '{group}' not found in family '{family}'")]
    GroupNotFound { family: String, group: String },

    /// Generic netlink is not available on this platform.
    #[error("generic netlink requires Linux")]
    Unsupported,
}

/// Reasons a notification string is dropped.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification has no event name")]
    MissingEvent,

    #[error("notification body is not quoted")]
    Unquoted,

    #[error("notification body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("notification body is not a JSON object")]
    NotAnObject,

    #[error("message carries no notification attribute")]
    MissingAttribute,

    #[error("notification attribute is not UTF-8")]
    NotUtf8,

    #[error("malformed netlink message")]
    Malformed,
}

pub type Result<T> = std::result::Result<T, NetlinkError>;
