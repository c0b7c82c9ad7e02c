use std::path::PathBuf;

/// Errors reported by driver backends.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend does not implement the accessor.
    #[error("operation '{0}' is not supported by this backend")]
    Unsupported(&'static str),

    /// No backend is registered for the configured technology.
    #[error("no backend for dsl type '{0}'")]
    UnknownType(String),

    /// Line index outside the reported line count.
    #[error("no such line: {0}")]
    NoSuchLine(usize),

    /// Channel index outside the reported channel count.
    #[error("no such channel: {0}")]
    NoSuchChannel(usize),

    /// The driver state could not be read.
    #[error("failed to read driver state {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The driver state is not a valid document.
    #[error("invalid driver state {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The driver reported a failure.
    #[error("driver error: {0}")]
    Driver(String),
}

pub type Result<T> = std::result::Result<T, BackendError>;
