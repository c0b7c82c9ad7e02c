/// Errors raised while compiling or applying argument policies.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The generated schema could not be compiled.
    #[error("failed to compile policy for {key}: {message}")]
    CompileFailed { key: String, message: String },

    /// The arguments failed policy validation.
    #[error("invalid arguments for {key}: {message}")]
    ValidationFailed { key: String, message: String },

    /// No policy registered for the method.
    #[error("no policy registered for {0}")]
    NoPolicy(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
