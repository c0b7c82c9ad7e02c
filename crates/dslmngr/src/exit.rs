use std::fmt;

use dslmngr_bus::BusError;
use dslmngr_xdsl::BackendError;

use crate::config::ConfigError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const INTERNAL: i32 = 125;
/// The bus could not be reached (`-1` as a process status).
pub const BUS_CONNECT: i32 = 255;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn config_error(err: ConfigError) -> CliError {
    CliError::new(DATA_INVALID, err.to_string())
}

pub fn backend_error(context: &str, err: BackendError) -> CliError {
    let code = match err {
        BackendError::UnknownType(_) | BackendError::Parse { .. } => DATA_INVALID,
        _ => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// Failure to reach the broker at all.
pub fn connect_error(err: BusError) -> CliError {
    CliError::new(BUS_CONNECT, format!("failed to connect to bus: {err}"))
}

pub fn bus_error(context: &str, err: BusError) -> CliError {
    let code = match err {
        BusError::Transport(_)
        | BusError::Frame(_)
        | BusError::Disconnected(_)
        | BusError::Timeout(_) => TRANSPORT_ERROR,
        BusError::Json(_) | BusError::Protocol(_) => DATA_INVALID,
        BusError::Policy(_) | BusError::DuplicateObject(_) => INTERNAL,
        _ => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn io_error(context: &str, err: std::io::Error) -> CliError {
    CliError::new(INTERNAL, format!("{context}: {err}"))
}
