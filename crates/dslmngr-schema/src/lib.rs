//! Method argument policies for bus objects.
//!
//! A policy names each argument a method accepts and its type, the same
//! contract a blobmsg policy table describes. Policies compile into JSON
//! Schema validators so malformed arguments are rejected before a handler
//! runs.

pub mod error;
pub mod policy;
pub mod registry;
pub mod validator;

pub use error::{Result, SchemaError};
pub use policy::{ArgPolicy, ArgType};
pub use registry::PolicyRegistry;
