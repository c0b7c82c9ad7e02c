//! xDSL manager daemon.
//!
//! Serves DSL line and channel status and statistics as bus objects and
//! republishes driver notifications from generic netlink as bus events.
//!
//! # Crate Structure
//!
//! - [`config`]: TOML configuration read once at startup
//! - [`objects`]: `dsl`, `dsl.line.<n>` and `dsl.channel.<n>`
//! - [`legacy`]: the older `xdsl` object
//! - [`daemon`]: connect, register, serve and shut down

#![cfg_attr(test, recursion_limit = "256")]
pub mod config;
pub mod daemon;
pub mod exit;
pub mod legacy;
pub mod logging;
pub mod objects;

pub use config::{Config, Topology};
pub use daemon::{build_objects, run, Daemon};
pub use exit::{CliError, CliResult};
