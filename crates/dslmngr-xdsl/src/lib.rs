//! xDSL line and channel state, as reported by a driver backend and as
//! serialized for the bus.
//!
//! Driver records carry raw enum codes and bitmasks; [`mapper`] turns them
//! into the stable wire tokens and [`serializer`] builds the reply tables.

pub mod backend;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod fake;
pub mod file;
pub mod mapper;
pub mod model;
pub mod serializer;

pub use backend::{open_backend, Backend, BackendOptions};
pub use config::{LegacyMode, LineConfig, LineConfigError};
pub use error::{BackendError, Result};
pub use model::{
    Bearer, Channel, ChannelStatsInterval, DriverState, IntervalSet, Line, LineChannelStats,
    LineStatsInterval, PerfCounters, PerfSet, PerfWindow, Standard, StatsInterval, UnknownStatsType,
    UsDs,
};
