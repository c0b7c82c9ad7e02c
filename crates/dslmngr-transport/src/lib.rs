//! Unix domain socket transport to the local RPC bus.
//!
//! This is the lowest layer of dslmngr. The daemon connects to the bus
//! broker with [`connect`]; bus-side tooling (and the test harnesses)
//! bind with [`BusListener`]. Everything else builds on [`BusStream`].

pub mod error;
pub mod stream;
pub mod uds;

pub use error::{Result, TransportError};
pub use stream::BusStream;
pub use uds::{connect, BusListener, DEFAULT_BUS_SOCKET};
