//! Bus client for dslmngr.
//!
//! Connects to the broker, announces objects and their argument policies,
//! and serves invocations from a single loop. Events are published through
//! the same loop.

pub mod connection;
pub mod control;
pub mod error;
pub mod handshake;
pub mod listener;
pub mod message;
pub mod object;
pub mod registry;
pub mod serve;
pub mod status;

pub use connection::{connect, BusConnection, BusReader, BusWriter};
pub use control::{
    ControlMessage, MethodSpec, ObjectSpec, CONTROL_ADD_OBJECT, CONTROL_REMOVE_OBJECT,
    CONTROL_STATUS,
};
pub use error::{BusError, Result};
pub use handshake::{
    broker_hello, client_hello, Hello, Version, Welcome, HELLO_TIMEOUT, PROTOCOL, PROTOCOL_VERSION,
};
pub use listener::{BrokerListener, BrokerSession};
pub use message::{ErrorNotice, Event, Invoke, Reply, Table};
pub use object::{Handler, Method, Object};
pub use registry::{ObjectBus, ObjectSet};
pub use serve::{spawn_reader, LoopInput, ServeOutcome, ServingLoop};
pub use status::Status;
