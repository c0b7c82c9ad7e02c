//! Payloads of the INVOKE, REPLY and EVENT channels.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::status::Status;

/// Key/value table carried in arguments, replies and events.
pub type Table = Map<String, Value>;

/// A method call routed to this client by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoke {
    pub seq: u64,
    pub object: String,
    pub method: String,
    #[serde(default)]
    pub args: Value,
}

/// Answer to an [`Invoke`], matched by `seq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub seq: u64,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Table>,
}

impl Reply {
    pub fn ok(seq: u64, data: Table) -> Self {
        Self {
            seq,
            status: Status::Ok,
            data: Some(data),
        }
    }

    pub fn error(seq: u64, status: Status) -> Self {
        Self {
            seq,
            status,
            data: None,
        }
    }
}

/// A named notification broadcast to every subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event: String,
    pub data: Table,
}

impl Event {
    pub fn new(event: impl Into<String>, data: Table) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

/// ERROR channel notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub error: String,
}
