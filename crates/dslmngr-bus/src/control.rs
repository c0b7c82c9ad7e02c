use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{BusError, Result};
use crate::status::Status;

/// CONTROL message type: publish an object.
pub const CONTROL_ADD_OBJECT: &str = "add_object";
/// CONTROL message type: withdraw an object.
pub const CONTROL_REMOVE_OBJECT: &str = "remove_object";
/// CONTROL message type: broker acknowledgement of a request.
pub const CONTROL_STATUS: &str = "status";

/// CONTROL channel message payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Method entry of an `add_object` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MethodSpec {
    pub name: String,
    /// Argument name to type name, e.g. `{"interval": "string"}`.
    pub policy: Map<String, Value>,
}

/// Object description announced to the broker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub methods: Vec<MethodSpec>,
}

impl ControlMessage {
    /// Create an `add_object` request.
    pub fn add_object(spec: &ObjectSpec) -> Result<Self> {
        Ok(Self {
            msg_type: CONTROL_ADD_OBJECT.to_string(),
            payload: Some(serde_json::to_value(spec)?),
        })
    }

    /// Create a `remove_object` request.
    pub fn remove_object(name: &str) -> Self {
        Self {
            msg_type: CONTROL_REMOVE_OBJECT.to_string(),
            payload: Some(json!({ "name": name })),
        }
    }

    /// Create a status acknowledgement (broker side).
    pub fn status(object: &str, status: Status) -> Self {
        Self {
            msg_type: CONTROL_STATUS.to_string(),
            payload: Some(json!({ "object": object, "status": status })),
        }
    }

    /// Status carried by an acknowledgement.
    pub fn ack_status(&self) -> Result<Status> {
        if self.msg_type != CONTROL_STATUS {
            return Err(BusError::Protocol(format!(
                "expected '{CONTROL_STATUS}' control message, got '{}'",
                self.msg_type
            )));
        }
        let code = self
            .payload
            .as_ref()
            .and_then(|payload| payload.get("status"))
            .and_then(Value::as_u64)
            .ok_or_else(|| BusError::Protocol("status ack without status code".to_string()))?;
        u32::try_from(code)
            .ok()
            .and_then(Status::from_code)
            .ok_or_else(|| BusError::Protocol(format!("unknown status code {code}")))
    }

    /// Object name carried in the payload, if any.
    pub fn object_name(&self) -> Option<&str> {
        let payload = self.payload.as_ref()?;
        payload
            .get("name")
            .or_else(|| payload.get("object"))
            .and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_object_carries_spec() {
        let spec = ObjectSpec {
            name: "dsl.line.0".to_string(),
            object_type: "dsl.line".to_string(),
            methods: vec![MethodSpec {
                name: "stats".to_string(),
                policy: json!({"interval": "string"}).as_object().cloned().unwrap(),
            }],
        };
        let message = ControlMessage::add_object(&spec).unwrap();
        let wire = serde_json::to_value(&message).unwrap();
        assert_eq!(wire["type"], "add_object");
        assert_eq!(wire["payload"]["type"], "dsl.line");
        assert_eq!(wire["payload"]["methods"][0]["policy"]["interval"], "string");
        assert_eq!(message.object_name(), Some("dsl.line.0"));
    }

    #[test]
    fn status_ack_roundtrip() {
        let ack = ControlMessage::status("dsl", Status::PermissionDenied);
        assert_eq!(ack.ack_status().unwrap(), Status::PermissionDenied);
        assert_eq!(ack.object_name(), Some("dsl"));

        let not_ack = ControlMessage::remove_object("dsl");
        assert!(matches!(not_ack.ack_status(), Err(BusError::Protocol(_))));
    }
}
