//! Kernel notification strings to bus events.
//!
//! The driver sends one string attribute per message, shaped
//! `<event> '<json object>'`, for example `linkup '{"line":0}'`.

use dslmngr_bus::Event;
use serde_json::Value;

use crate::error::NotificationError;
use crate::message::{attr_str, AttrIter, MessageIter, GENL_HDRLEN};

/// Attribute carrying the notification string.
pub const XDSL_NL_MSG: u16 = 1;

/// Split a notification string into an event.
///
/// The event name runs up to the first whitespace. The rest, trimmed and up
/// to the end of its first line, must open with a single quote; a closing
/// quote is stripped when present. The body must be a JSON object.
pub fn parse_notification(message: &str) -> Result<Event, NotificationError> {
    let message = message.trim_start();
    let (event, rest) = message
        .split_once(char::is_whitespace)
        .unwrap_or((message, ""));
    if event.is_empty() {
        return Err(NotificationError::MissingEvent);
    }

    let body = rest.lines().next().unwrap_or("").trim();
    let body = body.strip_prefix('\'').ok_or(NotificationError::Unquoted)?;
    let body = body.strip_suffix('\'').unwrap_or(body);

    match serde_json::from_str::<Value>(body)? {
        Value::Object(data) => Ok(Event::new(event, data)),
        _ => Err(NotificationError::NotAnObject),
    }
}

/// The notification string of one generic netlink message payload
/// (genl header plus attributes).
pub fn message_text(payload: &[u8]) -> Result<&str, NotificationError> {
    let attrs = payload
        .get(GENL_HDRLEN..)
        .ok_or(NotificationError::MissingAttribute)?;
    let (_, value) = AttrIter::new(attrs)
        .find(|(kind, _)| *kind == XDSL_NL_MSG)
        .ok_or(NotificationError::MissingAttribute)?;
    attr_str(value).ok_or(NotificationError::NotUtf8)
}

/// Events carried by one received datagram, in order. Messages of other
/// families are skipped; malformed ones yield an error entry.
pub fn decode_datagram(datagram: &[u8], family_id: u16) -> Vec<Result<Event, NotificationError>> {
    let mut events = Vec::new();
    for message in MessageIter::new(datagram) {
        let Ok((header, payload)) = message else {
            events.push(Err(NotificationError::Malformed));
            break;
        };
        if header.msg_type != family_id {
            continue;
        }
        events.push(message_text(payload).and_then(parse_notification));
    }
    events
}
