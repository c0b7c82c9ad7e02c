//! Bus channel IDs.

/// Handshake and object registration.
pub const CONTROL: u16 = 0;

/// Method invocations from the broker.
pub const INVOKE: u16 = 1;

/// Replies to invocations.
pub const REPLY: u16 = 2;

/// Events published to subscribers.
pub const EVENT: u16 = 3;

/// Protocol error notices.
pub const ERROR: u16 = 4;

/// Human-readable channel name for logs.
pub fn channel_name(id: u16) -> &'static str {
    match id {
        CONTROL => "CONTROL",
        INVOKE => "INVOKE",
        REPLY => "REPLY",
        EVENT => "EVENT",
        ERROR => "ERROR",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_distinct() {
        let names: std::collections::HashSet<_> = [CONTROL, INVOKE, REPLY, EVENT, ERROR]
            .iter()
            .map(|id| channel_name(*id))
            .collect();
        assert_eq!(names.len(), 5);
        assert_eq!(channel_name(77), "UNKNOWN");
    }
}
