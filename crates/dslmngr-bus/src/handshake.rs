//! Hello exchange opening every bus connection.
//!
//! The client speaks first on CONTROL, naming the protocol, its version and
//! itself. The broker answers with the identifier it assigned to the
//! connection. Both ends must agree on the protocol name and major version.

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;
use std::time::{Duration, Instant};

use dslmngr_frame::{channel_name, FrameError, FrameReader, FrameWriter, CONTROL};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{BusError, Result};

pub const PROTOCOL: &str = "dslbus";
pub const PROTOCOL_VERSION: Version = Version { major: 1, minor: 0 };
pub const HELLO_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_HELLO_PAYLOAD: usize = 4096;
const MAX_NAME_LEN: usize = 128;

/// `<major>.<minor>` protocol version, a string on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Version {
    /// Whether a client speaking `self` may talk to a broker at `broker`.
    /// The client may be newer within the same major.
    pub fn accepts(self, broker: Version) -> bool {
        self.major == broker.major && self.minor >= broker.minor
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = BusError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || BusError::HandshakeFailed(format!("invalid version '{s}'"));
        let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl TryFrom<String> for Version {
    type Error = BusError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// What the client announces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hello {
    pub protocol: String,
    pub version: Version,
    /// Program name, for broker logs.
    pub client: String,
}

/// What the broker answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Welcome {
    pub protocol: String,
    pub version: Version,
    pub client_id: String,
}

/// Client side: announce `client` and wait for the broker's welcome.
pub fn client_hello<R: Read, W: Write>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    client: &str,
    timeout: Duration,
) -> Result<Welcome> {
    let hello = Hello {
        protocol: PROTOCOL.to_string(),
        version: PROTOCOL_VERSION,
        client: client.to_string(),
    };
    send_control_json(writer, &hello)?;

    let welcome: Welcome = read_hello(reader, timeout)?;
    check_protocol(&welcome.protocol)?;
    if !PROTOCOL_VERSION.accepts(welcome.version) {
        return Err(BusError::HandshakeFailed(format!(
            "broker speaks {PROTOCOL} {}, we speak {PROTOCOL_VERSION}",
            welcome.version
        )));
    }
    check_name("client_id", &welcome.client_id)?;
    Ok(welcome)
}

/// Broker side: read the client's hello and welcome it as `client_id`.
pub fn broker_hello<R: Read, W: Write>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    client_id: &str,
    timeout: Duration,
) -> Result<Hello> {
    let hello: Hello = read_hello(reader, timeout)?;
    check_protocol(&hello.protocol)?;
    if !hello.version.accepts(PROTOCOL_VERSION) {
        return Err(BusError::HandshakeFailed(format!(
            "client speaks {PROTOCOL} {}, broker speaks {PROTOCOL_VERSION}",
            hello.version
        )));
    }
    check_name("client name", &hello.client)?;

    let welcome = Welcome {
        protocol: PROTOCOL.to_string(),
        version: PROTOCOL_VERSION,
        client_id: client_id.to_string(),
    };
    send_control_json(writer, &welcome)?;
    Ok(hello)
}

pub(crate) fn send_control_json<T: Serialize, W: Write>(
    writer: &mut FrameWriter<W>,
    value: &T,
) -> Result<()> {
    let payload = serde_json::to_vec(value)?;
    writer.send(CONTROL, &payload)?;
    Ok(())
}

fn read_hello<R: Read, T: DeserializeOwned>(
    reader: &mut FrameReader<R>,
    timeout: Duration,
) -> Result<T> {
    let deadline = Instant::now() + timeout;
    let frame = loop {
        match reader.read_frame() {
            Ok(frame) => break frame,
            Err(err) if err.is_timeout() => {
                if Instant::now() >= deadline {
                    return Err(BusError::Timeout(timeout));
                }
            }
            Err(FrameError::ConnectionClosed) => {
                return Err(BusError::Disconnected(
                    "connection closed during hello".to_string(),
                ));
            }
            Err(err) => return Err(err.into()),
        }
    };

    if frame.channel != CONTROL {
        return Err(BusError::HandshakeFailed(format!(
            "hello arrived on {} channel",
            channel_name(frame.channel)
        )));
    }
    if frame.payload.len() > MAX_HELLO_PAYLOAD {
        return Err(BusError::HandshakeFailed(format!(
            "hello of {} bytes exceeds {MAX_HELLO_PAYLOAD}",
            frame.payload.len()
        )));
    }
    Ok(serde_json::from_slice(&frame.payload)?)
}

fn check_protocol(protocol: &str) -> Result<()> {
    if protocol != PROTOCOL {
        return Err(BusError::HandshakeFailed(format!(
            "unknown protocol '{protocol}'"
        )));
    }
    Ok(())
}

fn check_name(what: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(BusError::HandshakeFailed(format!(
            "{what} must be 1..={MAX_NAME_LEN} bytes, got {}",
            name.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, ErrorKind};
    use std::os::unix::net::UnixStream;
    use std::thread;

    use serde_json::json;

    use super::*;

    fn ends(stream: UnixStream) -> (FrameReader<UnixStream>, FrameWriter<UnixStream>) {
        (FrameReader::new(stream.try_clone().unwrap()), FrameWriter::new(stream))
    }

    #[test]
    fn client_is_welcomed_with_its_id() {
        let (left, right) = UnixStream::pair().unwrap();
        let broker = thread::spawn(move || {
            let (mut reader, mut writer) = ends(left);
            broker_hello(&mut reader, &mut writer, "client-1", HELLO_TIMEOUT).unwrap()
        });

        let (mut reader, mut writer) = ends(right);
        let welcome = client_hello(&mut reader, &mut writer, "dslmngr", HELLO_TIMEOUT).unwrap();
        let hello = broker.join().unwrap();

        assert_eq!(welcome.client_id, "client-1");
        assert_eq!(welcome.version, PROTOCOL_VERSION);
        assert_eq!(hello.client, "dslmngr");
    }

    #[test]
    fn version_travels_as_string() {
        let hello = Hello {
            protocol: PROTOCOL.to_string(),
            version: Version { major: 1, minor: 3 },
            client: "x".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&hello).unwrap(),
            json!({"protocol": "dslbus", "version": "1.3", "client": "x"})
        );
        assert!(serde_json::from_value::<Hello>(
            json!({"protocol": "dslbus", "version": "one", "client": "x"})
        )
        .is_err());
    }

    #[test]
    fn version_compatibility() {
        let v = |major, minor| Version { major, minor };
        assert!(v(1, 2).accepts(v(1, 0)));
        assert!(!v(1, 0).accepts(v(1, 2)));
        assert!(!v(2, 0).accepts(v(1, 0)));
        assert!("1".parse::<Version>().is_err());
        assert!("1.x".parse::<Version>().is_err());
        assert!("1.0.0".parse::<Version>().is_err());
    }

    #[test]
    fn newer_broker_major_is_refused() {
        let (left, right) = UnixStream::pair().unwrap();
        let broker = thread::spawn(move || {
            let (mut reader, mut writer) = ends(left);
            reader.read_frame().unwrap();
            let welcome = Welcome {
                protocol: PROTOCOL.to_string(),
                version: Version { major: 2, minor: 0 },
                client_id: "client-3".to_string(),
            };
            send_control_json(&mut writer, &welcome).unwrap();
        });

        let (mut reader, mut writer) = ends(right);
        let result = client_hello(&mut reader, &mut writer, "dslmngr", HELLO_TIMEOUT);
        broker.join().unwrap();
        assert!(matches!(result, Err(BusError::HandshakeFailed(msg)) if msg.contains("2.0")));
    }

    #[test]
    fn broker_refuses_foreign_protocol_and_hangs_up() {
        let (left, right) = UnixStream::pair().unwrap();
        let broker = thread::spawn(move || {
            let (mut reader, mut writer) = ends(left);
            broker_hello(&mut reader, &mut writer, "client-2", HELLO_TIMEOUT)
        });

        let (mut reader, mut writer) = ends(right);
        writer
            .send(
                CONTROL,
                br#"{"protocol":"ubus","version":"1.0","client":"dslmngr"}"#,
            )
            .unwrap();
        assert!(matches!(
            broker.join().unwrap(),
            Err(BusError::HandshakeFailed(_))
        ));
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn malformed_and_misplaced_hellos() {
        let (left, right) = UnixStream::pair().unwrap();
        let (_, mut raw) = ends(left);
        raw.send(CONTROL, b"{not-json").unwrap();
        let (mut reader, mut writer) = ends(right);
        assert!(matches!(
            broker_hello(&mut reader, &mut writer, "client-4", HELLO_TIMEOUT),
            Err(BusError::Json(_))
        ));

        let (left, right) = UnixStream::pair().unwrap();
        let (_, mut raw) = ends(left);
        raw.send(dslmngr_frame::INVOKE, b"{}").unwrap();
        let (mut reader, _) = ends(right);
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        assert!(matches!(
            client_hello(&mut reader, &mut writer, "dslmngr", HELLO_TIMEOUT),
            Err(BusError::HandshakeFailed(_))
        ));
    }

    #[test]
    fn oversized_hello_is_refused() {
        let (left, right) = UnixStream::pair().unwrap();
        let broker = thread::spawn(move || {
            let (mut reader, mut writer) = ends(left);
            broker_hello(&mut reader, &mut writer, "client-5", HELLO_TIMEOUT)
        });

        let (mut reader, mut writer) = ends(right);
        let name = "d".repeat(MAX_HELLO_PAYLOAD);
        let result = client_hello(&mut reader, &mut writer, &name, HELLO_TIMEOUT);
        assert!(matches!(result, Err(BusError::Disconnected(_))));
        assert!(matches!(
            broker.join().unwrap(),
            Err(BusError::HandshakeFailed(_))
        ));
    }

    #[test]
    fn silent_broker_times_out() {
        let mut reader = FrameReader::new(AlwaysTimedOut);
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let result = client_hello(&mut reader, &mut writer, "dslmngr", Duration::from_millis(25));
        assert!(matches!(result, Err(BusError::Timeout(_))));
    }

    struct AlwaysTimedOut;

    impl Read for AlwaysTimedOut {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::TimedOut))
        }
    }
}
