use std::collections::VecDeque;
use std::path::Path;
use std::time::{Duration, Instant};

use dslmngr_frame::{
    channel_name, Frame, FrameConfig, FrameError, FrameReader, FrameWriter, CONTROL, ERROR, EVENT,
    REPLY,
};
use dslmngr_transport::BusStream;
use tracing::{debug, trace};

use crate::control::{ControlMessage, ObjectSpec};
use crate::error::{BusError, Result};
use crate::handshake::{client_hello, send_control_json, HELLO_TIMEOUT};
use crate::message::{ErrorNotice, Event, Reply};
use crate::registry::ObjectBus;
use crate::status::Status;

/// Name announced in the hello.
const CLIENT_NAME: &str = "dslmngr";

/// Frames that may queue up while waiting for a CONTROL acknowledgement.
const MAX_PENDING_FRAMES: usize = 1024;

/// Connect to the bus broker and perform the hello exchange.
pub fn connect(path: impl AsRef<Path>) -> Result<BusConnection> {
    let stream = dslmngr_transport::connect(path)?;
    let reader_stream = stream.try_clone()?;

    let frame_config = FrameConfig {
        read_timeout: Some(HELLO_TIMEOUT),
        write_timeout: Some(HELLO_TIMEOUT),
        ..FrameConfig::default()
    };

    let mut reader = FrameReader::for_stream(reader_stream, frame_config.clone())?;
    let mut writer = FrameWriter::for_stream(stream, frame_config)?;

    let welcome = client_hello(&mut reader, &mut writer, CLIENT_NAME, HELLO_TIMEOUT)?;
    debug!(client_id = %welcome.client_id, version = %welcome.version, "bus hello complete");

    Ok(BusConnection {
        reader,
        writer,
        client_id: welcome.client_id,
        pending: VecDeque::new(),
        ack_timeout: HELLO_TIMEOUT,
    })
}

/// A registered bus client, before it is split for serving.
///
/// CONTROL requests block until the broker acknowledges them. Frames on
/// other channels that arrive meanwhile are kept in order and handed to the
/// [`BusReader`] by [`BusConnection::into_split`].
pub struct BusConnection {
    reader: FrameReader<BusStream>,
    writer: FrameWriter<BusStream>,
    client_id: String,
    pending: VecDeque<Frame>,
    ack_timeout: Duration,
}

impl BusConnection {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Send a CONTROL request and wait for its status acknowledgement.
    pub fn request(&mut self, message: &ControlMessage) -> Result<Status> {
        send_control_json(&mut self.writer, message)?;

        let deadline = Instant::now() + self.ack_timeout;
        loop {
            if Instant::now() >= deadline {
                return Err(BusError::Timeout(self.ack_timeout));
            }

            let frame = match self.reader.read_frame() {
                Ok(frame) => frame,
                Err(err) if err.is_timeout() => continue,
                Err(FrameError::ConnectionClosed) => {
                    return Err(BusError::Disconnected(
                        "connection closed awaiting acknowledgement".to_string(),
                    ));
                }
                Err(err) => return Err(err.into()),
            };

            if frame.channel != CONTROL {
                if self.pending.len() >= MAX_PENDING_FRAMES {
                    return Err(BusError::Protocol(format!(
                        "more than {MAX_PENDING_FRAMES} frames queued during registration"
                    )));
                }
                trace!(channel = channel_name(frame.channel), "queued frame during registration");
                self.pending.push_back(frame);
                continue;
            }

            let reply: ControlMessage = serde_json::from_slice(&frame.payload)?;
            match reply.ack_status() {
                Ok(status) => return Ok(status),
                Err(_) => debug!(msg_type = %reply.msg_type, "ignoring control message"),
            }
        }
    }

    /// Split into the inbound half for the reader thread and the outbound
    /// half for the serving loop. The reader blocks without timeout.
    pub fn into_split(mut self) -> Result<(BusReader, BusWriter)> {
        self.reader.set_read_timeout(None)?;
        Ok((
            BusReader {
                reader: self.reader,
                pending: self.pending,
            },
            BusWriter {
                writer: self.writer,
            },
        ))
    }
}

impl ObjectBus for BusConnection {
    fn add_object(&mut self, spec: &ObjectSpec) -> Result<()> {
        match self.request(&ControlMessage::add_object(spec)?)? {
            Status::Ok => Ok(()),
            status => Err(BusError::Rejected {
                object: spec.name.clone(),
                status,
            }),
        }
    }

    fn remove_object(&mut self, name: &str) -> Result<()> {
        match self.request(&ControlMessage::remove_object(name))? {
            Status::Ok => Ok(()),
            status => Err(BusError::Rejected {
                object: name.to_string(),
                status,
            }),
        }
    }
}

/// Inbound half of a split connection.
pub struct BusReader {
    reader: FrameReader<BusStream>,
    pending: VecDeque<Frame>,
}

impl BusReader {
    /// Next frame, starting with those queued during registration.
    pub fn next_frame(&mut self) -> Result<Frame> {
        if let Some(frame) = self.pending.pop_front() {
            return Ok(frame);
        }
        Ok(self.reader.read_frame()?)
    }
}

/// Outbound half of a split connection.
pub struct BusWriter {
    writer: FrameWriter<BusStream>,
}

impl BusWriter {
    pub fn send_reply(&mut self, reply: &Reply) -> Result<()> {
        let payload = serde_json::to_vec(reply)?;
        self.writer.send(REPLY, &payload)?;
        Ok(())
    }

    pub fn publish(&mut self, event: &Event) -> Result<()> {
        let payload = serde_json::to_vec(event)?;
        self.writer.send(EVENT, &payload)?;
        Ok(())
    }

    pub fn send_error(&mut self, error: impl Into<String>) -> Result<()> {
        let payload = serde_json::to_vec(&ErrorNotice {
            error: error.into(),
        })?;
        self.writer.send(ERROR, &payload)?;
        Ok(())
    }

    /// Withdraw an object without waiting for the broker; the reader
    /// thread owns the inbound side by now.
    pub fn remove_object(&mut self, name: &str) -> Result<()> {
        send_control_json(&mut self.writer, &ControlMessage::remove_object(name))
    }
}
