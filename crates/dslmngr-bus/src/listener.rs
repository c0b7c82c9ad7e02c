use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use dslmngr_frame::{Frame, FrameConfig, FrameReader, FrameWriter, CONTROL, INVOKE};
use dslmngr_transport::{BusListener, BusStream};
use serde_json::Value;

use crate::control::{ControlMessage, ObjectSpec, CONTROL_ADD_OBJECT};
use crate::error::{BusError, Result};
use crate::handshake::{broker_hello, Hello, HELLO_TIMEOUT};
use crate::message::{ErrorNotice, Event, Invoke, Reply};
use crate::status::Status;

/// Broker end of the bus protocol, for bus-side tooling and tests.
///
/// Accepts one client at a time, answers its hello and hands back a
/// [`BrokerSession`] for driving the rest of the exchange.
pub struct BrokerListener {
    socket: BusListener,
    next_client_id: AtomicU64,
}

impl BrokerListener {
    /// Bind to a Unix domain socket path.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let socket = BusListener::bind(path)?;
        Ok(Self {
            socket,
            next_client_id: AtomicU64::new(1),
        })
    }

    /// Accept the next client and complete its hello.
    pub fn accept(&self) -> Result<BrokerSession> {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let client_id = format!("client-{id}");

        let stream = self.socket.accept()?;
        let reader_stream = stream.try_clone()?;

        let frame_config = FrameConfig {
            read_timeout: Some(HELLO_TIMEOUT),
            write_timeout: Some(HELLO_TIMEOUT),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::for_stream(reader_stream, frame_config.clone())?;
        let mut writer = FrameWriter::for_stream(stream, frame_config)?;

        let hello = broker_hello(&mut reader, &mut writer, &client_id, HELLO_TIMEOUT)?;

        Ok(BrokerSession {
            client_id,
            hello,
            reader,
            writer,
        })
    }

    /// Bound socket path.
    pub fn path(&self) -> &Path {
        self.socket.path()
    }
}

/// One accepted client, seen from the broker.
pub struct BrokerSession {
    client_id: String,
    hello: Hello,
    reader: FrameReader<BusStream>,
    writer: FrameWriter<BusStream>,
}

impl BrokerSession {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn hello(&self) -> &Hello {
        &self.hello
    }

    /// Read the next frame on any channel.
    pub fn recv(&mut self) -> Result<Frame> {
        Ok(self.reader.read_frame()?)
    }

    /// Read frames until one arrives on `channel`.
    pub fn recv_on(&mut self, channel: u16) -> Result<Frame> {
        loop {
            let frame = self.recv()?;
            if frame.channel == channel {
                return Ok(frame);
            }
        }
    }

    pub fn recv_control(&mut self) -> Result<ControlMessage> {
        let frame = self.recv_on(CONTROL)?;
        Ok(serde_json::from_slice(&frame.payload)?)
    }

    /// Read the next `add_object` request and answer it with `status`.
    pub fn accept_object(&mut self, status: Status) -> Result<ObjectSpec> {
        let request = self.recv_control()?;
        if request.msg_type != CONTROL_ADD_OBJECT {
            return Err(BusError::Protocol(format!(
                "expected add_object, got '{}'",
                request.msg_type
            )));
        }
        let spec: ObjectSpec = serde_json::from_value(request.payload.unwrap_or(Value::Null))?;
        self.ack(&spec.name, status)?;
        Ok(spec)
    }

    pub fn ack(&mut self, object: &str, status: Status) -> Result<()> {
        let payload = serde_json::to_vec(&ControlMessage::status(object, status))?;
        self.writer.send(CONTROL, &payload)?;
        Ok(())
    }

    pub fn invoke(&mut self, seq: u64, object: &str, method: &str, args: Value) -> Result<()> {
        let invoke = Invoke {
            seq,
            object: object.to_string(),
            method: method.to_string(),
            args,
        };
        self.writer.send(INVOKE, &serde_json::to_vec(&invoke)?)?;
        Ok(())
    }

    /// Invoke and wait for the matching reply.
    pub fn call(&mut self, seq: u64, object: &str, method: &str, args: Value) -> Result<Reply> {
        self.invoke(seq, object, method, args)?;
        loop {
            let frame = self.recv_on(dslmngr_frame::REPLY)?;
            let reply: Reply = serde_json::from_slice(&frame.payload)?;
            if reply.seq == seq {
                return Ok(reply);
            }
        }
    }

    pub fn recv_event(&mut self) -> Result<Event> {
        let frame = self.recv_on(dslmngr_frame::EVENT)?;
        Ok(serde_json::from_slice(&frame.payload)?)
    }

    pub fn recv_error(&mut self) -> Result<ErrorNotice> {
        let frame = self.recv_on(dslmngr_frame::ERROR)?;
        Ok(serde_json::from_slice(&frame.payload)?)
    }

    /// Send raw bytes on a channel.
    pub fn send_raw(&mut self, channel: u16, payload: &[u8]) -> Result<()> {
        self.writer.send(channel, payload)?;
        Ok(())
    }
}
