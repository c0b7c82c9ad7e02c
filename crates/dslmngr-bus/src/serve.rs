//! The single serving loop.
//!
//! Everything that needs the outbound side of the connection goes through
//! one `mpsc` channel: invocations from the bus reader thread, events from
//! any publisher, and the shutdown request. The loop handles one input at a
//! time, so handlers never run concurrently.

use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use dslmngr_frame::{channel_name, FrameError, CONTROL, ERROR, INVOKE};
use tracing::{debug, error, info, warn};

use crate::connection::{BusReader, BusWriter};
use crate::error::BusError;
use crate::message::{ErrorNotice, Event, Invoke};
use crate::registry::ObjectSet;

/// Input of the serving loop.
#[derive(Debug)]
pub enum LoopInput {
    Invoke(Invoke),
    Event(Event),
    /// An inbound frame that could not be decoded; reported back on the
    /// ERROR channel.
    Rejected(String),
    /// Unregister and stop.
    Shutdown,
    /// The broker hung up or the reader failed.
    BusClosed,
}

impl From<Event> for LoopInput {
    fn from(event: Event) -> Self {
        Self::Event(event)
    }
}

/// How the serving loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeOutcome {
    Shutdown,
    BusClosed,
}

/// Forward inbound INVOKE frames into the loop until the bus closes or the
/// loop goes away.
pub fn spawn_reader(
    mut reader: BusReader,
    inputs: Sender<LoopInput>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("bus-reader".to_string())
        .spawn(move || loop {
            let frame = match reader.next_frame() {
                Ok(frame) => frame,
                Err(BusError::Frame(err)) if err.is_timeout() => continue,
                Err(err) => {
                    match err {
                        BusError::Frame(FrameError::ConnectionClosed) => {
                            info!("bus closed the connection")
                        }
                        other => error!(error = %other, "bus read failed"),
                    }
                    let _ = inputs.send(LoopInput::BusClosed);
                    return;
                }
            };

            match frame.channel {
                INVOKE => match serde_json::from_slice::<Invoke>(&frame.payload) {
                    Ok(invoke) => {
                        if inputs.send(LoopInput::Invoke(invoke)).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "dropping malformed invoke");
                        if inputs
                            .send(LoopInput::Rejected(format!("malformed invoke: {err}")))
                            .is_err()
                        {
                            return;
                        }
                    }
                },
                ERROR => match serde_json::from_slice::<ErrorNotice>(&frame.payload) {
                    Ok(notice) => warn!(error = %notice.error, "bus reported an error"),
                    Err(_) => warn!("bus reported an unreadable error"),
                },
                CONTROL => debug!("ignoring control frame while serving"),
                other => debug!(channel = channel_name(other), "ignoring frame"),
            }
        })
}

/// Owns the outbound connection and the object set for the serving phase.
pub struct ServingLoop {
    writer: BusWriter,
    objects: ObjectSet,
    inputs: Receiver<LoopInput>,
}

impl ServingLoop {
    pub fn new(writer: BusWriter, objects: ObjectSet, inputs: Receiver<LoopInput>) -> Self {
        Self {
            writer,
            objects,
            inputs,
        }
    }

    pub fn objects(&self) -> &ObjectSet {
        &self.objects
    }

    /// Serve until shutdown or until the bus goes away.
    pub fn run(mut self) -> ServeOutcome {
        info!(objects = self.objects.len(), "serving");
        loop {
            let Ok(input) = self.inputs.recv() else {
                warn!("all loop inputs closed");
                return ServeOutcome::BusClosed;
            };

            match input {
                LoopInput::Invoke(invoke) => {
                    let reply = self.objects.dispatch(&invoke);
                    debug!(
                        seq = invoke.seq,
                        object = %invoke.object,
                        method = %invoke.method,
                        status = %reply.status,
                        "invoke handled"
                    );
                    if let Err(err) = self.writer.send_reply(&reply) {
                        error!(error = %err, "failed to send reply");
                        return ServeOutcome::BusClosed;
                    }
                }
                LoopInput::Event(event) => {
                    debug!(event = %event.event, "publishing event");
                    if let Err(err) = self.writer.publish(&event) {
                        error!(error = %err, "failed to publish event");
                        return ServeOutcome::BusClosed;
                    }
                }
                LoopInput::Rejected(reason) => {
                    if let Err(err) = self.writer.send_error(reason) {
                        error!(error = %err, "failed to report rejected frame");
                        return ServeOutcome::BusClosed;
                    }
                }
                LoopInput::Shutdown => {
                    info!("shutting down");
                    self.withdraw();
                    return ServeOutcome::Shutdown;
                }
                LoopInput::BusClosed => return ServeOutcome::BusClosed,
            }
        }
    }

    /// Best-effort removal of every object, newest first.
    fn withdraw(&mut self) {
        let names: Vec<String> = self.objects.names().rev().map(str::to_string).collect();
        for name in names {
            if let Err(err) = self.writer.remove_object(&name) {
                warn!(object = %name, error = %err, "failed to remove object");
                return;
            }
        }
    }
}
