use std::sync::atomic::{AtomicU32, Ordering};

use bytes::BytesMut;
use netlink_sys::{protocols, Socket, SocketAddr};
use tracing::debug;

use crate::error::Result;
use crate::family::{family_request, parse_family_response, FamilyInfo};

const RECV_BUFFER_SIZE: usize = 32 * 1024;

/// Blocking generic netlink socket.
pub struct GenlSocket {
    socket: Socket,
    seq: AtomicU32,
    buf: BytesMut,
}

impl GenlSocket {
    pub fn new() -> Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_GENERIC)?;
        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr)?;
        socket.get_address(&mut addr)?;
        debug!(port = addr.port_number(), "generic netlink socket bound");

        Ok(Self {
            socket,
            seq: AtomicU32::new(1),
            buf: BytesMut::with_capacity(RECV_BUFFER_SIZE),
        })
    }

    fn next_seq(&self) -> u32 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Ask the controller for a family's id and multicast groups.
    pub fn resolve_family(&mut self, name: &str) -> Result<FamilyInfo> {
        let request = family_request(name, self.next_seq())?;
        self.socket.send(&request, 0)?;
        let reply = self.recv()?;
        parse_family_response(reply, name)
    }

    pub fn add_membership(&mut self, group: u32) -> Result<()> {
        self.socket.add_membership(group)?;
        Ok(())
    }

    /// Block for the next datagram.
    pub fn recv(&mut self) -> Result<&[u8]> {
        self.buf.clear();
        self.buf.reserve(RECV_BUFFER_SIZE);
        self.socket.recv(&mut self.buf, 0)?;
        Ok(&self.buf[..])
    }
}
