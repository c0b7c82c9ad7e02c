//! Kernel notifications forwarded into the serving loop.
//!
//! The bridge resolves the driver's generic netlink family, joins its
//! notification group and then turns every received message into an
//! [`Event`]. A missing family or group disables the bridge; the daemon
//! keeps serving requests without events.

use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use dslmngr_bus::Event;
use tracing::{debug, warn};

use crate::notification::decode_datagram;

/// Family and multicast group the driver notifies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub family: String,
    pub group: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            family: "easysoc".to_string(),
            group: "notify".to_string(),
        }
    }
}

/// Forward the events of one datagram. Returns `false` once the receiving
/// side is gone.
pub fn forward_datagram<T: From<Event>>(
    datagram: &[u8],
    family_id: u16,
    events: &Sender<T>,
) -> bool {
    for decoded in decode_datagram(datagram, family_id) {
        match decoded {
            Ok(event) => {
                debug!(event = %event.event, "kernel notification");
                if events.send(T::from(event)).is_err() {
                    return false;
                }
            }
            Err(err) => warn!(error = %err, "dropping kernel notification"),
        }
    }
    true
}

/// Start the bridge thread.
///
/// Failures to reach the family are logged from inside the thread, which
/// then exits.
pub fn spawn_bridge<T>(config: BridgeConfig, events: Sender<T>) -> std::io::Result<JoinHandle<()>>
where
    T: From<Event> + Send + 'static,
{
    thread::Builder::new()
        .name("netlink-bridge".to_string())
        .spawn(move || run(&config, &events))
}

#[cfg(target_os = "linux")]
fn run<T: From<Event>>(config: &BridgeConfig, events: &Sender<T>) {
    use tracing::info;

    use crate::error::Result;
    use crate::socket::GenlSocket;

    fn subscribe(config: &BridgeConfig) -> Result<(GenlSocket, u16)> {
        let mut socket = GenlSocket::new()?;
        let family = socket.resolve_family(&config.family)?;
        let group = family.group(&config.family, &config.group)?;
        socket.add_membership(group)?;
        Ok((socket, family.id))
    }

    let (mut socket, family_id) = match subscribe(config) {
        Ok(subscribed) => subscribed,
        Err(err) => {
            warn!(
                family = %config.family,
                group = %config.group,
                error = %err,
                "kernel notifications disabled"
            );
            return;
        }
    };
    info!(family = %config.family, group = %config.group, family_id, "listening for kernel notifications");

    loop {
        let datagram = match socket.recv() {
            Ok(datagram) => datagram,
            Err(err) => {
                warn!(error = %err, "netlink receive failed");
                continue;
            }
        };
        if !forward_datagram(datagram, family_id, events) {
            debug!("serving loop gone, stopping bridge");
            return;
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn run<T: From<Event>>(config: &BridgeConfig, _events: &Sender<T>) {
    warn!(
        family = %config.family,
        error = %crate::error::NetlinkError::Unsupported,
        "kernel notifications disabled"
    );
}
