//! Generic netlink bridge for xDSL driver notifications.
//!
//! The wire helpers in [`message`] and [`family`] are platform neutral; the
//! socket itself needs Linux.

pub mod bridge;
pub mod error;
pub mod family;
pub mod message;
pub mod notification;
#[cfg(target_os = "linux")]
pub mod socket;

pub use bridge::{forward_datagram, spawn_bridge, BridgeConfig};
pub use error::{NetlinkError, NotificationError, Result};
pub use family::FamilyInfo;
pub use notification::{decode_datagram, parse_notification, XDSL_NL_MSG};
#[cfg(target_os = "linux")]
pub use socket::GenlSocket;
