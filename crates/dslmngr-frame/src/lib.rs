//! Length-prefixed framing for the bus wire.
//!
//! Every message is framed with:
//! - A 2-byte magic number ("DB") for stream synchronization
//! - A 4-byte little-endian payload length
//! - A 2-byte little-endian channel ID
//!
//! The channel tells the bus layer how to interpret the JSON payload.

pub mod channel;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use channel::{channel_name, CONTROL, ERROR, EVENT, INVOKE, REPLY};
pub use codec::{decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
