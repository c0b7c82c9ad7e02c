use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: magic (2) + length (4) + channel (2) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Magic bytes: "DB" (0x44 0x42).
pub const MAGIC: [u8; 2] = [0x44, 0x42];

/// Default maximum payload size: 1 MiB. Status replies are a few KiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024 * 1024;

/// One framed bus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub channel: u16,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(channel: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            channel,
            payload: payload.into(),
        }
    }
}

/// Append one frame to `dst`.
///
/// ```text
/// ┌──────────────┬───────────┬──────────┬─────────────────┐
/// │ Magic (2B)   │ Length    │ Channel  │ Payload         │
/// │ 0x44 0x42    │ (4B LE)   │ (2B LE)  │ (Length bytes)  │
/// └──────────────┴───────────┴──────────┴─────────────────┘
/// ```
pub fn encode_frame(channel: u16, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(len);
    dst.put_u16_le(channel);
    dst.put_slice(payload);
    Ok(())
}

/// Take one complete frame off the front of `src`.
///
/// Returns `Ok(None)` until the buffer holds a whole frame.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }
    if src[0..2] != MAGIC {
        return Err(FrameError::InvalidMagic);
    }

    let payload_len = u32::from_le_bytes([src[2], src[3], src[4], src[5]]) as usize;
    let channel = u16::from_le_bytes([src[6], src[7]]);

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }
    if src.len() < HEADER_SIZE + payload_len {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();
    Ok(Some(Frame { channel, payload }))
}

/// Limits and timeouts for blocking frame I/O.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    pub max_payload_size: usize,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let mut buf = BytesMut::new();
        encode_frame(3, br#"{"event":"x"}"#, &mut buf).unwrap();

        assert_eq!(&buf[0..2], b"DB");
        assert_eq!(u32::from_le_bytes([buf[2], buf[3], buf[4], buf[5]]), 13);
        assert_eq!(u16::from_le_bytes([buf[6], buf[7]]), 3);
        assert_eq!(buf.len(), HEADER_SIZE + 13);
    }

    #[test]
    fn test_decode_waits_for_header() {
        let mut buf = BytesMut::from(&MAGIC[..]);
        assert!(decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().is_none());
        assert_eq!(buf.len(), 2, "partial header must stay buffered");
    }

    #[test]
    fn test_decode_waits_for_payload() {
        let mut buf = BytesMut::new();
        encode_frame(1, b"status", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 3);

        assert!(decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().is_none());
    }

    #[test]
    fn test_decode_invalid_magic() {
        let mut buf = BytesMut::from(&[0x49, 0x50, 0, 0, 0, 0, 0, 0][..]);
        assert!(matches!(
            decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD),
            Err(FrameError::InvalidMagic)
        ));
    }

    #[test]
    fn test_decode_payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u32_le(8 * 1024 * 1024);
        buf.put_u16_le(2);

        assert!(matches!(
            decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD),
            Err(FrameError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut buf = BytesMut::new();
        encode_frame(1, b"invoke", &mut buf).unwrap();
        encode_frame(2, b"", &mut buf).unwrap();

        let first = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        let second = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();

        assert_eq!(first, Frame::new(1, &b"invoke"[..]));
        assert_eq!(second.channel, 2);
        assert!(second.payload.is_empty());
        assert!(buf.is_empty());
    }
}
