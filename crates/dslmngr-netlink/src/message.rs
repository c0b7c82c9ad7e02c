//! Netlink and generic netlink wire layout.
//!
//! ```text
//! nlmsghdr (16 bytes)   len u32, type u16, flags u16, seq u32, pid u32
//! genlmsghdr (4 bytes)  cmd u8, version u8, reserved u16
//! attributes            len u16, type u16, payload, padded to 4 bytes
//! ```
//!
//! All integers are in host byte order.

use std::mem::size_of;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{NetlinkError, Result};

pub const NLMSG_ALIGNTO: usize = 4;
pub const NLMSG_HDRLEN: usize = size_of::<NlMsgHdr>();
pub const GENL_HDRLEN: usize = size_of::<GenlMsgHdr>();
pub const NLA_ALIGNTO: usize = 4;
pub const NLA_HDRLEN: usize = size_of::<NlAttr>();

pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

pub const NLM_F_REQUEST: u16 = 0x01;

pub const NLMSG_NOOP: u16 = 1;
pub const NLMSG_ERROR: u16 = 2;
pub const NLMSG_DONE: u16 = 3;

/// Generic netlink controller family.
pub const GENL_ID_CTRL: u16 = 0x10;
pub const CTRL_CMD_GETFAMILY: u8 = 3;
pub const CTRL_ATTR_FAMILY_ID: u16 = 1;
pub const CTRL_ATTR_FAMILY_NAME: u16 = 2;
pub const CTRL_ATTR_MCAST_GROUPS: u16 = 7;
pub const CTRL_ATTR_MCAST_GRP_NAME: u16 = 1;
pub const CTRL_ATTR_MCAST_GRP_ID: u16 = 2;

#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Copy a header off the front of `data`; receive buffers carry no
/// alignment guarantee.
fn read_header<T: FromBytes>(data: &[u8]) -> Result<T> {
    T::read_from_prefix(data)
        .map(|(header, _)| header)
        .map_err(|_| NetlinkError::Truncated {
            expected: size_of::<T>(),
            actual: data.len(),
        })
}

/// Netlink message header (mirrors struct nlmsghdr).
#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct NlMsgHdr {
    pub len: u32,
    pub msg_type: u16,
    pub flags: u16,
    pub seq: u32,
    pub pid: u32,
}

impl NlMsgHdr {
    pub fn parse(data: &[u8]) -> Result<Self> {
        read_header(data)
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }
}

/// Generic netlink header (mirrors struct genlmsghdr).
#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct GenlMsgHdr {
    pub cmd: u8,
    pub version: u8,
    pub reserved: u16,
}

impl GenlMsgHdr {
    pub const fn new(cmd: u8, version: u8) -> Self {
        Self {
            cmd,
            version,
            reserved: 0,
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        read_header(data)
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }
}

/// Attribute header (mirrors struct nlattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    pub len: u16,
    pub kind: u16,
}

/// Iterator over the messages of one datagram, yielding the header and
/// the payload following it.
pub struct MessageIter<'a> {
    data: &'a [u8],
}

impl<'a> MessageIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = Result<(NlMsgHdr, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }

        let header = match NlMsgHdr::parse(self.data) {
            Ok(header) => header,
            Err(err) => {
                self.data = &[];
                return Some(Err(err));
            }
        };

        let len = header.len as usize;
        if len < NLMSG_HDRLEN || len > self.data.len() {
            let actual = self.data.len();
            self.data = &[];
            return Some(Err(NetlinkError::Truncated {
                expected: len.max(NLMSG_HDRLEN),
                actual,
            }));
        }

        let payload = &self.data[NLMSG_HDRLEN..len];
        let aligned = nlmsg_align(len);
        self.data = self.data.get(aligned..).unwrap_or(&[]);
        Some(Ok((header, payload)))
    }
}

/// Iterator over netlink attributes, yielding the type without flags and
/// the payload.
pub struct AttrIter<'a> {
    data: &'a [u8],
}

impl<'a> AttrIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let header: NlAttr = read_header(self.data).ok()?;
        let len = usize::from(header.len);
        let kind = header.kind & NLA_TYPE_MASK;
        if len < NLA_HDRLEN || len > self.data.len() {
            return None;
        }

        let payload = &self.data[NLA_HDRLEN..len];
        self.data = self.data.get(nla_align(len)..).unwrap_or(&[]);
        Some((kind, payload))
    }
}

/// Append a NUL-terminated string attribute, padded to alignment.
///
/// Attribute lengths are u16 on the wire, so longer strings are refused
/// and `out` is left untouched.
pub fn put_attr_str(out: &mut Vec<u8>, kind: u16, value: &str) -> Result<()> {
    let len = NLA_HDRLEN + value.len() + 1;
    let wire_len =
        u16::try_from(len).map_err(|_| NetlinkError::AttributeTooLong { kind, len })?;
    out.extend_from_slice(NlAttr { len: wire_len, kind }.as_bytes());
    out.extend_from_slice(value.as_bytes());
    out.push(0);
    out.resize(out.len() + nla_align(len) - len, 0);
    Ok(())
}

/// Attribute payload as a string, without the trailing NUL.
pub fn attr_str(payload: &[u8]) -> Option<&str> {
    let end = payload
        .iter()
        .position(|&byte| byte == 0)
        .unwrap_or(payload.len());
    std::str::from_utf8(&payload[..end]).ok()
}

pub fn attr_u16(payload: &[u8]) -> Option<u16> {
    Some(u16::from_ne_bytes(payload.get(..2)?.try_into().ok()?))
}

pub fn attr_u32(payload: &[u8]) -> Option<u32> {
    Some(u32::from_ne_bytes(payload.get(..4)?.try_into().ok()?))
}

/// Build a complete generic netlink request.
pub fn genl_request(family: u16, cmd: u8, seq: u32, attrs: &[u8]) -> Vec<u8> {
    let len = NLMSG_HDRLEN + GENL_HDRLEN + attrs.len();
    let mut out = Vec::with_capacity(len);
    NlMsgHdr {
        len: len as u32,
        msg_type: family,
        flags: NLM_F_REQUEST,
        seq,
        pid: 0,
    }
    .write(&mut out);
    GenlMsgHdr::new(cmd, 1).write(&mut out);
    out.extend_from_slice(attrs);
    out
}

/// Errno carried by an `NLMSG_ERROR` payload; zero is an acknowledgement.
pub fn error_code(payload: &[u8]) -> Result<i32> {
    let bytes: [u8; 4] = payload
        .get(..4)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(NetlinkError::Truncated {
            expected: 4,
            actual: payload.len(),
        })?;
    Ok(i32::from_ne_bytes(bytes))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// One generic netlink message with the given attributes.
    pub(crate) fn genl_message(family: u16, cmd: u8, attrs: &[u8]) -> Vec<u8> {
        genl_request(family, cmd, 0, attrs)
    }

    pub(crate) fn put_attr(out: &mut Vec<u8>, kind: u16, payload: &[u8]) {
        let len = NLA_HDRLEN + payload.len();
        out.extend_from_slice(
            NlAttr {
                len: len as u16,
                kind,
            }
            .as_bytes(),
        );
        out.extend_from_slice(payload);
        out.resize(out.len() + nla_align(len) - len, 0);
    }

    #[test]
    fn header_sizes() {
        let mut out = Vec::new();
        NlMsgHdr::default().write(&mut out);
        assert_eq!(out.len(), NLMSG_HDRLEN);
        GenlMsgHdr::default().write(&mut out);
        assert_eq!(out.len(), NLMSG_HDRLEN + GENL_HDRLEN);
    }

    #[test]
    fn string_attribute_is_nul_terminated_and_padded() {
        let mut out = Vec::new();
        put_attr_str(&mut out, CTRL_ATTR_FAMILY_NAME, "easysoc").unwrap();
        // 4 header + 7 name + 1 NUL = 12, already aligned.
        assert_eq!(out.len(), 12);
        assert_eq!(u16::from_ne_bytes([out[0], out[1]]), 12);

        let mut out = Vec::new();
        put_attr_str(&mut out, CTRL_ATTR_FAMILY_NAME, "nl").unwrap();
        assert_eq!(out.len(), 8);
        assert_eq!(u16::from_ne_bytes([out[0], out[1]]), 7);

        let (kind, payload) = AttrIter::new(&out).next().unwrap();
        assert_eq!(kind, CTRL_ATTR_FAMILY_NAME);
        assert_eq!(attr_str(payload), Some("nl"));
    }

    #[test]
    fn oversized_string_attribute_is_refused() {
        let mut out = vec![0xaa];
        let name = "x".repeat(usize::from(u16::MAX));
        assert!(matches!(
            put_attr_str(&mut out, CTRL_ATTR_FAMILY_NAME, &name),
            Err(NetlinkError::AttributeTooLong { kind: CTRL_ATTR_FAMILY_NAME, .. })
        ));
        assert_eq!(out, [0xaa]);

        // Largest string whose attribute length still fits.
        let name = "x".repeat(usize::from(u16::MAX) - NLA_HDRLEN - 1);
        put_attr_str(&mut out, CTRL_ATTR_FAMILY_NAME, &name).unwrap();
        let (_, payload) = AttrIter::new(&out[1..]).next().unwrap();
        assert_eq!(attr_str(payload).map(str::len), Some(name.len()));
    }

    #[test]
    fn headers_parse_from_unaligned_buffers() {
        let request = genl_request(GENL_ID_CTRL, CTRL_CMD_GETFAMILY, 5, &[]);
        let mut shifted = vec![0u8];
        shifted.extend_from_slice(&request);

        let header = NlMsgHdr::parse(&shifted[1..]).unwrap();
        assert_eq!(header.seq, 5);
        assert_eq!(header.msg_type, GENL_ID_CTRL);
        let genl = GenlMsgHdr::parse(&shifted[1 + NLMSG_HDRLEN..]).unwrap();
        assert_eq!(genl, GenlMsgHdr::new(CTRL_CMD_GETFAMILY, 1));
    }

    #[test]
    fn attribute_iteration_masks_flags_and_stops_on_garbage() {
        let mut out = Vec::new();
        put_attr(&mut out, 1 | NLA_F_NESTED, &[1, 2, 3]);
        put_attr(&mut out, 2, &7u32.to_ne_bytes());
        out.extend_from_slice(&[0xff, 0xff, 0, 0]);

        let attrs: Vec<(u16, &[u8])> = AttrIter::new(&out).collect();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0], (1, &[1u8, 2, 3][..]));
        assert_eq!(attr_u32(attrs[1].1), Some(7));
    }

    #[test]
    fn request_layout() {
        let mut attrs = Vec::new();
        put_attr_str(&mut attrs, CTRL_ATTR_FAMILY_NAME, "easysoc").unwrap();
        let request = genl_request(GENL_ID_CTRL, CTRL_CMD_GETFAMILY, 9, &attrs);

        let header = NlMsgHdr::parse(&request).unwrap();
        assert_eq!(header.len as usize, request.len());
        assert_eq!(header.msg_type, GENL_ID_CTRL);
        assert_eq!(header.flags, NLM_F_REQUEST);
        assert_eq!(header.seq, 9);
        let genl = GenlMsgHdr::parse(&request[NLMSG_HDRLEN..]).unwrap();
        assert_eq!(genl.cmd, CTRL_CMD_GETFAMILY);
    }

    #[test]
    fn message_iteration_splits_datagram() {
        let mut datagram = genl_message(0x20, 1, &[]);
        let mut second = Vec::new();
        put_attr_str(&mut second, 1, "x").unwrap();
        datagram.extend_from_slice(&genl_message(0x21, 1, &second));

        let messages: Vec<_> = MessageIter::new(&datagram)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].0.msg_type, 0x20);
        assert_eq!(messages[1].0.msg_type, 0x21);
        assert_eq!(messages[1].1.len(), GENL_HDRLEN + 8);
    }

    #[test]
    fn truncated_message_is_an_error() {
        let mut datagram = genl_message(0x20, 1, &[]);
        datagram[0] = 200;
        let mut messages = MessageIter::new(&datagram);
        assert!(matches!(
            messages.next(),
            Some(Err(NetlinkError::Truncated { .. }))
        ));
        assert!(messages.next().is_none());

        assert!(NlMsgHdr::parse(&[0; 8]).is_err());
    }

    #[test]
    fn error_payload_code() {
        assert_eq!(error_code(&(-2i32).to_ne_bytes()).unwrap(), -2);
        assert!(error_code(&[0, 0]).is_err());
    }
}
