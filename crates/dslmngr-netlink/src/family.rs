//! Generic netlink family and multicast group resolution.

use std::collections::HashMap;

use crate::error::{NetlinkError, Result};
use crate::message::{
    attr_str, attr_u16, attr_u32, error_code, put_attr_str, AttrIter, MessageIter, GENL_HDRLEN,
    CTRL_ATTR_FAMILY_ID, CTRL_ATTR_FAMILY_NAME, CTRL_ATTR_MCAST_GROUPS, CTRL_ATTR_MCAST_GRP_ID,
    CTRL_ATTR_MCAST_GRP_NAME, CTRL_CMD_GETFAMILY, GENL_ID_CTRL, NLMSG_DONE, NLMSG_ERROR,
    NLMSG_NOOP,
};

/// What the controller reports about a family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyInfo {
    pub id: u16,
    pub mcast_groups: HashMap<String, u32>,
}

impl FamilyInfo {
    pub fn group(&self, family: &str, group: &str) -> Result<u32> {
        self.mcast_groups
            .get(group)
            .copied()
            .ok_or_else(|| NetlinkError::GroupNotFound {
                family: family.to_string(),
                group: group.to_string(),
            })
    }
}

/// `CTRL_CMD_GETFAMILY` request for `name`.
pub fn family_request(name: &str, seq: u32) -> Result<Vec<u8>> {
    let mut attrs = Vec::new();
    put_attr_str(&mut attrs, CTRL_ATTR_FAMILY_NAME, name)?;
    Ok(crate::message::genl_request(
        GENL_ID_CTRL,
        CTRL_CMD_GETFAMILY,
        seq,
        &attrs,
    ))
}

/// Parse the controller's answer to [`family_request`].
///
/// `ENOENT` from the kernel means the family is not registered.
pub fn parse_family_response(datagram: &[u8], name: &str) -> Result<FamilyInfo> {
    for message in MessageIter::new(datagram) {
        let (header, payload) = message?;
        match header.msg_type {
            NLMSG_ERROR => {
                let code = error_code(payload)?;
                if code == -libc::ENOENT {
                    return Err(NetlinkError::FamilyNotFound(name.to_string()));
                }
                if code != 0 {
                    return Err(NetlinkError::Kernel(code));
                }
            }
            NLMSG_NOOP | NLMSG_DONE => {}
            GENL_ID_CTRL => {
                let attrs = payload.get(GENL_HDRLEN..).ok_or(NetlinkError::Truncated {
                    expected: GENL_HDRLEN,
                    actual: payload.len(),
                })?;
                return parse_family_attrs(attrs, name);
            }
            _ => {}
        }
    }
    Err(NetlinkError::FamilyNotFound(name.to_string()))
}

fn parse_family_attrs(attrs: &[u8], name: &str) -> Result<FamilyInfo> {
    let mut info = FamilyInfo::default();
    let mut have_id = false;

    for (kind, payload) in AttrIter::new(attrs) {
        match kind {
            CTRL_ATTR_FAMILY_ID => {
                if let Some(id) = attr_u16(payload) {
                    info.id = id;
                    have_id = true;
                }
            }
            CTRL_ATTR_MCAST_GROUPS => {
                for (_, group) in AttrIter::new(payload) {
                    let mut group_name = None;
                    let mut group_id = None;
                    for (kind, value) in AttrIter::new(group) {
                        match kind {
                            CTRL_ATTR_MCAST_GRP_NAME => group_name = attr_str(value),
                            CTRL_ATTR_MCAST_GRP_ID => group_id = attr_u32(value),
                            _ => {}
                        }
                    }
                    if let (Some(group_name), Some(group_id)) = (group_name, group_id) {
                        info.mcast_groups.insert(group_name.to_string(), group_id);
                    }
                }
            }
            _ => {}
        }
    }

    if !have_id {
        return Err(NetlinkError::FamilyNotFound(name.to_string()));
    }
    Ok(info)
}
