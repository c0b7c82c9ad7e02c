//! Driver code to wire token tables.
//!
//! Plain enumerations use codes starting at 1, so an all-zero record maps
//! to `"unknown"`. Bitmask tables list single-bit values in ascending order;
//! iteration and first-match rely on that order.

use crate::model::Standard;

/// Token reported for any value a table does not define.
pub const UNKNOWN: &str = "unknown";

/// A fixed value to token table.
#[derive(Debug, Clone, Copy)]
pub struct Table {
    entries: &'static [(u64, &'static str)],
}

impl Table {
    const fn new(entries: &'static [(u64, &'static str)]) -> Self {
        Self { entries }
    }

    /// Token for an exact value, or [`UNKNOWN`].
    pub fn token(&self, value: u64) -> &'static str {
        self.entries
            .iter()
            .find(|(code, _)| *code == value)
            .map_or(UNKNOWN, |(_, token)| *token)
    }

    /// Tokens of every set bit of `mask`, in ascending bit order.
    pub fn tokens(&self, mask: u64) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(bit, _)| mask & bit != 0)
            .map(|(_, token)| *token)
            .collect()
    }

    /// Token of the lowest set bit of `mask` that the table defines.
    pub fn first(&self, mask: u64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(bit, _)| mask & bit != 0)
            .map(|(_, token)| *token)
    }

    /// Value for a token, the reverse lookup used by config parsing.
    pub fn value(&self, token: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(_, name)| *name == token)
            .map(|(value, _)| *value)
    }

    pub fn entries(&self) -> &'static [(u64, &'static str)] {
        self.entries
    }
}

pub const IF_STATUS: Table = Table::new(&[
    (1, "up"),
    (2, "down"),
    (4, "dormant"),
    (5, "not_present"),
    (6, "lower_layer_down"),
    (7, "error"),
]);

pub const LINK_STATUS: Table = Table::new(&[
    (1, "up"),
    (2, "initializing"),
    (3, "establishing"),
    (4, "no_signal"),
    (5, "disabled"),
    (6, "error"),
]);

pub const MODULATION: Table = Table::new(&[
    (1 << 0, "gdmt_annexa"),
    (1 << 1, "gdmt_annexb"),
    (1 << 2, "gdmt_annexc"),
    (1 << 3, "t1413"),
    (1 << 4, "t1413_i2"),
    (1 << 5, "etsi_101_388"),
    (1 << 6, "glite"),
    (1 << 7, "adsl2_annexa"),
    (1 << 8, "adsl2_annexb"),
    (1 << 9, "adsl2_annexc"),
    (1 << 10, "adsl2_annexi"),
    (1 << 11, "adsl2_annexj"),
    (1 << 12, "adsl2_annexl"),
    (1 << 13, "adsl2_annexm"),
    (1 << 14, "splitterless_adsl2"),
    (1 << 15, "adsl2p_annexa"),
    (1 << 16, "adsl2p_annexb"),
    (1 << 17, "adsl2p_annexc"),
    (1 << 18, "adsl2p_annexi"),
    (1 << 19, "adsl2p_annexj"),
    (1 << 20, "adsl2p_annexm"),
    (1 << 21, "vdsl"),
    (1 << 22, "vdsl_annexa"),
    (1 << 23, "vdsl2_annexa"),
    (1 << 24, "vdsl2_annexb"),
    (1 << 25, "vdsl2_annexc"),
]);

pub const LINE_ENCODING: Table = Table::new(&[
    (1, "dmt"),
    (2, "cap"),
    (3, "2b1q"),
    (4, "43bt"),
    (5, "pam"),
    (6, "qam"),
]);

pub const PROFILE: Table = Table::new(&[
    (1 << 0, "8a"),
    (1 << 1, "8b"),
    (1 << 2, "8c"),
    (1 << 3, "8d"),
    (1 << 4, "12a"),
    (1 << 5, "12b"),
    (1 << 6, "17a"),
    (1 << 7, "30a"),
    (1 << 8, "35b"),
]);

pub const POWER_STATE: Table = Table::new(&[
    (1, "l0"),
    (2, "l1"),
    (3, "l2"),
    (4, "l3"),
    (5, "l4"),
]);

pub const ENCAPSULATION: Table = Table::new(&[
    (1 << 0, "adsl2_atm"),
    (1 << 1, "adsl2_ptm"),
    (1 << 2, "vdsl2_atm"),
    (1 << 3, "vdsl2_ptm"),
    (1 << 4, "auto"),
]);

/// Lowercase hex of each XTSE octet.
pub fn xtse_tokens(xtse: &[u8; 8]) -> Vec<String> {
    xtse.iter().map(|octet| format!("{octet:02x}")).collect()
}

/// Uppercase hex of an identifier, no separator.
pub fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02X}")).collect()
}

/// Legacy mode name of the standard in use.
pub fn legacy_mode(standard: &Standard) -> &'static str {
    let Standard::Modes(mask) = standard else {
        return "UNDEFINED";
    };
    match (0u32..26).find(|bit| mask & (1u64 << bit) != 0) {
        Some(0..=2) => "GDMT",
        Some(3..=5) => "T1413",
        Some(6) => "GLITE",
        Some(12) => "READSL2",
        Some(7..=14) => "ADSL2",
        Some(15..=20) => "ADSL2P",
        Some(21 | 22) => "VDSL",
        Some(23..=25) => "VDSL2",
        _ => "UNDEFINED",
    }
}

/// Legacy training state name for a link status code.
pub fn legacy_line_state(link_status: u32) -> &'static str {
    match LINK_STATUS.token(u64::from(link_status)) {
        "up" => "SHOWTIME",
        "initializing" => "HANDSHAKING",
        "establishing" => "TRAINING",
        "no_signal" | "disabled" | "error" => "DOWN",
        _ => "Unknown",
    }
}

/// Legacy power state name (`L0`..`L3`).
pub fn legacy_power_state(power_state: u32) -> &'static str {
    match POWER_STATE.token(u64::from(power_state)) {
        "l0" => "L0",
        "l1" => "L1",
        "l2" => "L2",
        "l3" => "L3",
        _ => "Unknown",
    }
}

/// Legacy traffic class of a channel.
pub fn legacy_traffic(line_up: bool, encapsulation: u64) -> &'static str {
    if !line_up {
        return "NOT_CONNECTED";
    }
    match ENCAPSULATION.token(encapsulation) {
        "adsl2_atm" | "vdsl2_atm" => "ATM",
        "adsl2_ptm" | "vdsl2_ptm" => "PTM",
        _ => "RAW",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const ALL_TABLES: [(&str, Table); 7] = [
        ("if_status", IF_STATUS),
        ("link_status", LINK_STATUS),
        ("modulation", MODULATION),
        ("line_encoding", LINE_ENCODING),
        ("profile", PROFILE),
        ("power_state", POWER_STATE),
        ("encapsulation", ENCAPSULATION),
    ];

    #[test]
    fn defined_values_map_to_unique_tokens() {
        for (name, table) in ALL_TABLES {
            let tokens: HashSet<&str> = table.entries().iter().map(|(_, t)| *t).collect();
            assert_eq!(tokens.len(), table.entries().len(), "{name} has duplicates");
            for (value, token) in table.entries() {
                assert_eq!(table.token(*value), *token, "{name} value {value}");
            }
        }
    }

    #[test]
    fn defined_values_are_never_unknown() {
        for (name, table) in ALL_TABLES {
            for (value, token) in table.entries() {
                assert_ne!(*token, UNKNOWN, "{name} value {value}");
            }
        }
    }

    #[test]
    fn undefined_values_map_to_unknown() {
        for (name, table) in ALL_TABLES {
            let defined: HashSet<u64> = table.entries().iter().map(|(v, _)| *v).collect();
            let probes = [0u64, 3 << 4, 1 << 26, 1 << 40, u64::MAX]
                .into_iter()
                .chain((0..64).map(|bit| 1u64 << bit))
                .chain(0..64);
            for probe in probes.filter(|p| !defined.contains(p)) {
                assert_eq!(table.token(probe), UNKNOWN, "{name} value {probe}");
            }
        }
    }

    #[test]
    fn bitmask_tables_are_ascending_single_bits() {
        for table in [MODULATION, PROFILE, ENCAPSULATION] {
            let values: Vec<u64> = table.entries().iter().map(|(v, _)| *v).collect();
            assert!(values.iter().all(|v| v.count_ones() == 1));
            assert!(values.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn iteration_follows_ascending_bit_order() {
        let mask = (1 << 8) | (1 << 0) | (1 << 6) | (1 << 3);
        assert_eq!(PROFILE.tokens(mask), ["8a", "8d", "17a", "35b"]);

        let all: u64 = (1 << 26) - 1;
        let tokens = MODULATION.tokens(all);
        assert_eq!(tokens.len(), 26);
        assert_eq!(tokens.first(), Some(&"gdmt_annexa"));
        assert_eq!(tokens.last(), Some(&"vdsl2_annexc"));

        assert!(ENCAPSULATION.tokens(0).is_empty());
        assert_eq!(ENCAPSULATION.tokens(u64::MAX).len(), 5);
    }

    #[test]
    fn first_match_is_lowest_bit() {
        assert_eq!(MODULATION.first((1 << 24) | (1 << 23)), Some("vdsl2_annexa"));
        assert_eq!(MODULATION.first(1 << 30), None);
        assert_eq!(PROFILE.first(0), None);
    }

    #[test]
    fn profile_8d_has_its_own_token() {
        assert_eq!(PROFILE.token(1 << 3), "8d");
        assert_eq!(PROFILE.value("8b"), Some(1 << 1));
    }

    #[test]
    fn hex_identifiers() {
        assert_eq!(hex_upper(&[0xAB, 0xCD]), "ABCD");
        assert_eq!(hex_upper(&[0x0a, 0x00]), "0A00");
        assert_eq!(hex_upper(&[]), "");
        assert_eq!(xtse_tokens(&[0, 0x0a, 0, 0, 0, 0, 0, 0xff])[1], "0a");
        assert_eq!(xtse_tokens(&[0, 0x0a, 0, 0, 0, 0, 0, 0xff])[7], "ff");
    }

    #[test]
    fn legacy_names() {
        assert_eq!(legacy_mode(&Standard::Modes(1 << 23)), "VDSL2");
        assert_eq!(legacy_mode(&Standard::Modes(1 << 12)), "READSL2");
        assert_eq!(legacy_mode(&Standard::Modes(1 << 16)), "ADSL2P");
        assert_eq!(legacy_mode(&Standard::Modes(0)), "UNDEFINED");
        assert_eq!(legacy_mode(&Standard::Xtse([0; 8])), "UNDEFINED");

        assert_eq!(legacy_line_state(1), "SHOWTIME");
        assert_eq!(legacy_line_state(99), "Unknown");
        assert_eq!(legacy_power_state(1), "L0");
        assert_eq!(legacy_power_state(5), "Unknown");
        assert_eq!(legacy_traffic(true, 1 << 3), "PTM");
        assert_eq!(legacy_traffic(false, 1 << 3), "NOT_CONNECTED");
        assert_eq!(legacy_traffic(true, 1 << 4), "RAW");
    }
}
