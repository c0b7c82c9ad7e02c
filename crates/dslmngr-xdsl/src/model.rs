//! Driver-side records.
//!
//! Enumerated fields hold the raw codes the driver reports (see
//! [`crate::mapper`] for the code tables). Records are built per query and
//! never cached.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// An `{us, ds}` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UsDs<T> {
    pub us: T,
    pub ds: T,
}

impl<T> UsDs<T> {
    pub fn new(us: T, ds: T) -> Self {
        Self { us, ds }
    }
}

/// Transmission standard, either as an XTSE capability vector or as a
/// bitmap of modulation bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Standard {
    Xtse([u8; 8]),
    Modes(u64),
}

impl Default for Standard {
    fn default() -> Self {
        Self::Modes(0)
    }
}

/// One physical DSL line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Line {
    pub status: u32,
    pub upstream: bool,
    pub firmware_version: String,
    pub link_status: u32,
    pub standard_used: Standard,
    pub current_profile: u64,
    pub power_management_state: u32,
    pub max_bit_rate: UsDs<u64>,
    pub line_encoding: u32,
    pub standard_supported: Standard,
    pub allowed_profiles: u64,
    pub success_failure_cause: u32,
    pub upbokler_pb: Vec<u64>,
    pub rxthrsh_ds: Vec<u64>,
    pub act_ra_mode: UsDs<u64>,
    pub snr_mroc_us: u64,
    pub last_state_transmitted: UsDs<u64>,
    pub us0_mask: u64,
    pub trellis: UsDs<i64>,
    pub act_snr_mode: UsDs<u64>,
    pub line_number: i64,
    pub noise_margin: UsDs<i64>,
    pub snr_mpb_us: Vec<i64>,
    pub snr_mpb_ds: Vec<i64>,
    pub attenuation: UsDs<i64>,
    pub power: UsDs<i64>,
    pub xtur_vendor: Vec<u8>,
    pub xtur_country: Vec<u8>,
    pub xtur_ansi_std: u64,
    pub xtur_ansi_rev: u64,
    pub xtuc_vendor: Vec<u8>,
    pub xtuc_country: Vec<u8>,
    pub xtuc_ansi_std: u64,
    pub xtuc_ansi_rev: u64,
}

/// One bearer channel of a line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub status: u32,
    pub link_encapsulation_used: u64,
    pub curr_rate: UsDs<u64>,
    pub actndr: UsDs<u64>,
    pub link_encapsulation_supported: u64,
    pub lpath: u64,
    pub intlvdepth: u64,
    pub intlvblock: i64,
    pub actual_interleaving_delay: u64,
    pub actinp: i64,
    pub inpreport: bool,
    pub nfec: i64,
    pub rfec: i64,
    pub lsymb: i64,
    pub actinprein: UsDs<u64>,
}

/// Seconds elapsed since the start of each accounting period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LineChannelStats {
    pub total_start: u64,
    pub showtime_start: u64,
    pub last_showtime_start: u64,
    pub current_day_start: u64,
    pub quarter_hour_start: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LineStatsInterval {
    pub errored_secs: u64,
    pub severely_errored_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChannelStatsInterval {
    pub xtur_fec_errors: u64,
    pub xtuc_fec_errors: u64,
    pub xtur_hec_errors: u64,
    pub xtuc_hec_errors: u64,
    pub xtur_crc_errors: u64,
    pub xtuc_crc_errors: u64,
}

/// Interval statistics bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsInterval {
    Total,
    Showtime,
    LastShowtime,
    CurrentDay,
    QuarterHour,
}

impl StatsInterval {
    /// Wire order of the buckets.
    pub const ALL: [StatsInterval; 5] = [
        Self::Total,
        Self::Showtime,
        Self::LastShowtime,
        Self::CurrentDay,
        Self::QuarterHour,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Showtime => "showtime",
            Self::LastShowtime => "lastshowtime",
            Self::CurrentDay => "currentday",
            Self::QuarterHour => "quarterhour",
        }
    }
}

impl fmt::Display for StatsInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized interval or window name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown statistics type '{0}'")]
pub struct UnknownStatsType(pub String);

impl FromStr for StatsInterval {
    type Err = UnknownStatsType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|interval| interval.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStatsType(s.to_string()))
    }
}

/// One value per interval bucket, keyed by wire name in documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IntervalSet<T> {
    pub total: T,
    pub showtime: T,
    pub lastshowtime: T,
    pub currentday: T,
    pub quarterhour: T,
}

impl<T> IntervalSet<T> {
    pub fn get(&self, interval: StatsInterval) -> &T {
        match interval {
            StatsInterval::Total => &self.total,
            StatsInterval::Showtime => &self.showtime,
            StatsInterval::LastShowtime => &self.lastshowtime,
            StatsInterval::CurrentDay => &self.currentday,
            StatsInterval::QuarterHour => &self.quarterhour,
        }
    }
}

/// Accounting window of the legacy performance counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerfWindow {
    CurrentLink,
    Current15Min,
    Previous15Min,
    CurrentDay,
    PreviousDay,
    Total,
}

impl PerfWindow {
    pub const ALL: [PerfWindow; 6] = [
        Self::Current15Min,
        Self::Previous15Min,
        Self::CurrentDay,
        Self::PreviousDay,
        Self::Total,
        Self::CurrentLink,
    ];

    /// Argument token selecting the window.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current15Min => "now15",
            Self::Previous15Min => "prev15",
            Self::CurrentDay => "now24",
            Self::PreviousDay => "prev24",
            Self::Total => "total",
            Self::CurrentLink => "link",
        }
    }

    /// Table name used in replies.
    pub fn label(self) -> &'static str {
        match self {
            Self::Current15Min => "current 15 mins",
            Self::Previous15Min => "previous 15 mins",
            Self::CurrentDay => "current day",
            Self::PreviousDay => "previous day",
            Self::Total => "total",
            Self::CurrentLink => "since linkup",
        }
    }
}

impl FromStr for PerfWindow {
    type Err = UnknownStatsType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|window| window.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStatsType(s.to_string()))
    }
}

/// Framing parameters and error counters of a line's bearer, as the legacy
/// link summary reports them.
///
/// `s` is the FEC-to-PMD frame ratio in units of 1/10000 once reported, `inp`
/// the impulse noise protection in units of 1/100; both are stored unscaled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Bearer {
    pub rate: UsDs<u64>,
    pub msgc: UsDs<u64>,
    pub b: UsDs<u64>,
    pub m: UsDs<u64>,
    pub t: UsDs<u64>,
    pub r: UsDs<u64>,
    pub s: UsDs<u64>,
    pub l: UsDs<u64>,
    pub d: UsDs<u64>,
    pub delay: UsDs<u64>,
    pub inp: UsDs<u64>,
    pub sf: UsDs<u64>,
    pub sf_err: UsDs<u64>,
    pub rs: UsDs<u64>,
    pub rs_corr: UsDs<u64>,
    pub rs_uncorr: UsDs<u64>,
    pub hec: UsDs<u64>,
    pub ocd: UsDs<u64>,
    pub lcd: UsDs<u64>,
    pub fec: UsDs<u64>,
    pub crc: UsDs<u64>,
}

/// Errored, severely errored and unavailable seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PerfCounters {
    pub es: UsDs<u64>,
    pub ses: UsDs<u64>,
    pub uas: UsDs<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PerfSet {
    pub link: PerfCounters,
    pub now15: PerfCounters,
    pub prev15: PerfCounters,
    pub now24: PerfCounters,
    pub prev24: PerfCounters,
    pub total: PerfCounters,
}

impl PerfSet {
    pub fn get(&self, window: PerfWindow) -> &PerfCounters {
        match window {
            PerfWindow::CurrentLink => &self.link,
            PerfWindow::Current15Min => &self.now15,
            PerfWindow::Previous15Min => &self.prev15,
            PerfWindow::CurrentDay => &self.now24,
            PerfWindow::PreviousDay => &self.prev24,
            PerfWindow::Total => &self.total,
        }
    }
}

/// Complete driver snapshot, as loaded by the file backend.
///
/// `line_stats`/`line_intervals`/`bearers` are indexed like `lines`,
/// `channel_stats`/`channel_intervals` like `channels`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DriverState {
    pub lines: Vec<Line>,
    pub channels: Vec<Channel>,
    pub line_stats: Vec<LineChannelStats>,
    pub line_intervals: Vec<IntervalSet<LineStatsInterval>>,
    pub channel_stats: Vec<LineChannelStats>,
    pub channel_intervals: Vec<IntervalSet<ChannelStatsInterval>>,
    pub bearers: Vec<Bearer>,
    pub perf: PerfSet,
}
