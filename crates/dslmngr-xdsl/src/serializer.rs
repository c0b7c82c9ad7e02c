//! Reply tables for lines, channels and their statistics.
//!
//! Every documented key is always present. Absent strings serialize as
//! `""`, absent numbers as `0` and empty sequences as `[]`. Keys are
//! inserted in wire order.

use serde_json::{Map, Value};

use crate::mapper::{self, ENCAPSULATION, IF_STATUS, LINE_ENCODING, LINK_STATUS, MODULATION};
use crate::mapper::{POWER_STATE, PROFILE};
use crate::model::{
    Bearer, Channel, ChannelStatsInterval, Line, LineChannelStats, LineStatsInterval, PerfCounters,
    PerfWindow, Standard, StatsInterval, UsDs,
};

/// Longest sequence the wire format carries.
pub const MAX_SEQUENCE: usize = 24;

pub type Table = Map<String, Value>;

fn usds<T: Into<Value> + Copy>(pair: &UsDs<T>) -> Value {
    let mut table = Table::new();
    table.insert("us".into(), pair.us.into());
    table.insert("ds".into(), pair.ds.into());
    Value::Object(table)
}

fn sequence<T: Into<Value> + Copy>(items: &[T]) -> Value {
    Value::Array(
        items
            .iter()
            .take(MAX_SEQUENCE)
            .map(|item| (*item).into())
            .collect(),
    )
}

fn tokens(list: Vec<&'static str>) -> Value {
    Value::Array(list.into_iter().map(Value::from).collect())
}

/// Line status table.
pub fn line_status(line: &Line) -> Table {
    let mut t = Table::new();
    t.insert("status".into(), IF_STATUS.token(line.status.into()).into());
    t.insert("upstream".into(), line.upstream.into());
    t.insert("firmware_version".into(), line.firmware_version.clone().into());
    t.insert(
        "link_status".into(),
        LINK_STATUS.token(line.link_status.into()).into(),
    );
    match &line.standard_used {
        Standard::Xtse(xtse) => {
            t.insert("xtse_used".into(), mapper::xtse_tokens(xtse).into());
        }
        Standard::Modes(mask) => {
            let used = MODULATION.first(*mask).unwrap_or(mapper::UNKNOWN);
            t.insert("standard_used".into(), used.into());
        }
    }
    t.insert(
        "current_profile".into(),
        PROFILE.token(line.current_profile).into(),
    );
    t.insert(
        "power_management_state".into(),
        POWER_STATE.token(line.power_management_state.into()).into(),
    );
    t.insert("max_bit_rate".into(), usds(&line.max_bit_rate));
    t.insert(
        "line_encoding".into(),
        LINE_ENCODING.token(line.line_encoding.into()).into(),
    );
    match &line.standard_supported {
        Standard::Xtse(xtse) => {
            t.insert("xtse".into(), mapper::xtse_tokens(xtse).into());
        }
        Standard::Modes(mask) => {
            t.insert("standards_supported".into(), tokens(MODULATION.tokens(*mask)));
        }
    }
    t.insert(
        "allowed_profiles".into(),
        tokens(PROFILE.tokens(line.allowed_profiles)),
    );
    t.insert(
        "success_failure_cause".into(),
        line.success_failure_cause.into(),
    );
    t.insert("upbokler_pb".into(), sequence(&line.upbokler_pb));
    t.insert("rxthrsh_ds".into(), sequence(&line.rxthrsh_ds));
    t.insert("act_ra_mode".into(), usds(&line.act_ra_mode));
    t.insert("snr_mroc_us".into(), line.snr_mroc_us.into());
    t.insert(
        "last_state_transmitted".into(),
        usds(&line.last_state_transmitted),
    );
    t.insert("us0_mask".into(), line.us0_mask.into());
    t.insert("trellis".into(), usds(&line.trellis));
    t.insert("act_snr_mode".into(), usds(&line.act_snr_mode));
    t.insert("line_number".into(), line.line_number.into());
    t.insert("noise_margin".into(), usds(&line.noise_margin));
    t.insert("snr_mpb_us".into(), sequence(&line.snr_mpb_us));
    t.insert("snr_mpb_ds".into(), sequence(&line.snr_mpb_ds));
    t.insert("attenuation".into(), usds(&line.attenuation));
    t.insert("power".into(), usds(&line.power));
    t.insert("xtur_vendor".into(), mapper::hex_upper(&line.xtur_vendor).into());
    t.insert("xtur_country".into(), mapper::hex_upper(&line.xtur_country).into());
    t.insert("xtur_ansi_std".into(), line.xtur_ansi_std.into());
    t.insert("xtur_ansi_rev".into(), line.xtur_ansi_rev.into());
    t.insert("xtuc_vendor".into(), mapper::hex_upper(&line.xtuc_vendor).into());
    t.insert("xtuc_country".into(), mapper::hex_upper(&line.xtuc_country).into());
    t.insert("xtuc_ansi_std".into(), line.xtuc_ansi_std.into());
    t.insert("xtuc_ansi_rev".into(), line.xtuc_ansi_rev.into());
    t
}

/// Channel status table.
pub fn channel_status(channel: &Channel) -> Table {
    let mut t = Table::new();
    t.insert("status".into(), IF_STATUS.token(channel.status.into()).into());
    t.insert(
        "link_encapsulation_used".into(),
        ENCAPSULATION.token(channel.link_encapsulation_used).into(),
    );
    t.insert("curr_rate".into(), usds(&channel.curr_rate));
    t.insert("actndr".into(), usds(&channel.actndr));
    t.insert(
        "link_encapsulation_supported".into(),
        tokens(ENCAPSULATION.tokens(channel.link_encapsulation_supported)),
    );
    t.insert("lpath".into(), channel.lpath.into());
    t.insert("intlvdepth".into(), channel.intlvdepth.into());
    t.insert("intlvblock".into(), channel.intlvblock.into());
    t.insert(
        "actual_interleaving_delay".into(),
        channel.actual_interleaving_delay.into(),
    );
    t.insert("actinp".into(), channel.actinp.into());
    t.insert("inpreport".into(), channel.inpreport.into());
    t.insert("nfec".into(), channel.nfec.into());
    t.insert("rfec".into(), channel.rfec.into());
    t.insert("lsymb".into(), channel.lsymb.into());
    t.insert("actinprein".into(), usds(&channel.actinprein));
    t
}

/// Start-time counters shared by lines and channels.
pub fn stats(stats: &LineChannelStats) -> Table {
    let mut t = Table::new();
    t.insert("total_start".into(), stats.total_start.into());
    t.insert("showtime_start".into(), stats.showtime_start.into());
    t.insert("last_showtime_start".into(), stats.last_showtime_start.into());
    t.insert("current_day_start".into(), stats.current_day_start.into());
    t.insert("quarter_hour_start".into(), stats.quarter_hour_start.into());
    t
}

pub fn line_interval(interval: &LineStatsInterval) -> Table {
    let mut t = Table::new();
    t.insert("errored_secs".into(), interval.errored_secs.into());
    t.insert(
        "severely_errored_secs".into(),
        interval.severely_errored_secs.into(),
    );
    t
}

pub fn channel_interval(interval: &ChannelStatsInterval) -> Table {
    let mut t = Table::new();
    t.insert("xtur_fec_errors".into(), interval.xtur_fec_errors.into());
    t.insert("xtuc_fec_errors".into(), interval.xtuc_fec_errors.into());
    t.insert("xtur_hec_errors".into(), interval.xtur_hec_errors.into());
    t.insert("xtuc_hec_errors".into(), interval.xtuc_hec_errors.into());
    t.insert("xtur_crc_errors".into(), interval.xtur_crc_errors.into());
    t.insert("xtuc_crc_errors".into(), interval.xtuc_crc_errors.into());
    t
}

fn with_intervals<I>(start: &LineChannelStats, intervals: &[I; 5], one: fn(&I) -> Table) -> Table {
    let mut t = stats(start);
    for (interval, counters) in StatsInterval::ALL.iter().zip(intervals) {
        t.insert(interval.as_str().into(), Value::Object(one(counters)));
    }
    t
}

/// Start counters plus every interval bucket; `intervals` follows
/// [`StatsInterval::ALL`].
pub fn line_stats(start: &LineChannelStats, intervals: &[LineStatsInterval; 5]) -> Table {
    with_intervals(start, intervals, line_interval)
}

/// Start counters plus every interval bucket; `intervals` follows
/// [`StatsInterval::ALL`].
pub fn channel_stats(start: &LineChannelStats, intervals: &[ChannelStatsInterval; 5]) -> Table {
    with_intervals(start, intervals, channel_interval)
}

/// Insert `<name>_down` then `<name>_up`.
fn down_up(t: &mut Table, name: &str, pair: UsDs<u64>) {
    t.insert(format!("{name}_down"), pair.ds.into());
    t.insert(format!("{name}_up"), pair.us.into());
}

/// Flat legacy counters: `es`, `ses` and `uas`, downstream first.
pub fn perf_table(counters: &PerfCounters) -> Table {
    let mut t = Table::new();
    down_up(&mut t, "es", counters.es);
    down_up(&mut t, "ses", counters.ses);
    down_up(&mut t, "uas", counters.uas);
    t
}

/// Legacy performance counters, nested under the window label.
pub fn perf_counters(window: PerfWindow, counters: &PerfCounters) -> Table {
    let mut t = Table::new();
    t.insert(window.label().into(), Value::Object(perf_table(counters)));
    t
}

/// Legacy per-line bearer entry.
///
/// `s` is reported ×10000 and `inp` ×100, under suffixed keys.
pub fn bearer(bearer: &Bearer) -> Table {
    let scaled = |t: &mut Table, name: &str, pair: UsDs<u64>, factor: u64| {
        t.insert(format!("{name}_down_x{factor}"), pair.ds.saturating_mul(factor).into());
        t.insert(format!("{name}_up_x{factor}"), pair.us.saturating_mul(factor).into());
    };

    let mut t = Table::new();
    t.insert("rate_up".into(), bearer.rate.us.into());
    t.insert("rate_down".into(), bearer.rate.ds.into());
    t.insert("msgc_up".into(), bearer.msgc.us.into());
    t.insert("msgc_down".into(), bearer.msgc.ds.into());
    down_up(&mut t, "b", bearer.b);
    down_up(&mut t, "m", bearer.m);
    down_up(&mut t, "t", bearer.t);
    down_up(&mut t, "r", bearer.r);
    scaled(&mut t, "s", bearer.s, 10_000);
    down_up(&mut t, "l", bearer.l);
    down_up(&mut t, "d", bearer.d);
    down_up(&mut t, "delay", bearer.delay);
    scaled(&mut t, "inp", bearer.inp, 100);
    down_up(&mut t, "sf", bearer.sf);
    down_up(&mut t, "sf_err", bearer.sf_err);
    down_up(&mut t, "rs", bearer.rs);
    down_up(&mut t, "rs_corr", bearer.rs_corr);
    down_up(&mut t, "rs_uncorr", bearer.rs_uncorr);
    down_up(&mut t, "hec", bearer.hec);
    down_up(&mut t, "ocd", bearer.ocd);
    down_up(&mut t, "lcd", bearer.lcd);
    down_up(&mut t, "fec", bearer.fec);
    down_up(&mut t, "crc", bearer.crc);
    t
}

/// Prepend an `id` key to a table.
pub fn with_id(id: usize, table: Table) -> Table {
    let mut t = Table::with_capacity(table.len() + 1);
    t.insert("id".into(), id.into());
    t.extend(table);
    t
}
