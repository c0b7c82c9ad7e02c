//! In-memory backend for tests.
//!
//! Counts every accessor call and can be told to fail a given accessor,
//! either for every index or for a single one.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::backend::Backend;
use crate::config::LineConfig;
use crate::error::{BackendError, Result};
use crate::model::{
    Bearer, Channel, ChannelStatsInterval, DriverState, IntervalSet, Line, LineChannelStats,
    LineStatsInterval, PerfCounters, PerfSet, PerfWindow, StatsInterval, UsDs,
};

#[derive(Default)]
struct Ledger {
    calls: HashMap<&'static str, usize>,
    failures: Vec<(&'static str, Option<usize>)>,
    started: Option<LineConfig>,
}

pub struct FakeBackend {
    state: DriverState,
    ledger: Mutex<Ledger>,
}

impl FakeBackend {
    pub fn new(state: DriverState) -> Self {
        Self {
            state,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    /// Fixture with distinguishable values per index.
    ///
    /// Line `i` reports `status` 1 (up), firmware `fw-i` and a downstream
    /// noise margin of `100 + i`; channel `i` a downstream rate of
    /// `1000 * (i + 1)`. Statistics carry the index in `total_start`; the
    /// bearer of line `i` reports the same rates as channel `i` and
    /// `40 + i` downstream CRC errors.
    pub fn with_lines(lines: usize, channels: usize) -> Self {
        let counter = |index: usize| index as u64;
        let state = DriverState {
            lines: (0..lines)
                .map(|i| Line {
                    status: 1,
                    link_status: 1,
                    firmware_version: format!("fw-{i}"),
                    noise_margin: UsDs::new(50, 100 + i as i64),
                    max_bit_rate: UsDs::new(5000, 50000),
                    ..Line::default()
                })
                .collect(),
            channels: (0..channels)
                .map(|i| Channel {
                    status: 1,
                    curr_rate: UsDs::new(100 * (counter(i) + 1), 1000 * (counter(i) + 1)),
                    ..Channel::default()
                })
                .collect(),
            line_stats: (0..lines)
                .map(|i| LineChannelStats {
                    total_start: counter(i),
                    ..LineChannelStats::default()
                })
                .collect(),
            line_intervals: (0..lines)
                .map(|i| IntervalSet {
                    total: LineStatsInterval {
                        errored_secs: 10 + counter(i),
                        severely_errored_secs: 20 + counter(i),
                    },
                    ..IntervalSet::default()
                })
                .collect(),
            channel_stats: (0..channels)
                .map(|i| LineChannelStats {
                    total_start: counter(i),
                    ..LineChannelStats::default()
                })
                .collect(),
            channel_intervals: (0..channels)
                .map(|i| IntervalSet {
                    total: ChannelStatsInterval {
                        xtur_crc_errors: 30 + counter(i),
                        ..ChannelStatsInterval::default()
                    },
                    ..IntervalSet::default()
                })
                .collect(),
            bearers: (0..lines)
                .map(|i| Bearer {
                    rate: UsDs::new(100 * (counter(i) + 1), 1000 * (counter(i) + 1)),
                    msgc: UsDs::new(26, 58),
                    s: UsDs::new(1, 2),
                    inp: UsDs::new(3, 4),
                    crc: UsDs::new(0, 40 + counter(i)),
                    ..Bearer::default()
                })
                .collect(),
            ..DriverState::default()
        };
        Self::new(state)
    }

    /// Replace the link-wide performance counters.
    pub fn with_perf(mut self, perf: PerfSet) -> Self {
        self.state.perf = perf;
        self
    }

    /// Fail `accessor` for `index`, or for every index when `None`.
    pub fn fail(&self, accessor: &'static str, index: Option<usize>) {
        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.failures.push((accessor, index));
        }
    }

    pub fn calls(&self, accessor: &str) -> usize {
        self.ledger
            .lock()
            .map(|ledger| ledger.calls.get(accessor).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.ledger
            .lock()
            .map(|ledger| ledger.calls.values().sum())
            .unwrap_or(0)
    }

    /// Configuration passed to the last `start`, cleared by `stop`.
    pub fn started(&self) -> Option<LineConfig> {
        self.ledger.lock().ok().and_then(|ledger| ledger.started)
    }

    fn record(&self, accessor: &'static str, index: Option<usize>) -> Result<()> {
        let mut ledger = self
            .ledger
            .lock()
            .map_err(|_| BackendError::Driver("fake ledger poisoned".to_string()))?;
        *ledger.calls.entry(accessor).or_insert(0) += 1;
        let failing = ledger.failures.iter().any(|(name, at)| {
            *name == accessor && (at.is_none() || *at == index)
        });
        if failing {
            return Err(BackendError::Driver(format!("{accessor} failed")));
        }
        Ok(())
    }

    fn line_entry<T: Clone>(&self, items: &[T], line: usize) -> Result<T> {
        if line >= self.state.lines.len() {
            return Err(BackendError::NoSuchLine(line));
        }
        items.get(line).cloned().ok_or(BackendError::NoSuchLine(line))
    }

    fn channel_entry<T: Clone>(&self, items: &[T], channel: usize) -> Result<T> {
        if channel >= self.state.channels.len() {
            return Err(BackendError::NoSuchChannel(channel));
        }
        items
            .get(channel)
            .cloned()
            .ok_or(BackendError::NoSuchChannel(channel))
    }
}

impl Backend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    fn line_count(&self) -> Result<usize> {
        self.record("line_count", None)?;
        Ok(self.state.lines.len())
    }

    fn channel_count(&self) -> Result<usize> {
        self.record("channel_count", None)?;
        Ok(self.state.channels.len())
    }

    fn start(&self, config: &LineConfig) -> Result<()> {
        self.record("start", None)?;
        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.started = Some(*config);
        }
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.record("stop", None)?;
        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.started = None;
        }
        Ok(())
    }

    fn get_line_info(&self, line: usize) -> Result<Line> {
        self.record("get_line_info", Some(line))?;
        self.line_entry(&self.state.lines, line)
    }

    fn get_line_stats(&self, line: usize) -> Result<LineChannelStats> {
        self.record("get_line_stats", Some(line))?;
        self.line_entry(&self.state.line_stats, line)
    }

    fn get_line_stats_interval(
        &self,
        line: usize,
        interval: StatsInterval,
    ) -> Result<LineStatsInterval> {
        self.record("get_line_stats_interval", Some(line))?;
        let set = self.line_entry(&self.state.line_intervals, line)?;
        Ok(*set.get(interval))
    }

    fn get_channel_info(&self, channel: usize) -> Result<Channel> {
        self.record("get_channel_info", Some(channel))?;
        self.channel_entry(&self.state.channels, channel)
    }

    fn get_channel_stats(&self, channel: usize) -> Result<LineChannelStats> {
        self.record("get_channel_stats", Some(channel))?;
        self.channel_entry(&self.state.channel_stats, channel)
    }

    fn get_channel_stats_interval(
        &self,
        channel: usize,
        interval: StatsInterval,
    ) -> Result<ChannelStatsInterval> {
        self.record("get_channel_stats_interval", Some(channel))?;
        let set = self.channel_entry(&self.state.channel_intervals, channel)?;
        Ok(*set.get(interval))
    }

    fn get_bearer(&self, line: usize) -> Result<Bearer> {
        self.record("get_bearer", Some(line))?;
        self.line_entry(&self.state.bearers, line)
    }

    fn get_perf_counters(&self, window: PerfWindow) -> Result<PerfCounters> {
        self.record("get_perf_counters", None)?;
        Ok(*self.state.perf.get(window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_values_track_index() {
        let backend = FakeBackend::with_lines(2, 2);
        assert_eq!(backend.get_line_info(1).unwrap().firmware_version, "fw-1");
        assert_eq!(backend.get_channel_info(1).unwrap().curr_rate.ds, 2000);
        assert_eq!(backend.get_line_stats(1).unwrap().total_start, 1);
        assert_eq!(backend.get_bearer(1).unwrap().crc.ds, 41);
        assert_eq!(
            backend
                .get_line_stats_interval(0, StatsInterval::Total)
                .unwrap()
                .errored_secs,
            10
        );
    }

    #[test]
    fn calls_are_counted_per_accessor() {
        let backend = FakeBackend::with_lines(1, 1);
        backend.get_line_info(0).unwrap();
        backend.get_line_info(0).unwrap();
        backend.get_channel_stats(0).unwrap();

        assert_eq!(backend.calls("get_line_info"), 2);
        assert_eq!(backend.calls("get_channel_stats"), 1);
        assert_eq!(backend.calls("stop"), 0);
        assert_eq!(backend.total_calls(), 3);
    }

    #[test]
    fn failures_target_accessor_and_index() {
        let backend = FakeBackend::with_lines(2, 2);
        backend.fail("get_line_info", Some(1));

        assert!(backend.get_line_info(0).is_ok());
        assert!(matches!(
            backend.get_line_info(1),
            Err(BackendError::Driver(_))
        ));

        backend.fail("stop", None);
        assert!(backend.stop().is_err());
        assert_eq!(backend.calls("stop"), 1);
    }

    #[test]
    fn indices_past_fixture_fail() {
        let backend = FakeBackend::with_lines(1, 1);
        assert!(matches!(
            backend.get_line_stats(1),
            Err(BackendError::NoSuchLine(1))
        ));
        assert!(matches!(
            backend.get_channel_info(4),
            Err(BackendError::NoSuchChannel(4))
        ));
    }
}
