use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::backend::Backend;
use crate::config::LineConfig;
use crate::error::{BackendError, Result};
use crate::model::{
    Bearer, Channel, ChannelStatsInterval, DriverState, Line, LineChannelStats, LineStatsInterval,
    PerfCounters, PerfWindow, StatsInterval,
};

/// Backend serving a JSON driver-state document.
///
/// The document is re-read for every query, so whatever maintains it can
/// update line state while the daemon runs. Line and channel counts are
/// fixed at open.
pub struct FileBackend {
    path: PathBuf,
    line_count: usize,
    channel_count: usize,
    applied: Mutex<Option<LineConfig>>,
}

impl FileBackend {
    pub const NAME: &'static str = "file";

    /// Load `path` once to validate it and fix the line/channel counts.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = load(&path)?;
        info!(
            ?path,
            lines = state.lines.len(),
            channels = state.channels.len(),
            "driver state loaded"
        );
        Ok(Self {
            path,
            line_count: state.lines.len(),
            channel_count: state.channels.len(),
            applied: Mutex::new(None),
        })
    }

    fn snapshot(&self) -> Result<DriverState> {
        load(&self.path)
    }

    fn line<T>(&self, line: usize, pick: impl FnOnce(DriverState) -> Option<T>) -> Result<T> {
        if line >= self.line_count {
            return Err(BackendError::NoSuchLine(line));
        }
        pick(self.snapshot()?).ok_or(BackendError::NoSuchLine(line))
    }

    fn channel<T>(&self, channel: usize, pick: impl FnOnce(DriverState) -> Option<T>) -> Result<T> {
        if channel >= self.channel_count {
            return Err(BackendError::NoSuchChannel(channel));
        }
        pick(self.snapshot()?).ok_or(BackendError::NoSuchChannel(channel))
    }
}

fn load(path: &Path) -> Result<DriverState> {
    let raw = std::fs::read(path).map_err(|source| BackendError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| BackendError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Backend for FileBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn line_count(&self) -> Result<usize> {
        Ok(self.line_count)
    }

    fn channel_count(&self) -> Result<usize> {
        Ok(self.channel_count)
    }

    fn start(&self, config: &LineConfig) -> Result<()> {
        let mut applied = self
            .applied
            .lock()
            .map_err(|_| BackendError::Driver("line state lock poisoned".to_string()))?;
        if applied.replace(*config).is_some() {
            debug!("line restarted with new configuration");
        }
        debug!(modes = config.modes, profiles = config.profiles, "line started");
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        let mut applied = self
            .applied
            .lock()
            .map_err(|_| BackendError::Driver("line state lock poisoned".to_string()))?;
        if applied.take().is_none() {
            debug!("line was not running");
        }
        debug!("line stopped");
        Ok(())
    }

    fn get_line_info(&self, line: usize) -> Result<Line> {
        self.line(line, |mut state| {
            (line < state.lines.len()).then(|| state.lines.swap_remove(line))
        })
    }

    fn get_line_stats(&self, line: usize) -> Result<LineChannelStats> {
        self.line(line, |state| Some(state.line_stats.get(line).copied().unwrap_or_default()))
    }

    fn get_line_stats_interval(
        &self,
        line: usize,
        interval: StatsInterval,
    ) -> Result<LineStatsInterval> {
        self.line(line, |state| {
            Some(
                state
                    .line_intervals
                    .get(line)
                    .map(|set| *set.get(interval))
                    .unwrap_or_default(),
            )
        })
    }

    fn get_channel_info(&self, channel: usize) -> Result<Channel> {
        self.channel(channel, |mut state| {
            (channel < state.channels.len()).then(|| state.channels.swap_remove(channel))
        })
    }

    fn get_channel_stats(&self, channel: usize) -> Result<LineChannelStats> {
        self.channel(channel, |state| {
            Some(state.channel_stats.get(channel).copied().unwrap_or_default())
        })
    }

    fn get_channel_stats_interval(
        &self,
        channel: usize,
        interval: StatsInterval,
    ) -> Result<ChannelStatsInterval> {
        self.channel(channel, |state| {
            Some(
                state
                    .channel_intervals
                    .get(channel)
                    .map(|set| *set.get(interval))
                    .unwrap_or_default(),
            )
        })
    }

    fn get_bearer(&self, line: usize) -> Result<Bearer> {
        self.line(line, |state| Some(state.bearers.get(line).copied().unwrap_or_default()))
    }

    fn get_perf_counters(&self, window: PerfWindow) -> Result<PerfCounters> {
        Ok(*self.snapshot()?.perf.get(window))
    }
}
