use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::config::LineConfig;
use crate::error::{BackendError, Result};
use crate::file::FileBackend;
use crate::model::{
    Bearer, Channel, ChannelStatsInterval, Line, LineChannelStats, LineStatsInterval, PerfCounters,
    PerfWindow, StatsInterval,
};

/// Driver capability table.
///
/// Accessors either return a complete record or an error; they never hand
/// out partially filled data. Accessors a driver lacks keep the default
/// body and report [`BackendError::Unsupported`].
pub trait Backend: Send + Sync {
    /// Technology name the backend registers under.
    fn name(&self) -> &str;

    fn line_count(&self) -> Result<usize>;

    fn channel_count(&self) -> Result<usize>;

    fn start(&self, _config: &LineConfig) -> Result<()> {
        Err(BackendError::Unsupported("start"))
    }

    fn stop(&self) -> Result<()> {
        Err(BackendError::Unsupported("stop"))
    }

    fn get_line_info(&self, _line: usize) -> Result<Line> {
        Err(BackendError::Unsupported("get_line_info"))
    }

    fn get_line_stats(&self, _line: usize) -> Result<LineChannelStats> {
        Err(BackendError::Unsupported("get_line_stats"))
    }

    fn get_line_stats_interval(
        &self,
        _line: usize,
        _interval: StatsInterval,
    ) -> Result<LineStatsInterval> {
        Err(BackendError::Unsupported("get_line_stats_interval"))
    }

    fn get_channel_info(&self, _channel: usize) -> Result<Channel> {
        Err(BackendError::Unsupported("get_channel_info"))
    }

    fn get_channel_stats(&self, _channel: usize) -> Result<LineChannelStats> {
        Err(BackendError::Unsupported("get_channel_stats"))
    }

    fn get_channel_stats_interval(
        &self,
        _channel: usize,
        _interval: StatsInterval,
    ) -> Result<ChannelStatsInterval> {
        Err(BackendError::Unsupported("get_channel_stats_interval"))
    }

    /// Framing parameters and error counters of a line's bearer.
    fn get_bearer(&self, _line: usize) -> Result<Bearer> {
        Err(BackendError::Unsupported("get_bearer"))
    }

    /// Legacy link-wide performance counters.
    fn get_perf_counters(&self, _window: PerfWindow) -> Result<PerfCounters> {
        Err(BackendError::Unsupported("get_perf_counters"))
    }
}

/// Settings handed to the selected backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOptions {
    /// Driver state document read by the `file` backend.
    pub state_file: PathBuf,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("/var/run/dsl/state.json"),
        }
    }
}

type Constructor = fn(&BackendOptions) -> Result<Arc<dyn Backend>>;

const BACKENDS: &[(&str, Constructor)] = &[(FileBackend::NAME, open_file)];

fn open_file(options: &BackendOptions) -> Result<Arc<dyn Backend>> {
    Ok(Arc::new(FileBackend::open(&options.state_file)?))
}

/// Open the first registered backend whose name prefixes `dsl_type`.
///
/// `file-vr9` selects the `file` backend.
pub fn open_backend(dsl_type: &str, options: &BackendOptions) -> Result<Arc<dyn Backend>> {
    let (name, constructor) = BACKENDS
        .iter()
        .find(|(name, _)| dsl_type.starts_with(name))
        .ok_or_else(|| BackendError::UnknownType(dsl_type.to_string()))?;

    let backend = constructor(options)?;
    info!(backend = name, dsl_type, "dsl backend selected");
    Ok(backend)
}
