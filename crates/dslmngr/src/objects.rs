//! The `dsl`, `dsl.line.<n>` and `dsl.channel.<n>` bus objects.
//!
//! Every handler holds the backend and, for per-entity objects, the index
//! it was registered for. Backend failures become `UNKNOWN_ERROR` and no
//! partial data is returned.

use std::sync::Arc;

use dslmngr_bus::{Object, Status, Table};
use dslmngr_schema::{ArgPolicy, ArgType};
use dslmngr_xdsl::serializer::{self, with_id};
use dslmngr_xdsl::{
    Backend, BackendError, ChannelStatsInterval, LineStatsInterval, StatsInterval,
};
use serde_json::Value;
use tracing::{debug, error};

use crate::config::Topology;

pub const DSL_OBJECT: &str = "dsl";
pub const LINE_TYPE: &str = "dsl.line";
pub const CHANNEL_TYPE: &str = "dsl.channel";

pub fn line_object_name(line: usize) -> String {
    format!("{LINE_TYPE}.{line}")
}

pub fn channel_object_name(channel: usize) -> String {
    format!("{CHANNEL_TYPE}.{channel}")
}

/// Line and channel counts, queried once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub lines: usize,
    pub channels: usize,
}

impl Counts {
    pub fn query(backend: &dyn Backend) -> dslmngr_xdsl::Result<Self> {
        Ok(Self {
            lines: backend.line_count()?,
            channels: backend.channel_count()?,
        })
    }
}

fn stats_policy() -> ArgPolicy {
    ArgPolicy::none().arg("interval", ArgType::String)
}

/// The optional `interval` argument.
fn interval_arg(args: &Table) -> Result<Option<StatsInterval>, Status> {
    match args.get("interval") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(name)) => name.parse().map(Some).map_err(|err| {
            debug!(error = %err, "rejecting stats interval");
            Status::InvalidArgument
        }),
        Some(_) => Err(Status::InvalidArgument),
    }
}

pub(crate) fn failed(object: &str, method: &str, err: BackendError) -> Status {
    error!(object, method, error = %err, "backend call failed");
    Status::UnknownError
}

fn line_intervals(
    backend: &dyn Backend,
    line: usize,
) -> dslmngr_xdsl::Result<[LineStatsInterval; 5]> {
    let mut intervals = [LineStatsInterval::default(); 5];
    for (slot, interval) in intervals.iter_mut().zip(StatsInterval::ALL) {
        *slot = backend.get_line_stats_interval(line, interval)?;
    }
    Ok(intervals)
}

fn channel_intervals(
    backend: &dyn Backend,
    channel: usize,
) -> dslmngr_xdsl::Result<[ChannelStatsInterval; 5]> {
    let mut intervals = [ChannelStatsInterval::default(); 5];
    for (slot, interval) in intervals.iter_mut().zip(StatsInterval::ALL) {
        *slot = backend.get_channel_stats_interval(channel, interval)?;
    }
    Ok(intervals)
}

fn line_stats(
    backend: &dyn Backend,
    line: usize,
    interval: Option<StatsInterval>,
) -> dslmngr_xdsl::Result<Table> {
    Ok(match interval {
        Some(interval) => {
            serializer::line_interval(&backend.get_line_stats_interval(line, interval)?)
        }
        None => serializer::line_stats(
            &backend.get_line_stats(line)?,
            &line_intervals(backend, line)?,
        ),
    })
}

fn channel_stats(
    backend: &dyn Backend,
    channel: usize,
    interval: Option<StatsInterval>,
) -> dslmngr_xdsl::Result<Table> {
    Ok(match interval {
        Some(interval) => {
            serializer::channel_interval(&backend.get_channel_stats_interval(channel, interval)?)
        }
        None => serializer::channel_stats(
            &backend.get_channel_stats(channel)?,
            &channel_intervals(backend, channel)?,
        ),
    })
}

/// `{line: [...]}` with each line's channel nested under `channel`.
///
/// Line `n` carries channel `n` when the driver reports one, as `id: 0`.
fn per_line<L, C>(counts: Counts, line: L, channel: C) -> dslmngr_xdsl::Result<Table>
where
    L: Fn(usize) -> dslmngr_xdsl::Result<Table>,
    C: Fn(usize) -> dslmngr_xdsl::Result<Table>,
{
    let mut lines = Vec::with_capacity(counts.lines);
    for index in 0..counts.lines {
        let mut entry = with_id(index, line(index)?);
        let channels = if index < counts.channels {
            vec![Value::Object(with_id(0, channel(index)?))]
        } else {
            Vec::new()
        };
        entry.insert("channel".into(), Value::Array(channels));
        lines.push(Value::Object(entry));
    }

    let mut reply = Table::new();
    reply.insert("line".into(), Value::Array(lines));
    Ok(reply)
}

/// The aggregate `dsl` object covering every line and channel.
pub fn dsl_object(backend: Arc<dyn Backend>, counts: Counts) -> Object {
    let status_backend = Arc::clone(&backend);
    Object::new(DSL_OBJECT, DSL_OBJECT)
        .method("status", ArgPolicy::none(), move |_| {
            let backend = status_backend.as_ref();
            per_line(
                counts,
                |line| Ok(serializer::line_status(&backend.get_line_info(line)?)),
                |channel| Ok(serializer::channel_status(&backend.get_channel_info(channel)?)),
            )
            .map_err(|err| failed(DSL_OBJECT, "status", err))
        })
        .method("stats", ArgPolicy::none(), move |_| {
            let backend = backend.as_ref();
            per_line(
                counts,
                |line| line_stats(backend, line, None),
                |channel| channel_stats(backend, channel, None),
            )
            .map_err(|err| failed(DSL_OBJECT, "stats", err))
        })
}

pub fn line_object(backend: Arc<dyn Backend>, line: usize) -> Object {
    let name = line_object_name(line);
    let status_backend = Arc::clone(&backend);
    let status_name = name.clone();
    let stats_name = name.clone();
    Object::new(name, LINE_TYPE)
        .method("status", ArgPolicy::none(), move |_| {
            status_backend
                .get_line_info(line)
                .map(|info| serializer::line_status(&info))
                .map_err(|err| failed(&status_name, "status", err))
        })
        .method("stats", stats_policy(), move |args| {
            let interval = interval_arg(args)?;
            line_stats(backend.as_ref(), line, interval)
                .map_err(|err| failed(&stats_name, "stats", err))
        })
}

pub fn channel_object(backend: Arc<dyn Backend>, channel: usize) -> Object {
    let name = channel_object_name(channel);
    let status_backend = Arc::clone(&backend);
    let status_name = name.clone();
    let stats_name = name.clone();
    Object::new(name, CHANNEL_TYPE)
        .method("status", ArgPolicy::none(), move |_| {
            status_backend
                .get_channel_info(channel)
                .map(|info| serializer::channel_status(&info))
                .map_err(|err| failed(&status_name, "status", err))
        })
        .method("stats", stats_policy(), move |args| {
            let interval = interval_arg(args)?;
            channel_stats(backend.as_ref(), channel, interval)
                .map_err(|err| failed(&stats_name, "stats", err))
        })
}

/// `dsl` first, then lines and channels in index order for
/// [`Topology::PerEntity`].
pub fn dsl_objects(backend: &Arc<dyn Backend>, counts: Counts, topology: Topology) -> Vec<Object> {
    let mut objects = vec![dsl_object(Arc::clone(backend), counts)];
    if topology == Topology::PerEntity {
        objects.extend((0..counts.lines).map(|line| line_object(Arc::clone(backend), line)));
        objects.extend(
            (0..counts.channels).map(|channel| channel_object(Arc::clone(backend), channel)),
        );
    }
    objects
}
