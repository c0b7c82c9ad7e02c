//! The older `xdsl` object: link summary, performance counters and
//! start/stop of the line.

use std::sync::Arc;

use dslmngr_bus::{Object, Status, Table};
use dslmngr_schema::{ArgPolicy, ArgType};
use dslmngr_xdsl::mapper::{self, LINK_STATUS};
use dslmngr_xdsl::serializer::{self, with_id};
use dslmngr_xdsl::{Backend, Channel, Line, LineConfig, PerfCounters, PerfWindow};
use serde_json::Value;
use tracing::{debug, info};

use crate::objects::{failed, Counts};

pub const XDSL_OBJECT: &str = "xdsl";

/// Link-level summary of one line.
fn link_summary(line: &Line, channel: &Channel, total: &PerfCounters) -> Table {
    let up = LINK_STATUS.token(u64::from(line.link_status)) == "up";
    let mut t = Table::new();
    t.insert("mode".into(), mapper::legacy_mode(&line.standard_used).into());
    t.insert(
        "traffic".into(),
        mapper::legacy_traffic(up, channel.link_encapsulation_used).into(),
    );
    t.insert(
        "link_power_state".into(),
        mapper::legacy_power_state(line.power_management_state).into(),
    );
    t.insert(
        "line_status".into(),
        mapper::legacy_line_state(line.link_status).into(),
    );
    t.insert("trellis_up".into(), (line.trellis.us != 0).into());
    t.insert("trellis_down".into(), (line.trellis.ds != 0).into());
    t.insert("snr_up_x10".into(), line.noise_margin.us.into());
    t.insert("snr_down_x10".into(), line.noise_margin.ds.into());
    t.insert("pwr_up_x10".into(), line.power.us.into());
    t.insert("pwr_down_x10".into(), line.power.ds.into());
    t.insert("attn_up_x10".into(), line.attenuation.us.into());
    t.insert("attn_down_x10".into(), line.attenuation.ds.into());
    t.insert("max_rate_up".into(), line.max_bit_rate.us.into());
    t.insert("max_rate_down".into(), line.max_bit_rate.ds.into());
    t.insert("line".into(), Value::Array(Vec::new()));
    let mut counters = Table::new();
    counters.insert("total".into(), Value::Object(serializer::perf_table(total)));
    t.insert("counters".into(), Value::Object(counters));
    t
}

/// The optional `line` argument, checked against the line count.
fn line_arg(args: &Table, counts: Counts) -> Result<Option<usize>, Status> {
    let Some(value) = args.get("line").filter(|value| !value.is_null()) else {
        return Ok(None);
    };
    value
        .as_u64()
        .and_then(|line| usize::try_from(line).ok())
        .filter(|line| *line < counts.lines)
        .map(Some)
        .ok_or_else(|| {
            debug!(line = %value, lines = counts.lines, "rejecting line argument");
            Status::InvalidArgument
        })
}

fn window_arg(args: &Table) -> Result<PerfWindow, Status> {
    match args.get("type") {
        None | Some(Value::Null) => Ok(PerfWindow::CurrentLink),
        Some(Value::String(name)) => name.parse().map_err(|err| {
            debug!(error = %err, "rejecting stats type");
            Status::InvalidArgument
        }),
        Some(_) => Err(Status::InvalidArgument),
    }
}

fn status(
    backend: &dyn Backend,
    counts: Counts,
    selected: Option<usize>,
) -> dslmngr_xdsl::Result<Table> {
    let link_line = selected.unwrap_or(0);
    let line = backend.get_line_info(link_line)?;
    // Lines without a channel of their own report no encapsulation.
    let channel = if link_line < counts.channels {
        backend.get_channel_info(link_line)?
    } else {
        Channel::default()
    };
    let total = backend.get_perf_counters(PerfWindow::Total)?;
    let mut summary = link_summary(&line, &channel, &total);

    let listed: Vec<usize> = match selected {
        Some(line) => vec![line],
        None => (0..counts.lines).collect(),
    };
    let mut bearers = Vec::with_capacity(listed.len());
    for line in listed {
        let bearer = backend.get_bearer(line)?;
        bearers.push(Value::Object(with_id(line, serializer::bearer(&bearer))));
    }
    summary.insert("line".into(), Value::Array(bearers));

    let mut reply = Table::new();
    reply.insert("dslstatus".into(), Value::Object(summary));
    Ok(reply)
}

/// The `xdsl` object. `line_config` is what `start` applies.
pub fn xdsl_object(backend: Arc<dyn Backend>, counts: Counts, line_config: LineConfig) -> Object {
    let status_backend = Arc::clone(&backend);
    let stats_backend = Arc::clone(&backend);
    let start_backend = Arc::clone(&backend);
    Object::new(XDSL_OBJECT, XDSL_OBJECT)
        .method(
            "status",
            ArgPolicy::none().arg("line", ArgType::Int32),
            move |args| {
                let selected = line_arg(args, counts)?;
                if counts.lines == 0 {
                    return Err(Status::NoData);
                }
                status(status_backend.as_ref(), counts, selected)
                    .map_err(|err| failed(XDSL_OBJECT, "status", err))
            },
        )
        .method(
            "stats",
            ArgPolicy::none().arg("type", ArgType::String),
            move |args| {
                let window = window_arg(args)?;
                stats_backend
                    .get_perf_counters(window)
                    .map(|counters| serializer::perf_counters(window, &counters))
                    .map_err(|err| failed(XDSL_OBJECT, "stats", err))
            },
        )
        .method("start", ArgPolicy::none(), move |_| {
            start_backend
                .start(&line_config)
                .map_err(|err| failed(XDSL_OBJECT, "start", err))?;
            info!(modes = line_config.modes, profiles = line_config.profiles, "dsl started");
            Ok(Table::new())
        })
        .method("stop", ArgPolicy::none(), move |_| {
            backend
                .stop()
                .map_err(|err| failed(XDSL_OBJECT, "stop", err))?;
            info!("dsl stopped");
            Ok(Table::new())
        })
}
