//! Startup, serving and shutdown.

use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;

use dslmngr_bus::{connect, spawn_reader, LoopInput, Object, ObjectSet, ServeOutcome, ServingLoop};
use dslmngr_netlink::spawn_bridge;
use dslmngr_xdsl::{open_backend, Backend};
use tracing::{info, warn};

use crate::config::{self, Config};
use crate::exit::{
    backend_error, bus_error, config_error, connect_error, io_error, CliError, CliResult,
    FAILURE, INTERNAL,
};
use crate::legacy::xdsl_object;
use crate::objects::{dsl_objects, Counts};

/// Every object the daemon serves for `config`, `dsl` first.
pub fn build_objects(backend: &Arc<dyn Backend>, config: &Config) -> CliResult<Vec<Object>> {
    let counts = Counts::query(backend.as_ref())
        .map_err(|err| backend_error("failed to query dsl hardware", err))?;
    info!(lines = counts.lines, channels = counts.channels, "dsl hardware");

    let mut objects = dsl_objects(backend, counts, config.dsl.topology);
    if config.dsl.legacy_object {
        let line_config = config
            .line
            .line_config()
            .map_err(|err| config_error(err.into()))?;
        objects.push(xdsl_object(Arc::clone(backend), counts, line_config));
    }
    Ok(objects)
}

/// A registered daemon, ready to serve.
pub struct Daemon {
    serving: ServingLoop,
    inputs: Sender<LoopInput>,
}

impl Daemon {
    /// Connect to the bus at `socket`, register every object and start the
    /// bus reader.
    pub fn start(socket: &Path, config: &Config, backend: Arc<dyn Backend>) -> CliResult<Self> {
        let objects = build_objects(&backend, config)?;

        let mut connection = connect(socket).map_err(connect_error)?;
        info!(socket = %socket.display(), client_id = %connection.client_id(), "connected to bus");

        let objects = ObjectSet::register(&mut connection, objects)
            .map_err(|err| bus_error("failed to register objects", err))?;
        let (reader, writer) = connection
            .into_split()
            .map_err(|err| bus_error("failed to split bus connection", err))?;

        let (inputs, rx) = mpsc::channel();
        spawn_reader(reader, inputs.clone())
            .map_err(|err| io_error("failed to start bus reader", err))?;

        Ok(Self {
            serving: ServingLoop::new(writer, objects, rx),
            inputs,
        })
    }

    /// Sender feeding the serving loop; shutdown requests and events go here.
    pub fn inputs(&self) -> Sender<LoopInput> {
        self.inputs.clone()
    }

    pub fn object_names(&self) -> Vec<String> {
        self.serving.objects().names().map(str::to_string).collect()
    }

    pub fn serve(self) -> ServeOutcome {
        let Self { serving, inputs } = self;
        drop(inputs);
        serving.run()
    }
}

/// Run the daemon against the bus at `socket` until shutdown.
pub fn run(socket: &Path) -> CliResult<()> {
    let config_path = config::config_path();
    let config = Config::load(&config_path).map_err(config_error)?;
    let backend = open_backend(&config.dsl.dsl_type, &config.backend_options())
        .map_err(|err| backend_error("failed to open dsl backend", err))?;

    let daemon = Daemon::start(socket, &config, backend)?;
    info!(objects = ?daemon.object_names(), "serving");

    let shutdown = daemon.inputs();
    ctrlc::set_handler(move || {
        let _ = shutdown.send(LoopInput::Shutdown);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("failed to install signal handler: {err}")))?;

    if let Err(err) = spawn_bridge(config.bridge_config(), daemon.inputs()) {
        warn!(error = %err, "kernel notifications disabled");
    }

    match daemon.serve() {
        ServeOutcome::Shutdown => {
            info!("dslmngr stopped");
            Ok(())
        }
        ServeOutcome::BusClosed => Err(CliError::new(FAILURE, "lost connection to bus")),
    }
}

#[cfg(test)]
mod tests {
    use dslmngr_xdsl::fake::FakeBackend;

    use super::*;
    use crate::config::Topology;

    #[test]
    fn builds_dsl_first_and_legacy_last() {
        let backend: Arc<dyn Backend> = Arc::new(FakeBackend::with_lines(1, 1));
        let names = |config: &Config| -> Vec<String> {
            build_objects(&backend, config)
                .unwrap()
                .iter()
                .map(|object| object.name().to_string())
                .collect()
        };

        let config = Config::default();
        assert_eq!(names(&config), ["dsl", "dsl.line.0", "dsl.channel.0", "xdsl"]);

        let mut config = Config::default();
        config.dsl.topology = Topology::Aggregate;
        config.dsl.legacy_object = false;
        assert_eq!(names(&config), ["dsl"]);
    }

    #[test]
    fn count_failure_stops_startup() {
        let fake = Arc::new(FakeBackend::with_lines(1, 1));
        fake.fail("channel_count", None);
        let backend: Arc<dyn Backend> = fake;
        assert!(build_objects(&backend, &Config::default()).is_err());
    }

    #[test]
    fn unreachable_bus_is_a_connect_failure() {
        let backend: Arc<dyn Backend> = Arc::new(FakeBackend::with_lines(1, 1));
        let err = Daemon::start(
            Path::new("/nonexistent/dslmngr/bus.sock"),
            &Config::default(),
            backend,
        )
        .err()
        .unwrap();
        assert_eq!(err.code, crate::exit::BUS_CONNECT);
    }
}
