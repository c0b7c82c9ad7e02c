use std::path::PathBuf;

use clap::Parser;
use dslmngr::exit::SUCCESS;
use dslmngr::logging::{init_logging, LogSettings};
use dslmngr_transport::DEFAULT_BUS_SOCKET;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "dslmngr", about = "xDSL manager daemon")]
struct Cli {
    /// Bus socket path.
    #[arg(short = 's', value_name = "SOCKET", default_value = DEFAULT_BUS_SOCKET)]
    socket: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    let (settings, complaints) = LogSettings::from_env();
    init_logging(settings);
    for complaint in complaints {
        warn!("{complaint}");
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        target = option_env!("DSLMNGR_BUILD_TARGET").unwrap_or("unknown"),
        "dslmngr starting"
    );

    match dslmngr::run(&cli.socket) {
        Ok(()) => std::process::exit(SUCCESS),
        Err(err) => {
            error!(code = err.code, "{err}");
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
