//! stderr logging configured from the environment.

use clap::ValueEnum;

/// `text` or `json`.
pub const LOG_FORMAT_ENV: &str = "DSLMNGR_LOG_FORMAT";
/// `error`, `warn`, `info`, `debug` or `trace`.
pub const LOG_LEVEL_ENV: &str = "DSLMNGR_LOG";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> tracing::level_filters::LevelFilter {
        match self {
            LogLevel::Error => tracing::level_filters::LevelFilter::ERROR,
            LogLevel::Warn => tracing::level_filters::LevelFilter::WARN,
            LogLevel::Info => tracing::level_filters::LevelFilter::INFO,
            LogLevel::Debug => tracing::level_filters::LevelFilter::DEBUG,
            LogLevel::Trace => tracing::level_filters::LevelFilter::TRACE,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub format: LogFormat,
    pub level: LogLevel,
}

impl LogSettings {
    /// Read the settings from the environment. Unparsable values fall back to
    /// the default and are returned as complaints to log once logging is up.
    pub fn from_env() -> (Self, Vec<String>) {
        Self::from_values(
            std::env::var(LOG_FORMAT_ENV).ok().as_deref(),
            std::env::var(LOG_LEVEL_ENV).ok().as_deref(),
        )
    }

    fn from_values(format: Option<&str>, level: Option<&str>) -> (Self, Vec<String>) {
        let mut complaints = Vec::new();
        let format = parse_or_default(LOG_FORMAT_ENV, format, &mut complaints);
        let level = parse_or_default(LOG_LEVEL_ENV, level, &mut complaints);
        (Self { format, level }, complaints)
    }
}

fn parse_or_default<T: ValueEnum + Default>(
    name: &str,
    value: Option<&str>,
    complaints: &mut Vec<String>,
) -> T {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => T::default(),
        Some(value) => T::from_str(value, true).unwrap_or_else(|_| {
            complaints.push(format!("ignoring {name}={value}"));
            T::default()
        }),
    }
}

pub fn init_logging(settings: LogSettings) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(settings.level.as_filter())
        .with_ansi(false)
        .with_target(false);

    match settings.format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
