//! Daemon configuration, read once at startup.
//!
//! ```toml
//! [dsl]
//! type = "file"
//! state_file = "/var/run/dsl/state.json"
//! topology = "per_entity"
//! legacy_object = true
//!
//! [line]
//! mode = ["adsl2", "adsl2p", "vdsl2"]
//! profile = ["8a", "17a", "35b"]
//! trellis = true
//!
//! [netlink]
//! family = "easysoc"
//! group = "notify"
//! ```

use std::io;
use std::path::{Path, PathBuf};

use dslmngr_netlink::BridgeConfig;
use dslmngr_xdsl::{BackendOptions, LineConfig, LineConfigError};
use serde::Deserialize;
use tracing::info;

/// Environment variable overriding the config file path.
pub const CONFIG_ENV: &str = "DSLMNGR_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/dslmngr.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid [line] section: {0}")]
    Line(#[from] LineConfigError),
}

/// Which bus objects describe the lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// `dsl` plus one `dsl.line.<n>` / `dsl.channel.<n>` object per entity.
    #[default]
    PerEntity,
    /// The `dsl` object alone.
    Aggregate,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DslSection {
    /// Backend technology name, prefix-matched against registered backends.
    #[serde(rename = "type")]
    pub dsl_type: String,
    pub state_file: PathBuf,
    pub topology: Topology,
    /// Also serve the `xdsl` object.
    pub legacy_object: bool,
}

impl Default for DslSection {
    fn default() -> Self {
        Self {
            dsl_type: "file".to_string(),
            state_file: BackendOptions::default().state_file,
            topology: Topology::default(),
            legacy_object: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineSection {
    pub mode: Vec<String>,
    pub profile: Vec<String>,
    pub trellis: bool,
    pub bitswap: bool,
    pub sra: bool,
    pub us0: bool,
}

impl LineSection {
    pub fn mode_bitmap(&self) -> Result<u32, LineConfigError> {
        LineConfig::mode_bitmap(&self.mode)
    }

    pub fn profile_bitmap(&self) -> Result<u32, LineConfigError> {
        LineConfig::profile_bitmap(&self.profile)
    }

    /// Settings handed to `Backend::start`.
    pub fn line_config(&self) -> Result<LineConfig, LineConfigError> {
        Ok(LineConfig {
            modes: self.mode_bitmap()?,
            profiles: self.profile_bitmap()?,
            trellis: self.trellis,
            bitswap: self.bitswap,
            sra: self.sra,
            us0: self.us0,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetlinkSection {
    pub family: String,
    pub group: String,
}

impl Default for NetlinkSection {
    fn default() -> Self {
        let bridge = BridgeConfig::default();
        Self {
            family: bridge.family,
            group: bridge.group,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub dsl: DslSection,
    pub line: LineSection,
    pub netlink: NetlinkSection,
}

impl Config {
    /// Load `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = Self::from_toml(&text, path)?;
        info!(path = %path.display(), dsl_type = %config.dsl.dsl_type, "config loaded");
        Ok(config)
    }

    /// Parse and validate a config document.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Self::from_toml(text, Path::new("<inline>"))
    }

    fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.line.line_config()?;
        Ok(config)
    }

    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            state_file: self.dsl.state_file.clone(),
        }
    }

    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            family: self.netlink.family.clone(),
            group: self.netlink.group.clone(),
        }
    }
}

/// Config file path: `$DSLMNGR_CONFIG`, else [`DEFAULT_CONFIG_PATH`].
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
