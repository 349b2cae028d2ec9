use std::path::{Path, PathBuf};
use std::time::Duration;

use schemerge_core::MergeMode;
use schemerge_introspect::ConnectOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file read when `--config` is not given. A missing default file
/// means "all defaults".
pub const DEFAULT_CONFIG_PATH: &str = "schemerge.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub run_dir: PathBuf,
    pub base: Option<Endpoint>,
    pub mirror: Option<Endpoint>,
    pub pool: PoolConfig,
    pub merge: MergeConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            run_dir: PathBuf::from("runs"),
            base: None,
            mirror: None,
            pool: PoolConfig::default(),
            merge: MergeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout_secs: 10,
        }
    }
}

impl PoolConfig {
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub mode: MergeMode,
    pub exclude_tables: Vec<String>,
}

impl SyncConfig {
    pub fn base_url(&self) -> Option<&str> {
        self.base.as_ref().map(|endpoint| endpoint.url.as_str())
    }

    pub fn mirror_url(&self) -> Option<&str> {
        self.mirror.as_ref().map(|endpoint| endpoint.url.as_str())
    }
}

/// Load `path`, or the default config file if it exists.
pub fn load_config(path: Option<&Path>) -> ConfigResult<SyncConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !default.exists() {
                return Ok(SyncConfig::default());
            }
            default
        }
    };

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> ConfigResult<SyncConfig> {
    Ok(toml::from_str(content)?)
}
