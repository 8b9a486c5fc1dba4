use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use cloner_engine::{ClientSettings, DEFAULT_BASE_URL};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::logging::LogDestination;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "cloner.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("backend url {url:?} is not usable: {reason}")]
    BackendUrl { url: String, reason: String },
    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub destination: LogDestination,
    pub level: String,
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            destination: LogDestination::File,
            level: "info".to_string(),
            file: PathBuf::from("./cloner.log"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend_url: String,
    pub connect_timeout_secs: u64,
    /// Unset means a clone may take as long as the backend needs.
    pub request_timeout_secs: Option<u64>,
    pub max_body_bytes: u64,
    pub download_dir: PathBuf,
    pub probe_on_start: bool,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            backend_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: None,
            max_body_bytes: client.max_body_bytes,
            download_dir: PathBuf::from("."),
            probe_on_start: true,
            log: LogConfig::default(),
        }
    }
}

/// Command-line values that win over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend_url: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub log_destination: Option<LogDestination>,
    pub verbose: bool,
}

impl AppConfig {
    /// Loads `path`, or `./cloner.ron` if it exists, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load_from(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.backend_url {
            self.backend_url = url;
        }
        if let Some(dir) = overrides.download_dir {
            self.download_dir = dir;
        }
        if let Some(secs) = overrides.request_timeout_secs {
            self.request_timeout_secs = Some(secs);
        }
        if let Some(destination) = overrides.log_destination {
            self.log.destination = destination;
        }
        if overrides.verbose {
            self.log.level = "debug".to_string();
        }
    }

    /// Checks the backend URL and returns the parsed log level.
    pub fn validate(&self) -> Result<LevelFilter, ConfigError> {
        let invalid = |reason: String| ConfigError::BackendUrl {
            url: self.backend_url.clone(),
            reason,
        };
        let url = Url::parse(&self.backend_url).map_err(|err| invalid(err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }

        LevelFilter::from_str(&self.log.level)
            .map_err(|_| ConfigError::LogLevel(self.log.level.clone()))
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.backend_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            max_body_bytes: self.max_body_bytes,
            ..ClientSettings::default()
        }
    }
}
