use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resource::ResourceStore;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_RESOURCE_PREFIX: &str = "buses/";
pub const DEFAULT_RESOURCE_EXTENSION: &str = ".txt";

/// Problems with the client's own configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The endpoint has no host to connect to.
    #[error("Server host name must not be empty")]
    EmptyHost,

    /// Config file could not be read.
    #[error("Failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid settings JSON.
    #[error("Failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Server address a client is bound to for its whole life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, ConfigError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Client settings, read from a JSON file. Missing fields fall back to
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Directory that resource paths are resolved against
    pub resource_root: PathBuf,
    pub resource_prefix: String,
    pub resource_extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            resource_root: PathBuf::from("."),
            resource_prefix: DEFAULT_RESOURCE_PREFIX.to_string(),
            resource_extension: DEFAULT_RESOURCE_EXTENSION.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the per-user config file when no
    /// path is given. A missing per-user file means defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(config = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        Endpoint::new(self.host.clone(), self.port)
    }

    pub fn resource_store(&self) -> ResourceStore {
        ResourceStore::new(
            self.resource_root.clone(),
            self.resource_prefix.clone(),
            self.resource_extension.clone(),
        )
    }
}

/// `<config dir>/journey-client/config.json`, when the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("journey-client").join("config.json"))
}
