use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use research_core::SessionSettings;
use research_logging::research_info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::logging::LogDestination;
use crate::cli::Cli;

const DEFAULT_CONFIG_FILENAME: &str = "research_client.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub result_display_delay_ms: u64,
    pub log_destination: LogDestination,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            result_display_delay_ms: 1500,
            log_destination: LogDestination::File,
        }
    }
}

impl ClientConfig {
    /// Loads `explicit` if given, else `./research_client.ron` if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILENAME);
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        research_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Command-line flags win over file values.
    pub fn apply_overrides(mut self, cli: &Cli) -> Self {
        if let Some(url) = &cli.url {
            self.base_url = url.clone();
        }
        if let Some(destination) = cli.log {
            self.log_destination = destination;
        }
        self
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            result_display_delay: Duration::from_millis(self.result_display_delay_ms),
        }
    }
}
