//! Persisted session state.
//!
//! `login` writes a small JSON document holding the endpoint and the
//! credentials the backend returned; every other command loads it. Lives at
//! `$XDG_CONFIG_HOME/triage/current.json` (or the platform config dir).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no usable config directory on this platform")]
    NoConfigDir,
    #[error("config file invalid JSON: {0}")]
    Invalid(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Credentials and universe list as returned by the login RPC.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub universes: Vec<String>,
}

/// The on-disk session document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Session {
    pub config: Credentials,
    pub endpoint: String,
}

impl Session {
    /// True when a token is present; commands other than `login` require it.
    pub fn logged_in(&self) -> bool {
        self.config.token.is_some()
    }

    /// First universe in the session, used when the project argument does not
    /// name one explicitly.
    pub fn default_universe(&self) -> Option<&str> {
        self.config.universes.first().map(String::as_str)
    }

    /// Load the session, or `None` when no session file exists yet.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Persist the session, creating the config directory as needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, text)?;
        tracing::debug!(path = %path.display(), "session saved");
        Ok(())
    }

    /// Session file path. `XDG_CONFIG_HOME` wins over the platform default so
    /// tests can redirect it.
    pub fn path() -> Result<PathBuf, ConfigError> {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg).join("triage").join("current.json"));
        }
        dirs::config_dir()
            .map(|dir| dir.join("triage").join("current.json"))
            .ok_or(ConfigError::NoConfigDir)
    }
}
