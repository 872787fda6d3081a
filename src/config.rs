use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::core::task::ScopeId;
use crate::{plog_debug, Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// JSON record store; defaults to ~/.taskpath/tasks.json.
    pub data_file: Option<String>,
    /// Scope used when a command does not name one.
    pub default_scope: Option<String>,
}

impl Config {
    pub fn taskpath_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".taskpath"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::taskpath_dir()?.join("taskpath.toml"))
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        match &self.data_file {
            Some(file) => Ok(expand_tilde(file)),
            None => Ok(Self::taskpath_dir()?.join("tasks.json")),
        }
    }

    /// Resolve the scope for a command, preferring the explicit one.
    pub fn scope_or_default(&self, explicit: Option<&str>) -> Result<ScopeId> {
        explicit
            .or(self.default_scope.as_deref())
            .map(ScopeId::from)
            .ok_or_else(|| {
                Error::Validation(
                    "no scope given and no default_scope configured".to_string(),
                )
            })
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        plog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            plog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(&path)?)?;
        plog_debug!(
            "Config loaded: data_file={:?}, default_scope={:?}",
            config.data_file,
            config.default_scope
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let dir = Self::taskpath_dir()?;
        if !dir.exists() {
            plog_debug!("Creating taskpath directory: {}", dir.display());
            fs::create_dir_all(&dir)?;
        }
        let path = Self::config_path()?;
        fs::write(&path, toml::to_string_pretty(self)?)?;
        plog_debug!("Config saved to {}", path.display());
        Ok(())
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
