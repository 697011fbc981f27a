//! Application settings and paths.
//!
//! Manages XDG-compliant paths for configuration and data, and the settings
//! file that tells the engine where the scanning tool and the state live.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application directory paths following XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/recon)
    pub config_dir: PathBuf,
    /// Data directory (~/.local/share/recon)
    pub data_dir: PathBuf,
}

impl Paths {
    /// Resolve paths using XDG directories, creating them if needed.
    pub fn resolve() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "recon", "recon").ok_or(ConfigError::DirectoryNotFound)?;

        let paths = Self {
            config_dir: project.config_dir().to_path_buf(),
            data_dir: project.data_dir().to_path_buf(),
        };

        fs::create_dir_all(&paths.config_dir)?;
        fs::create_dir_all(&paths.data_dir)?;

        Ok(paths)
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Default root for scan output folders.
    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join("scans")
    }

    /// Default state store file.
    pub fn store_file(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Scanning tool executable, looked up on `PATH` when not absolute.
    pub tool_path: String,
    /// Root of per-category output folders. Defaults to the data directory.
    pub output_dir: Option<PathBuf>,
    /// State store file. Defaults to the data directory.
    pub store_file: Option<PathBuf>,
    /// Persist targets and hosts. When `false` the engine runs degraded.
    pub store_enabled: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            tool_path: "nmap".to_string(),
            output_dir: None,
            store_file: None,
            store_enabled: true,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, falling back to defaults.
    pub fn load(paths: &Paths) -> ConfigResult<Self> {
        let file = paths.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Effective output root.
    pub fn output_dir(&self, paths: &Paths) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| paths.output_dir())
    }

    /// Effective store file.
    pub fn store_file(&self, paths: &Paths) -> PathBuf {
        self.store_file
            .clone()
            .unwrap_or_else(|| paths.store_file())
    }
}
