//! Configuration: a TOML file plus environment overrides
//!
//! Lookup order for the file: `--config`, then `ACCESSIONER_CONFIG`, then
//! `<config dir>/accessioner/config.toml`. Credentials and the network folder
//! can be supplied through the environment (a `.env` file is honored).

pub mod layout;

pub use layout::FolderLayout;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::scheduler::DailySchedule;

pub const ENV_CONFIG: &str = "ACCESSIONER_CONFIG";
pub const ENV_API_URL: &str = "ACCESSIONER_API_URL";
pub const ENV_API_USERNAME: &str = "ACCESSIONER_API_USERNAME";
pub const ENV_API_PASSWORD: &str = "ACCESSIONER_API_PASSWORD";
pub const ENV_NETWORK_FOLDER: &str = "ACCESSIONER_NETWORK_FOLDER";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub folders: FolderConfig,
    pub api: ApiConfig,
    pub sheets: SheetConfig,
    pub schedule: ScheduleConfig,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderConfig {
    pub network: Option<PathBuf>,
    pub logs: Option<PathBuf>,
    pub complete: Option<PathBuf>,
    pub errors: Option<PathBuf>,
    pub outputs: Option<PathBuf>,
    pub backups: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Agent recorded as event authorizer; defaults to the logged-in user
    pub event_authorizer: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            event_authorizer: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Leading rows skipped before data (template header + instructions)
    pub header_rows: usize,
    /// File extensions picked up from the network folder
    pub extensions: Vec<String>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            header_rows: 2,
            extensions: vec!["csv".to_string(), "xlsx".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Local time of day, HH:MM
    pub time: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            time: "09:00".to_string(),
        }
    }
}

/// What to do when an output spreadsheet already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputConflict {
    /// Write alongside with a timestamp suffix
    #[default]
    Suffix,
    /// Replace the existing file
    Overwrite,
    /// Leave the existing file and report an error
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub output_conflict: OutputConflict,
    /// Allow a run to start while another holds the run lock
    pub allow_overlap: bool,
    /// Age after which a leftover run lock is considered abandoned
    pub stale_lock_hours: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            output_conflict: OutputConflict::Suffix,
            allow_overlap: false,
            stale_lock_hours: 24,
        }
    }
}

/// API login details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("accessioner").join("config.toml"))
    }

    /// Load configuration and apply environment overrides
    ///
    /// An explicitly named file must exist. A missing default file yields the
    /// built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var(ENV_CONFIG).ok().map(PathBuf::from);
        let (path, required) = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(p) => (Some(p), true),
            None => (Self::default_path(), false),
        };

        let mut config = match path {
            Some(p) if p.exists() => {
                debug!("Loading config from {}", p.display());
                Self::from_file(&p)?
            }
            Some(p) if required => {
                anyhow::bail!("Config file does not exist: {}", p.display());
            }
            Some(p) => {
                warn!("No config file at {}, using defaults", p.display());
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse TOML")?;
        Ok(config)
    }

    /// Override values from environment variables (empty values are ignored)
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_API_URL) {
            self.api.url = Some(v);
        }
        if let Some(v) = get(ENV_API_USERNAME) {
            self.api.username = Some(v);
        }
        if let Some(v) = get(ENV_API_PASSWORD) {
            self.api.password = Some(v);
        }
        if let Some(v) = get(ENV_NETWORK_FOLDER) {
            self.folders.network = Some(PathBuf::from(v));
        }
    }

    pub fn layout(&self) -> Result<FolderLayout> {
        FolderLayout::from_config(&self.folders)
    }

    pub fn schedule(&self) -> Result<DailySchedule> {
        DailySchedule::parse(&self.schedule.time)
            .with_context(|| format!("Invalid schedule time: {}", self.schedule.time))
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.max(1))
    }

    /// Complete credentials, if every part is configured
    pub fn credentials(&self) -> Option<Credentials> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        Some(Credentials {
            url: non_empty(&self.api.url)?,
            username: non_empty(&self.api.username)?,
            password: non_empty(&self.api.password)?,
        })
    }
}
