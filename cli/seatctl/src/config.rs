//! Configuration and context management.
//!
//! Handles:
//! - Where the state file lives
//! - Log level and planner options
//! - Current context (active batch)
//!
//! The config file is JSON in the platform config directory. A few
//! environment variables override what the file says.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use seatplan_engine::PlanConfig;
use seatplan_roster::DEFAULT_ROOM_CAPACITY;
use serde::{Deserialize, Serialize};

/// Configuration file name.
const CONFIG_FILE: &str = "config.json";

/// State file name, inside the data directory.
const STATE_FILE: &str = "state.json";

pub const ENV_STATE_FILE: &str = "SEATCTL_STATE_FILE";
pub const ENV_LOG_LEVEL: &str = "SEATCTL_LOG_LEVEL";
pub const ENV_MAX_DEPTS: &str = "SEATCTL_MAX_DEPTS";

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("org", "seatplan", "seatctl")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// Get the config directory path.
fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// State file path. Defaults to `state.json` in the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,

    /// Log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Allocation planner options.
    #[serde(default)]
    pub planner: PlanConfig,

    /// Capacity for rooms created by `rooms init` and roster inference.
    #[serde(default = "default_room_capacity")]
    pub default_room_capacity: u32,

    /// Current context.
    #[serde(default)]
    pub context: CliContext,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_room_capacity() -> u32 {
    DEFAULT_ROOM_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_file: None,
            log_level: default_log_level(),
            planner: PlanConfig::default(),
            default_room_capacity: default_room_capacity(),
            context: CliContext::default(),
        }
    }
}

impl Config {
    /// Load config from disk (or defaults), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let config = Self::load_from(&config_dir()?.join(CONFIG_FILE))?;
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Load config from a specific file, or return defaults if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Apply overrides from `lookup` (the process environment in practice).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(path) = lookup(ENV_STATE_FILE).filter(|v| !v.is_empty()) {
            self.state_file = Some(PathBuf::from(path));
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.is_empty()) {
            self.log_level = level;
        }
        if let Some(max) = lookup(ENV_MAX_DEPTS).filter(|v| !v.is_empty()) {
            self.planner.max_departments_per_room = max
                .trim()
                .parse()
                .with_context(|| format!("{ENV_MAX_DEPTS} must be a positive integer, got {max:?}"))?;
        }
        Ok(self)
    }

    /// Resolved state file path.
    pub fn state_path(&self) -> Result<PathBuf> {
        match &self.state_file {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join(STATE_FILE)),
        }
    }

    /// Save config to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_dir()?.join(CONFIG_FILE))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).with_context(|| format!("Failed to write config to {:?}", path))
    }
}

/// Current CLI context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliContext {
    /// Active batch ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
}
