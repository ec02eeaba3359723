//! Configuration and workspace layout for learnbase.
//!
//! Stored in a machine-readable TOML file located at:
//!   %APPDATA%/Learnbase/config.toml on Windows
//!   $XDG_DATA_HOME/learnbase/config.toml on Linux
//!   ~/Library/Application Support/Learnbase/config.toml on macOS
//!
//! The config carries the administrator email and the daily coin allotment.
//! The workspace root holds one progression document per user plus the
//! append-only event log.

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Coins granted to every non-admin account on each new calendar day.
pub const DAILY_FREE_COINS: u32 = 5;

/// Root configuration persisted per installation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Email address of the administrator account. Compared exactly
    /// (case-sensitive) against the authenticated email.
    #[serde(default)]
    pub admin_email: Option<String>,
    /// Progression knobs (daily allotment override).
    #[serde(default)]
    pub progression: ProgressionSettings,
}

impl AppConfig {
    /// Resolves the effective admin email: `LEARNBASE_ADMIN_EMAIL` wins over
    /// the config file.
    pub fn effective_admin_email(&self) -> Option<String> {
        if let Ok(email) = env::var("LEARNBASE_ADMIN_EMAIL") {
            if !email.is_empty() {
                return Some(email);
            }
        }
        self.admin_email.clone()
    }
}

/// Progression-related preferences tied to the local install.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionSettings {
    /// Coins granted on each daily reset.
    #[serde(default = "default_daily_coins")]
    pub daily_coins: u32,
}

impl Default for ProgressionSettings {
    fn default() -> Self {
        Self {
            daily_coins: default_daily_coins(),
        }
    }
}

const fn default_daily_coins() -> u32 {
    DAILY_FREE_COINS
}

/// Returns the root directory where learnbase stores data.
///
/// Order of precedence:
/// 1. `LEARNBASE_HOME` environment variable.
/// 2. OS-specific data directory via `directories::BaseDirs`.
pub fn workspace_root() -> Result<PathBuf> {
    if let Ok(path) = env::var("LEARNBASE_HOME") {
        return Ok(PathBuf::from(path));
    }
    let base_dirs = BaseDirs::new().context("Unable to determine OS data directory")?;
    Ok(base_dirs.data_dir().join("Learnbase"))
}

/// Filesystem layout under a workspace root.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub users_dir: PathBuf,
    pub accounts_dir: PathBuf,
    pub catalog_dir: PathBuf,
}

impl WorkspacePaths {
    pub fn at(root: PathBuf) -> Self {
        let users_dir = root.join("users");
        let accounts_dir = root.join("accounts");
        let catalog_dir = root.join("catalog");
        Self {
            root,
            users_dir,
            accounts_dir,
            catalog_dir,
        }
    }

    pub fn events_path(&self) -> PathBuf {
        self.root.join("events.jsonl")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }
}

/// Ensures the workspace directories exist and returns their paths.
pub fn ensure_workspace_structure() -> Result<WorkspacePaths> {
    ensure_workspace_at(workspace_root()?)
}

/// Same as [`ensure_workspace_structure`] but rooted at an explicit path.
pub fn ensure_workspace_at(root: PathBuf) -> Result<WorkspacePaths> {
    let paths = WorkspacePaths::at(root);
    fs::create_dir_all(&paths.users_dir)
        .with_context(|| format!("Failed creating users dir {:?}", paths.users_dir))?;
    fs::create_dir_all(&paths.accounts_dir)?;
    fs::create_dir_all(&paths.catalog_dir)?;
    Ok(paths)
}

/// Loads the config from the workspace, falling back to defaults when the
/// file does not exist yet.
pub fn load_or_default(paths: &WorkspacePaths) -> Result<AppConfig> {
    let path = paths.config_path();
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let data = fs::read_to_string(&path)
        .with_context(|| format!("Failed reading config {:?}", path))?;
    let config = toml::from_str(&data)
        .with_context(|| format!("Failed parsing config {:?}", path))?;
    Ok(config)
}

pub fn save(paths: &WorkspacePaths, config: &AppConfig) -> Result<()> {
    let path = paths.config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = toml::to_string_pretty(config)?;
    fs::write(&path, data)?;
    Ok(())
}
