use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::db::DB_FILE;
use crate::error::{ExpenseError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_top_limit")]
    pub top_limit: u32,
    /// Seed used by `seed` when none is passed on the command line.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_currency() -> String {
    "₹".to_string()
}

fn default_top_limit() -> u32 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            currency: default_currency(),
            top_limit: default_top_limit(),
            seed: None,
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("spendlens")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("spendlens")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

fn load_settings_from(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => Settings::default(),
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ExpenseError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

/// Database location: the `--db` override when given, else the data dir.
pub fn resolve_db_path(db_override: Option<&str>) -> PathBuf {
    match db_override {
        Some(p) => PathBuf::from(shellexpand_path(p)),
        None => get_data_dir().join(DB_FILE),
    }
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
