//! Configuration management for Mailweave

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MailweaveError, MailweaveResult};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Storage settings
    pub storage: StorageConfig,
    /// Import settings
    pub import: ImportConfig,
    /// Display settings
    pub display: DisplayConfig,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log level
    pub log_level: String,
    /// Data directory
    pub data_dir: PathBuf,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file; defaults to `<data_dir>/mailweave.db`
    pub database_path: Option<PathBuf>,
}

/// Import configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Look up persisted messages when a reply's parent is not in the current batch
    pub resolve_from_store: bool,
    /// Register resolved replies so replies to them in the same batch resolve too
    pub resolve_reply_chains: bool,
}

/// Display configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Thread name column width
    pub thread_name_width: usize,
    /// Sender column width
    pub sender_width: usize,
    /// Body column width
    pub body_width: usize,
    /// Date column width
    pub date_width: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            data_dir: crate::get_data_dir(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            resolve_from_store: true,
            resolve_reply_chains: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            thread_name_width: 20,
            sender_width: 20,
            body_width: 100,
            date_width: 10,
        }
    }
}

fn env_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl Config {
    /// Load configuration from file
    pub fn load(config_path: &Path) -> MailweaveResult<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            // Return default configuration
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, config_path: &Path) -> MailweaveResult<()> {
        // Ensure directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Override settings from `MAILWEAVE_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(log_level) = std::env::var("MAILWEAVE_LOG_LEVEL") {
            self.app.log_level = log_level;
        }

        if let Ok(data_dir) = std::env::var("MAILWEAVE_DATA_DIR") {
            self.app.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(database) = std::env::var("MAILWEAVE_DATABASE") {
            self.storage.database_path = Some(PathBuf::from(database));
        }

        if let Ok(from_store) = std::env::var("MAILWEAVE_RESOLVE_FROM_STORE") {
            self.import.resolve_from_store = env_flag(&from_store);
        }

        if let Ok(chains) = std::env::var("MAILWEAVE_RESOLVE_REPLY_CHAINS") {
            self.import.resolve_reply_chains = env_flag(&chains);
        }
    }

    /// Get the database file path
    pub fn database_file_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| self.app.data_dir.join(crate::DB_FILENAME))
    }

    /// Validate the configuration
    pub fn validate(&self) -> MailweaveResult<()> {
        if self.app.log_level.trim().is_empty() {
            return Err(MailweaveError::config("Log level cannot be empty"));
        }

        let display = &self.display;
        if display.thread_name_width == 0
            || display.sender_width == 0
            || display.body_width == 0
            || display.date_width == 0
        {
            return Err(MailweaveError::config("Display widths cannot be zero"));
        }

        Ok(())
    }
}
