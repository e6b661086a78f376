//! Configuration management for dehasher.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use crate::types::OutputFormat;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the local database.
const DATABASE_FILE_NAME: &str = "dehasher.db";

/// Log directory name under the data directory.
const LOG_DIR_NAME: &str = "logs";

/// Main application configuration.
///
/// This is loaded from `~/.config/dehasher/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Breach-data provider API settings
    pub api: ApiConfig,
    /// Search run defaults
    pub search: SearchConfig,
    /// Local storage settings
    pub storage: StorageConfig,
    /// Key storage encryption settings
    pub vault: VaultConfig,
    /// Export defaults
    pub export: ExportConfig,
    /// Persistent log files
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults if not found.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// See [`AppConfig::apply_env_overrides`] for the supported variables.
    pub fn load_with_env(config_path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match config_path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `DEHASHER_API_URL`: Override the search endpoint
    /// - `DEHASHER_DB_PATH`: Override the database location
    /// - `DEHASHER_TIMEOUT_SECS`: Override the HTTP request timeout
    /// - `DEHASHER_LOG_DIR`: Override the log file directory
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DEHASHER_API_URL") {
            if !val.trim().is_empty() {
                tracing::debug!("Override api.endpoint from env: {}", val);
                self.api.endpoint = val;
            }
        }

        if let Ok(val) = std::env::var("DEHASHER_DB_PATH") {
            if !val.trim().is_empty() {
                tracing::debug!("Override storage.database_path from env: {}", val);
                self.storage.database_path = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = std::env::var("DEHASHER_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                if secs > 0 {
                    self.api.timeout_secs = secs;
                    tracing::debug!("Override api.timeout_secs from env: {}", secs);
                }
            }
        }

        if let Ok(val) = std::env::var("DEHASHER_LOG_DIR") {
            if !val.trim().is_empty() {
                tracing::debug!("Override logging.directory from env: {}", val);
                self.logging.directory = Some(PathBuf::from(val));
            }
        }
    }

    /// Reject values the rest of the toolkit cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.search.display_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.display_limit".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/dehasher/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/dehasher`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }

    /// Resolve where the local database lives.
    ///
    /// An explicit `database_path` wins, then `use_local_database` (current
    /// directory), then the XDG data directory.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.storage.database_path {
            return Ok(path.clone());
        }
        if self.storage.use_local_database {
            return Ok(PathBuf::from(DATABASE_FILE_NAME));
        }
        Ok(Self::data_dir()?.join(DATABASE_FILE_NAME))
    }

    /// Resolve where `info.log` and `error.log` are written.
    ///
    /// Returns `None` when file logging is disabled. An explicit
    /// `logging.directory` wins over `~/.local/share/dehasher/logs`.
    pub fn log_dir(&self) -> ConfigResult<Option<PathBuf>> {
        if !self.logging.enabled {
            return Ok(None);
        }
        match &self.logging.directory {
            Some(dir) => Ok(Some(dir.clone())),
            None => Ok(Some(Self::data_dir()?.join(LOG_DIR_NAME))),
        }
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("com", "crowsnest", "dehasher").ok_or(ConfigError::NoConfigDir)
}

/// Breach-data provider API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Search endpoint URL
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.dehashed.com/v2/search".to_string(),
            timeout_secs: 60,
            user_agent: format!("dehasher/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Search run defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Records requested when `--max-records` is not given
    pub default_max_records: i64,
    /// Remaining-record count above which the user must confirm the fetch
    pub large_fetch_threshold: u64,
    /// Maximum rows printed to the terminal after a run
    pub display_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_max_records: 30_000,
            large_fetch_threshold: 30_000,
            display_limit: 50,
        }
    }
}

/// Local storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Explicit database file path
    pub database_path: Option<PathBuf>,
    /// Keep the database in the current working directory
    pub use_local_database: bool,
}

/// Key storage encryption settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Argon2 memory cost in KB
    pub argon2_memory_kb: u32,
    /// Argon2 iteration count
    pub argon2_iterations: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            argon2_memory_kb: 65_536, // 64 MB
            argon2_iterations: 3,
        }
    }
}

/// Export defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Format used when `--format` is not given
    pub default_format: OutputFormat,
    /// Base file name (without extension) used when `--output` is not given
    pub default_file: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::Json,
            default_file: "query".to_string(),
        }
    }
}

/// Persistent log file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write JSON log files next to the terminal output
    pub enabled: bool,
    /// Directory for the log files
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
        }
    }
}
