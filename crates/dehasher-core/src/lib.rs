//! Dehasher Core - Foundation crate for the dehasher OSINT toolkit.
//!
//! This crate provides the shared record types, error handling and configuration
//! management that the storage, export and search crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Breach records, credential pairs, export formats and timestamps
//!
//! # Example
//!
//! ```rust
//! use dehasher_core::{AppConfig, OutputFormat};
//!
//! let config = AppConfig::default();
//! assert_eq!(config.search.default_max_records, 30_000);
//! assert_eq!(config.export.default_format, OutputFormat::Json);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    ApiConfig, AppConfig, ExportConfig, LoggingConfig, SearchConfig, StorageConfig, VaultConfig,
};
pub use error::{ConfigError, ConfigResult, DehasherError, Result};
pub use types::{BreachRecord, Credential, OutputFormat};
