//! Application state shared by every command.

use anyhow::Context;
use dehasher_core::AppConfig;
use dehasher_db::Database;
use dehasher_vault::{salt_path_for, KdfParams, KeyStore};
use std::path::{Path, PathBuf};

/// Loaded configuration plus the open local database.
#[derive(Debug)]
pub struct AppState {
    /// Effective configuration (file, environment and flag overrides)
    pub config: AppConfig,
    /// Location of the local database
    pub db_path: PathBuf,
    /// Open, migrated local database
    pub database: Database,
}

impl AppState {
    /// Load configuration and open the database.
    ///
    /// `db_override` takes precedence over the configured database path.
    pub async fn load(config_path: Option<&Path>, db_override: Option<&Path>) -> anyhow::Result<Self> {
        let config =
            AppConfig::load_with_env(config_path).context("failed to load configuration")?;
        Self::open(config, db_override).await
    }

    /// Open the database for an already loaded configuration.
    pub async fn open(mut config: AppConfig, db_override: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = db_override {
            config.storage.database_path = Some(path.to_path_buf());
        }

        let db_path = config
            .database_path()
            .context("failed to resolve database location")?;
        tracing::debug!("Database path: {}", db_path.display());

        let database = Database::open(&db_path)
            .await
            .with_context(|| format!("failed to open database at {}", db_path.display()))?;

        Ok(Self {
            config,
            db_path,
            database,
        })
    }

    /// Open the encrypted API key store next to the database.
    pub async fn key_store(&self) -> anyhow::Result<KeyStore> {
        let params = KdfParams::from(&self.config.vault);
        KeyStore::open(self.database.clone(), salt_path_for(&self.db_path), params)
            .await
            .context("failed to open API key store")
    }

    /// Close the database pool.
    pub async fn close(self) {
        self.database.close().await;
    }
}
