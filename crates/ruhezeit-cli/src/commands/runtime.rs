use anyhow::{Context, Result};
use ruhezeit_ai::AiCapabilities;
use ruhezeit_core::config::default_config_path;
use ruhezeit_core::{Extension, Hosts, LocalHost, Settings, SystemClock};
use ruhezeit_storage::{Database, KeyValueStore, SessionStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Extension instance backed by the local database and a tabs snapshot
pub struct Runtime {
    pub ext: Extension,
    pub host: Arc<LocalHost>,
}

impl Runtime {
    /// Open the default database and settings file
    pub async fn open(tabs: Option<PathBuf>) -> Result<Self> {
        let settings = Settings::load(&default_config_path()?)?;
        let db = Database::new(None).context("Failed to open database")?;
        Self::with_database(db, tabs, &settings).await
    }

    /// Wire an extension on top of `db`, resuming any unfinished session
    pub async fn with_database(
        db: Database,
        tabs: Option<PathBuf>,
        settings: &Settings,
    ) -> Result<Self> {
        let kv: Arc<dyn KeyValueStore> = Arc::new(db);
        let tokens = SessionStore::new(Arc::clone(&kv)).tokens().await?;
        let ai = AiCapabilities::from_tokens(&tokens, &settings.ai);

        let host = Arc::new(LocalHost::new(tabs, Arc::clone(&kv)));
        let hosts = Hosts {
            tabs: host.clone(),
            rules: host.clone(),
            kv,
            clock: Arc::new(SystemClock),
        };
        let ext = Extension::new(hosts, ai, settings);
        ext.controller.restore().await?;

        Ok(Self { ext, host })
    }

    #[cfg(test)]
    pub async fn in_memory(tabs: Option<PathBuf>) -> Self {
        Self::with_database(Database::open_in_memory().unwrap(), tabs, &Settings::default())
            .await
            .unwrap()
    }
}
