//! Public SDK surface for ctxvault.
//!
//! `ContextVault` ties a validated `VaultConfig` to a file-backed record store
//! and its searcher, exposing the operations the calling layer needs. The
//! building blocks are re-exported for consumers that want to assemble them
//! directly.

use ctxvault_rs_config::{ConfigError, SearchConfig, VaultConfig};
use ctxvault_rs_protocol::{ContextRecord, StoreErrorKind, StoreEventSink};
use ctxvault_rs_store::{
    BackupEntry, FileRecordStore, FullTextOptions, RecordSearcher, RecordStore, Restored,
    ScoredRecord, StoreError, TagQuery,
};
use log::info;
use std::path::Path;
use std::sync::Arc;

/// Re-export for convenience.
pub use ctxvault_rs_config as config;
/// Re-export for convenience.
pub use ctxvault_rs_protocol as protocol;
/// Re-export for convenience.
pub use ctxvault_rs_store as store;

/// Errors surfaced by the facade.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl VaultError {
    /// Store error kind, if this came from the store.
    pub fn store_kind(&self) -> Option<StoreErrorKind> {
        match self {
            VaultError::Store(err) => Some(err.kind()),
            VaultError::Config(_) => None,
        }
    }
}

/// Record store plus search, opened from configuration.
#[derive(Clone)]
pub struct ContextVault {
    store: Arc<FileRecordStore>,
    searcher: RecordSearcher,
}

impl ContextVault {
    /// Validate `config` and open the store it describes.
    ///
    /// A relative `storage.root` is resolved against `cwd`.
    pub fn open(
        config: &VaultConfig,
        cwd: impl AsRef<Path>,
        sink: Arc<dyn StoreEventSink>,
    ) -> Result<Self, VaultError> {
        config.validate()?;
        let store = FileRecordStore::from_config(config, cwd.as_ref(), sink)?;
        info!(
            "context vault opened (root={}, default_limit={})",
            store.root().display(),
            config.search.default_limit
        );
        Ok(Self::with_store(Arc::new(store), &config.search))
    }

    /// Wrap an already opened store.
    pub fn with_store(store: Arc<FileRecordStore>, search: &SearchConfig) -> Self {
        let searcher = RecordSearcher::with_default_limit(store.clone(), search.default_limit);
        Self { store, searcher }
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<FileRecordStore> {
        &self.store
    }

    pub fn save(&self, record: ContextRecord) -> Result<ContextRecord, VaultError> {
        Ok(self.store.save(record)?)
    }

    pub fn load(&self, id: &str) -> Result<Option<ContextRecord>, VaultError> {
        Ok(self.store.load(id)?)
    }

    pub fn list(&self) -> Result<Vec<ContextRecord>, VaultError> {
        Ok(self.store.list()?)
    }

    pub fn delete(&self, id: &str) -> Result<bool, VaultError> {
        Ok(self.store.delete(id)?)
    }

    /// Any-match tag search with pagination.
    pub fn search(&self, query: &TagQuery) -> Result<Vec<ContextRecord>, VaultError> {
        Ok(self.searcher.search(query)?)
    }

    /// Ranked full-text search; a blank query yields no results.
    pub fn search_full_text(
        &self,
        query: &str,
        options: &FullTextOptions,
    ) -> Result<Vec<ScoredRecord>, VaultError> {
        Ok(self.searcher.search_full_text(query, options)?)
    }

    /// Backups kept for `id`, most recent first.
    pub fn list_backups(&self, id: &str) -> Result<Vec<BackupEntry>, VaultError> {
        Ok(self.store.backups().list_backups(id)?)
    }

    /// Force the newest valid backup of `id` back into place.
    pub fn restore_latest_valid(&self, id: &str) -> Result<Option<Restored>, VaultError> {
        Ok(self.store.backups().restore_latest_valid(id)?)
    }
}

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
