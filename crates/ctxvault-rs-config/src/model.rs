//! Configuration schema for ctxvault.

use crate::ConfigError;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory under the home directory holding ctxvault state.
pub const DEFAULT_HOME_DIR: &str = ".ctxvault";
/// Sub-directory of the home dir holding live records.
pub const DEFAULT_RECORDS_DIR: &str = "contexts";

/// Root config for a context vault.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VaultConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl VaultConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> VaultConfigBuilder {
        VaultConfigBuilder::new()
    }
}

/// Builder for assembling a `VaultConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct VaultConfigBuilder {
    config: VaultConfig,
}

impl VaultConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: VaultConfig::default(),
        }
    }

    /// Set the directory holding live records.
    pub fn root(mut self, root: impl AsRef<Path>) -> Self {
        self.config.storage.root = Some(root.as_ref().to_string_lossy().to_string());
        self
    }

    /// Replace the storage configuration.
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.config.storage = storage;
        self
    }

    /// Replace the retry configuration.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Replace the search configuration.
    pub fn search(mut self, search: SearchConfig) -> Self {
        self.config.search = search;
        self
    }

    /// Finalize and return the built `VaultConfig`.
    pub fn build(self) -> VaultConfig {
        self.config
    }
}

/// Where records and their backups live on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Directory for live record files. Relative paths resolve against the
    /// working directory; `None` means `~/.ctxvault/contexts`.
    #[serde(default)]
    pub root: Option<String>,
    /// Name of the backup namespace inside `root`.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            backup_dir: default_backup_dir(),
        }
    }
}

impl StorageConfig {
    /// Resolve the live record directory for the given working directory.
    pub fn resolve_root(&self, cwd: &Path) -> PathBuf {
        match self.root.as_deref() {
            Some(root) => {
                let root = PathBuf::from(root);
                if root.is_absolute() {
                    root
                } else {
                    cwd.join(root)
                }
            }
            None => default_records_root(cwd),
        }
    }
}

/// Check that `name` is a single directory component inside the record root.
///
/// Empty names, `.`, `..`, and anything with a path separator would put
/// backups in the live namespace or outside the root.
pub fn validate_backup_dir(name: &str) -> Result<(), ConfigError> {
    if matches!(name, "" | "." | "..") || name.contains(['/', '\\']) {
        return Err(ConfigError::Invalid(format!(
            "storage.backup_dir must be a plain directory name (got {name:?})"
        )));
    }
    Ok(())
}

fn default_backup_dir() -> String {
    ".backups".to_string()
}

/// Default record directory under the home dir, falling back to `cwd`.
fn default_records_root(cwd: &Path) -> PathBuf {
    let base = BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| cwd.to_path_buf());
    base.join(DEFAULT_HOME_DIR).join(DEFAULT_RECORDS_DIR)
}

/// Bounded retry settings for transient I/O failures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `base_delay_ms * n` before retrying.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Base delay as a `Duration`.
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    100
}

/// Search defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    /// Result cap for tag and full-text search when the caller sets none.
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
        }
    }
}

fn default_search_limit() -> usize {
    50
}
