//! Layered configuration loader.
//!
//! Layers are read in precedence order (user, project, cwd, runtime), each is
//! checked against the schema, and the merged document becomes a `VaultConfig`.

mod discovery;
mod merge;
mod schema;

#[cfg(test)]
mod tests;

use crate::{ConfigError, VaultConfig, validate_backup_dir};
use log::{debug, info};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the home, project, and cwd layers.
pub const DEFAULT_CONFIG_FILE: &str = "ctxvault.json5";
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];

/// Effective config plus the layers that produced it.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: VaultConfig,
    /// Contributing layers, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

/// Origin of a config layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    User,
    Project,
    Cwd,
    /// Explicit override files; applied last and required to exist.
    Runtime,
}

impl ConfigLayerSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigLayerSource::User => "user",
            ConfigLayerSource::Project => "project",
            ConfigLayerSource::Cwd => "cwd",
            ConfigLayerSource::Runtime => "runtime",
        }
    }
}

impl fmt::Display for ConfigLayerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A layer that was found and merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: PathBuf,
}

/// Where to look for layers.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Directory for the cwd layer and the start of the project root search.
    pub cwd: PathBuf,
    /// User layer; `None` skips it. Defaults to `~/.ctxvault/ctxvault.json5`.
    pub user_config_path: Option<PathBuf>,
    pub runtime_paths: Vec<PathBuf>,
    /// Entries whose presence marks a directory as the project root.
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: discovery::default_user_config_path(),
            runtime_paths: Vec::new(),
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }

    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl VaultConfig {
    /// Load one JSON5 file, without layering.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading vault config (path={})", path.display());
        let contents = fs::read_to_string(path).map_err(|err| ConfigError::read(path, err))?;
        let origin = path.display().to_string();
        decode(parse(&contents, &origin)?, &origin)
    }

    /// Load JSON5 text, without layering.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading vault config from text (len={})", contents.len());
        decode(parse(contents, "config")?, "config")
    }

    /// Load the layer stack rooted at `cwd` from the default locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load the layer stack described by `options`.
    ///
    /// Missing discovered layers are skipped; a missing runtime layer is an
    /// error. A file reachable through two layers is applied once.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let mut merged = Value::Object(serde_json::Map::new());
        let mut layers = Vec::new();

        for candidate in discovery::candidates(&options)? {
            if !candidate.required && !candidate.path.exists() {
                debug!(
                    "config layer absent (source={}, path={})",
                    candidate.source,
                    candidate.path.display()
                );
                continue;
            }
            let origin = format!("{}({})", candidate.source, candidate.path.display());
            let contents = fs::read_to_string(&candidate.path)
                .map_err(|err| ConfigError::read(&candidate.path, err))?;
            let value = parse(&contents, &origin)?;
            schema::check_layer(&value, &origin)?;
            merge::overlay(&mut merged, value);
            debug!("merged config layer ({origin})");
            layers.push(ConfigLayer {
                source: candidate.source,
                path: candidate.path,
            });
        }

        let config = decode(merged, "effective")?;
        info!("layered vault config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Cross-field rules that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.search.default_limit == 0 {
            return Err(ConfigError::Invalid(
                "search.default_limit must be at least 1".to_string(),
            ));
        }
        validate_backup_dir(&self.storage.backup_dir)
    }
}

fn parse(contents: &str, origin: &str) -> Result<Value, ConfigError> {
    json5::from_str(contents).map_err(|source| ConfigError::Parse {
        origin: origin.to_string(),
        source,
    })
}

fn decode(value: Value, origin: &str) -> Result<VaultConfig, ConfigError> {
    schema::check_layer(&value, origin)?;
    let config: VaultConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
