//! Locating config layer files on disk.

use super::{ConfigLayerSource, DEFAULT_CONFIG_FILE, LayeredConfigOptions};
use crate::{ConfigError, DEFAULT_HOME_DIR};
use directories::UserDirs;
use log::debug;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

/// A layer file that may be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Candidate {
    pub(super) source: ConfigLayerSource,
    pub(super) path: PathBuf,
    /// Runtime overrides must exist; discovered layers are optional.
    pub(super) required: bool,
}

/// `~/.ctxvault/ctxvault.json5`, if a home directory is known.
pub(super) fn default_user_config_path() -> Option<PathBuf> {
    let dirs = UserDirs::new()?;
    Some(
        dirs.home_dir()
            .join(DEFAULT_HOME_DIR)
            .join(DEFAULT_CONFIG_FILE),
    )
}

/// Candidate layers in precedence order (lowest first), with duplicates of
/// the same file removed.
pub(super) fn candidates(options: &LayeredConfigOptions) -> Result<Vec<Candidate>, ConfigError> {
    let cwd = canonical_or_self(&options.cwd)
        .map_err(|err| ConfigError::read(&options.cwd, err))?;

    let mut found = Vec::new();
    if let Some(path) = &options.user_config_path {
        found.push(optional(ConfigLayerSource::User, path.clone()));
    }
    if let Some(project_root) = project_root(&cwd, &options.project_root_markers) {
        debug!("project root detected (path={})", project_root.display());
        found.push(optional(
            ConfigLayerSource::Project,
            project_root.join(DEFAULT_CONFIG_FILE),
        ));
    }
    found.push(optional(ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE)));
    found.extend(options.runtime_paths.iter().map(|path| Candidate {
        source: ConfigLayerSource::Runtime,
        path: path.clone(),
        required: true,
    }));

    let mut seen = HashSet::new();
    found.retain(|candidate| {
        let key = canonical_or_self(&candidate.path).unwrap_or_else(|_| candidate.path.clone());
        let fresh = seen.insert(key);
        if !fresh {
            debug!(
                "skipping duplicate config layer (source={}, path={})",
                candidate.source,
                candidate.path.display()
            );
        }
        fresh
    });
    Ok(found)
}

fn optional(source: ConfigLayerSource, path: PathBuf) -> Candidate {
    Candidate {
        source,
        path,
        required: false,
    }
}

/// Closest ancestor of `cwd` holding any of `markers`.
fn project_root(cwd: &Path, markers: &[String]) -> Option<PathBuf> {
    cwd.ancestors()
        .find(|dir| markers.iter().any(|marker| dir.join(marker).exists()))
        .map(Path::to_path_buf)
}

/// Canonical form of `path`; a path that does not exist yet is kept as is.
fn canonical_or_self(path: &Path) -> io::Result<PathBuf> {
    match path.canonicalize() {
        Ok(path) => Ok(path),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(err) => Err(err),
    }
}
