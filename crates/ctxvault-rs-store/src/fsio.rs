//! Low-level file helpers used inside retry closures.
//!
//! Expected absences are folded into the return value so they never reach
//! the error classifier.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Extension of live record files.
pub(crate) const RECORD_EXTENSION: &str = "json";

/// Read a whole file, returning `None` when it does not exist.
pub(crate) fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Remove a file, returning `false` when it was already gone.
pub(crate) fn remove_optional(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Write `bytes` to a hidden temp file next to `path`, then rename over it.
///
/// Readers see either the previous contents or the new ones, never a prefix.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let temp = write_temp_sibling(path, bytes)?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Like `write_atomic` but refuses to replace an existing file.
///
/// Returns `false` if `path` already exists.
pub(crate) fn write_new(path: &Path, bytes: &[u8]) -> io::Result<bool> {
    let temp = write_temp_sibling(path, bytes)?;
    match temp.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(err.error),
    }
}

fn write_temp_sibling(path: &Path, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let dir = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", path.display()),
        )
    })?;
    let mut temp = tempfile::Builder::new()
        .prefix(".ctxvault-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    Ok(temp)
}

/// File stems of visible `*.json` files directly under `dir`, sorted
/// ascending. Symlinks count when they resolve to a regular file, matching
/// what a direct read of the same id would see.
pub(crate) fn list_record_stems(dir: &Path) -> io::Result<Vec<String>> {
    let mut stems = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if stem.is_empty() || stem.starts_with('.') {
            continue;
        }
        stems.push(stem.to_string());
    }
    stems.sort();
    Ok(stems)
}
