//! Point-in-time snapshots of live records.
//!
//! Backups are append-only files named `{id}.{timestamp_ms}.backup.json`
//! inside a dedicated directory. Nothing here deletes a backup.

use crate::error::StoreError;
use crate::fsio;
use crate::recovery::{RecoveryOutcome, RecoveryState, Restored};
use crate::retry::RetryExecutor;
use crate::store::{decode_record, encode_record, record_path};
use ctxvault_rs_protocol::{
    ContextRecord, StoreEvent, StoreEventSink, StoreOperation, now_millis,
};
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name suffix shared by every backup.
pub const BACKUP_SUFFIX: &str = ".backup.json";

/// One backup file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    /// Record id the snapshot belongs to.
    pub id: String,
    /// Snapshot time in epoch milliseconds.
    pub timestamp: i64,
    /// Location of the snapshot.
    pub path: PathBuf,
}

/// Creates, lists, and restores backups for a record directory.
pub struct BackupManager {
    records_root: PathBuf,
    backups_root: PathBuf,
    retry: RetryExecutor,
    sink: Arc<dyn StoreEventSink>,
}

impl BackupManager {
    /// Manage backups under `backups_root` for records in `records_root`.
    pub fn new(
        records_root: impl Into<PathBuf>,
        backups_root: impl Into<PathBuf>,
        retry: RetryExecutor,
        sink: Arc<dyn StoreEventSink>,
    ) -> Self {
        Self {
            records_root: records_root.into(),
            backups_root: backups_root.into(),
            retry,
            sink,
        }
    }

    /// Directory holding backup files.
    pub fn backups_root(&self) -> &Path {
        &self.backups_root
    }

    /// Snapshot the current live bytes of `id`.
    ///
    /// Returns `None` when there is nothing to back up or the snapshot failed.
    /// Failures are logged and emitted as `BackupFailed`, never returned, so
    /// the caller's save or delete proceeds.
    pub fn backup(&self, id: &str) -> Option<BackupEntry> {
        match self.try_backup(id) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("backup failed; continuing without snapshot (id={id}): {err}");
                self.sink.emit(StoreEvent::BackupFailed {
                    id: id.to_string(),
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    fn try_backup(&self, id: &str) -> Result<Option<BackupEntry>, StoreError> {
        let live = record_path(&self.records_root, id);
        let Some(bytes) = self
            .retry
            .run(StoreOperation::Backup, &live, || fsio::read_optional(&live))?
        else {
            debug!("nothing to back up (id={id})");
            return Ok(None);
        };
        self.retry
            .run(StoreOperation::Backup, &self.backups_root, || {
                fs::create_dir_all(&self.backups_root)
            })?;

        // Same-millisecond snapshots take the next free timestamp.
        let mut timestamp = now_millis();
        loop {
            let path = self.backup_path(id, timestamp);
            let created = self
                .retry
                .run(StoreOperation::Backup, &path, || fsio::write_new(&path, &bytes))?;
            if created {
                debug!(
                    "backup created (id={id}, timestamp={timestamp}, bytes={})",
                    bytes.len()
                );
                self.sink.emit(StoreEvent::BackupCreated {
                    id: id.to_string(),
                    timestamp,
                });
                return Ok(Some(BackupEntry {
                    id: id.to_string(),
                    timestamp,
                    path,
                }));
            }
            timestamp += 1;
        }
    }

    /// All backups for `id`, most recent first.
    pub fn list_backups(&self, id: &str) -> Result<Vec<BackupEntry>, StoreError> {
        let names = self
            .retry
            .run(StoreOperation::Restore, &self.backups_root, || {
                read_dir_names(&self.backups_root)
            })?;
        let mut entries: Vec<BackupEntry> = names
            .into_iter()
            .filter_map(|name| {
                let timestamp = parse_backup_timestamp(id, &name)?;
                Some(BackupEntry {
                    id: id.to_string(),
                    timestamp,
                    path: self.backups_root.join(name),
                })
            })
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    /// Restore the newest backup of `id` that validates, writing it back to
    /// the live location. Returns `None` if no backup validates.
    pub fn restore_latest_valid(&self, id: &str) -> Result<Option<Restored>, StoreError> {
        match self.recover(id, "restore requested")? {
            RecoveryOutcome::Restored(restored) => Ok(Some(restored)),
            RecoveryOutcome::Failed { .. } => Ok(None),
        }
    }

    /// Run the recovery state machine for a record whose live bytes were
    /// rejected for `reason`.
    pub(crate) fn recover(&self, id: &str, reason: &str) -> Result<RecoveryOutcome, StoreError> {
        let candidates = self.list_backups(id)?;
        debug!(
            "starting recovery (id={id}, candidates={}, reason={reason})",
            candidates.len()
        );
        let outcome =
            RecoveryState::corrupted(reason, candidates).drive(|entry| self.probe(entry));
        if let RecoveryOutcome::Restored(restored) = &outcome {
            self.write_back(restored)?;
        }
        Ok(outcome)
    }

    fn probe(&self, entry: &BackupEntry) -> Result<ContextRecord, String> {
        let bytes = self
            .retry
            .run(StoreOperation::Restore, &entry.path, || {
                fsio::read_optional(&entry.path)
            })
            .map_err(|err| err.to_string())?
            .ok_or_else(|| "backup disappeared".to_string())?;
        decode_record(&entry.id, &bytes)
    }

    fn write_back(&self, restored: &Restored) -> Result<(), StoreError> {
        let id = &restored.record.id;
        let live = record_path(&self.records_root, id);
        let bytes = encode_record(&restored.record)?;
        self.retry
            .run(StoreOperation::Restore, &live, || fsio::write_atomic(&live, &bytes))?;
        info!(
            "record restored from backup (id={id}, backup_timestamp={}, backups_tried={})",
            restored.backup.timestamp, restored.backups_tried
        );
        self.sink.emit(StoreEvent::RecordRecovered {
            id: id.clone(),
            backup_timestamp: restored.backup.timestamp,
            backups_tried: restored.backups_tried,
        });
        Ok(())
    }

    fn backup_path(&self, id: &str, timestamp: i64) -> PathBuf {
        self.backups_root.join(format!("{id}.{timestamp}{BACKUP_SUFFIX}"))
    }
}

/// File names in `dir`; a missing directory has none.
fn read_dir_names(dir: &Path) -> io::Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };
    let mut names = Vec::new();
    for entry in entries {
        if let Some(name) = entry?.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Timestamp of a backup file name belonging to exactly `id`.
fn parse_backup_timestamp(id: &str, name: &str) -> Option<i64> {
    name.strip_prefix(id)?
        .strip_prefix('.')?
        .strip_suffix(BACKUP_SUFFIX)?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::{BackupManager, parse_backup_timestamp};
    use crate::retry::{RetryExecutor, RetryPolicy};
    use crate::store::record_path;
    use ctxvault_rs_protocol::{ContextRecord, StoreEvent};
    use ctxvault_rs_test_utils::{RecordingSink, corrupt_file, fast_retry_config};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn manager(root: &Path) -> (BackupManager, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let retry = RetryExecutor::new(RetryPolicy::from(fast_retry_config()), sink.clone());
        let manager = BackupManager::new(root, root.join(".backups"), retry, sink.clone());
        (manager, sink)
    }

    fn write_live(root: &Path, record: &ContextRecord) {
        let bytes = serde_json::to_vec(record).expect("encode");
        fs::write(record_path(root, &record.id), bytes).expect("write live");
    }

    #[test]
    fn parse_rejects_other_ids_and_suffixes() {
        assert_eq!(parse_backup_timestamp("a", "a.123.backup.json"), Some(123));
        assert_eq!(parse_backup_timestamp("a", "a.b.123.backup.json"), None);
        assert_eq!(parse_backup_timestamp("a", "ab.123.backup.json"), None);
        assert_eq!(parse_backup_timestamp("a", "a.123.json"), None);
        assert_eq!(
            parse_backup_timestamp("a.b", "a.b.123.backup.json"),
            Some(123)
        );
    }

    #[test]
    fn backup_of_missing_record_is_a_noop() {
        let temp = tempdir().expect("tempdir");
        let (manager, sink) = manager(temp.path());
        assert_eq!(manager.backup("ghost"), None);
        assert!(sink.events().is_empty());
        assert!(!manager.backups_root().exists());
    }

    #[test]
    fn backups_accumulate_newest_first() {
        let temp = tempdir().expect("tempdir");
        let (manager, sink) = manager(temp.path());
        let record = ContextRecord::new("v1", "").with_id("a");
        write_live(temp.path(), &record);

        let first = manager.backup("a").expect("first backup");
        let second = manager.backup("a").expect("second backup");
        let third = manager.backup("a").expect("third backup");
        assert!(first.timestamp < second.timestamp);
        assert!(second.timestamp < third.timestamp);

        let listed = manager.list_backups("a").expect("list");
        assert_eq!(listed, vec![third, second, first]);
        assert_eq!(
            sink.count(|event| matches!(event, StoreEvent::BackupCreated { .. })),
            3
        );
    }

    #[test]
    fn restore_skips_invalid_backups_and_rewrites_live() {
        let temp = tempdir().expect("tempdir");
        let (manager, sink) = manager(temp.path());
        let good = ContextRecord::new("good", "kept").with_id("a");
        write_live(temp.path(), &good);
        let older = manager.backup("a").expect("good backup");

        let newer = manager.backup("a").expect("newer backup");
        corrupt_file(&newer.path);
        corrupt_file(&record_path(temp.path(), "a"));

        let restored = manager
            .restore_latest_valid("a")
            .expect("restore")
            .expect("valid backup");
        assert_eq!(restored.record, good);
        assert_eq!(restored.backup, older);
        assert_eq!(restored.backups_tried, 2);

        let live = fs::read(record_path(temp.path(), "a")).expect("live");
        let live: ContextRecord = serde_json::from_slice(&live).expect("live parses");
        assert_eq!(live, good);
        assert_eq!(
            sink.count(|event| matches!(event, StoreEvent::RecordRecovered { .. })),
            1
        );
    }

    #[test]
    fn restore_without_backups_returns_none() {
        let temp = tempdir().expect("tempdir");
        let (manager, _sink) = manager(temp.path());
        assert_eq!(manager.restore_latest_valid("a").expect("restore"), None);
    }
}
