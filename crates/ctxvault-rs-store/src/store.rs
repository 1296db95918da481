//! File-backed record store with backup-driven corruption recovery.
//!
//! Each record lives in `{root}/{id}.json`. Writes go through a temp file and
//! a rename, so a reader sees either the old or the new document. There is no
//! locking: concurrent saves of the same id are last-writer-wins.

use crate::backup::BackupManager;
use crate::error::StoreError;
use crate::fsio::{self, RECORD_EXTENSION};
use crate::recovery::RecoveryOutcome;
use crate::retry::{RetryExecutor, RetryPolicy};
use ctxvault_rs_config::{VaultConfig, validate_backup_dir};
use ctxvault_rs_protocol::{
    ContextRecord, StoreEvent, StoreEventSink, StoreOperation, now_millis, validate_id,
};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Persistent store abstraction for context records.
pub trait RecordStore: Send + Sync {
    /// Write a record, snapshotting any previous version first.
    ///
    /// Returns the record as persisted (timestamps filled in).
    fn save(&self, record: ContextRecord) -> Result<ContextRecord, StoreError>;
    /// Load a record by id; `None` if it does not exist.
    fn load(&self, id: &str) -> Result<Option<ContextRecord>, StoreError>;
    /// Every readable record, ordered by id.
    fn list(&self) -> Result<Vec<ContextRecord>, StoreError>;
    /// Remove a record; `false` if it did not exist.
    fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// JSON-file implementation of `RecordStore`.
pub struct FileRecordStore {
    root: PathBuf,
    backups: BackupManager,
    retry: RetryExecutor,
    sink: Arc<dyn StoreEventSink>,
}

impl FileRecordStore {
    /// Open (creating if needed) a store rooted at `root`, keeping backups in
    /// `root/backup_dir`. `backup_dir` must be a single directory name.
    pub fn new(
        root: impl AsRef<Path>,
        backup_dir: &str,
        policy: RetryPolicy,
        sink: Arc<dyn StoreEventSink>,
    ) -> Result<Self, StoreError> {
        validate_backup_dir(backup_dir)?;
        let root = root.as_ref().to_path_buf();
        let retry = RetryExecutor::new(policy, sink.clone());
        retry.run(StoreOperation::Save, &root, || fs::create_dir_all(&root))?;
        let backups = BackupManager::new(
            root.clone(),
            root.join(backup_dir),
            retry.clone(),
            sink.clone(),
        );
        info!("initialized file record store (root={})", root.display());
        Ok(Self {
            root,
            backups,
            retry,
            sink,
        })
    }

    /// Open a store using the storage and retry sections of `config`.
    pub fn from_config(
        config: &VaultConfig,
        cwd: &Path,
        sink: Arc<dyn StoreEventSink>,
    ) -> Result<Self, StoreError> {
        Self::new(
            config.storage.resolve_root(cwd),
            &config.storage.backup_dir,
            RetryPolicy::from(config.retry),
            sink,
        )
    }

    /// Directory holding live record files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Backup manager for this store.
    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Read and validate the live file for `id` without attempting recovery.
    fn read_live(&self, id: &str, operation: StoreOperation) -> Result<LiveRead, StoreError> {
        let path = record_path(&self.root, id);
        let bytes = match self
            .retry
            .run(operation, &path, || fsio::read_optional(&path))
        {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(LiveRead::Missing),
            Err(StoreError::UnreadableData { source, .. }) => {
                return Ok(LiveRead::Rejected(source.to_string()));
            }
            Err(err) => return Err(err),
        };
        Ok(match decode_record(id, &bytes) {
            Ok(record) => LiveRead::Valid(record),
            Err(reason) => LiveRead::Rejected(reason),
        })
    }

    fn recover(&self, id: &str, reason: String) -> Result<ContextRecord, StoreError> {
        warn!("record failed validation; trying backups (id={id}, reason={reason})");
        match self.backups.recover(id, &reason)? {
            RecoveryOutcome::Restored(restored) => Ok(restored.record),
            RecoveryOutcome::Failed {
                reason,
                backups_tried,
            } => Err(StoreError::Corrupted {
                id: id.to_string(),
                reason,
                backups_tried,
            }),
        }
    }
}

/// Outcome of reading a live record file.
enum LiveRead {
    Missing,
    Valid(ContextRecord),
    /// The bytes were rejected; the reason feeds backup recovery.
    Rejected(String),
}

impl RecordStore for FileRecordStore {
    /// An overwrite keeps the stored `created_at`; a first save keeps the
    /// caller's value if non-zero.
    fn save(&self, mut record: ContextRecord) -> Result<ContextRecord, StoreError> {
        record.validate()?;
        let path = record_path(&self.root, &record.id);
        let existed = path.is_file();
        if existed {
            if let LiveRead::Valid(previous) = self.read_live(&record.id, StoreOperation::Save)? {
                if previous.created_at > 0 {
                    record.created_at = previous.created_at;
                }
            }
        }
        let now = now_millis();
        if record.created_at <= 0 {
            record.created_at = now;
        }
        record.updated_at = now.max(record.created_at);
        let bytes = encode_record(&record)?;

        if existed {
            self.backups.backup(&record.id);
        }
        self.retry
            .run(StoreOperation::Save, &path, || fsio::write_atomic(&path, &bytes))?;
        debug!(
            "saved record (id={}, created={}, content_len={}, tags={})",
            record.id,
            !existed,
            record.content.len(),
            record.tags.len()
        );
        self.sink.emit(StoreEvent::RecordSaved {
            id: record.id.clone(),
            created: !existed,
        });
        Ok(record)
    }

    fn load(&self, id: &str) -> Result<Option<ContextRecord>, StoreError> {
        validate_id(id)?;
        match self.read_live(id, StoreOperation::Load)? {
            LiveRead::Missing => Ok(None),
            LiveRead::Valid(record) => Ok(Some(record)),
            LiveRead::Rejected(reason) => self.recover(id, reason).map(Some),
        }
    }

    /// Enumerate records independently. A rejected entry goes through backup
    /// recovery; if that fails for any reason the entry is reported as
    /// `RecordSkipped` and left out. Enumeration and read failures abort.
    fn list(&self) -> Result<Vec<ContextRecord>, StoreError> {
        let stems = self
            .retry
            .run(StoreOperation::List, &self.root, || {
                fsio::list_record_stems(&self.root)
            })?;
        let mut records = Vec::with_capacity(stems.len());
        for id in stems {
            if validate_id(&id).is_err() {
                continue;
            }
            let rejection = match self.read_live(&id, StoreOperation::List)? {
                LiveRead::Missing => {
                    debug!("record vanished during list (id={id})");
                    continue;
                }
                LiveRead::Valid(record) => {
                    records.push(record);
                    continue;
                }
                LiveRead::Rejected(reason) => reason,
            };
            match self.recover(&id, rejection) {
                Ok(record) => records.push(record),
                Err(err) => {
                    let reason = match err {
                        StoreError::Corrupted { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    warn!("skipping unrecoverable record (id={id}, reason={reason})");
                    self.sink.emit(StoreEvent::RecordSkipped { id, reason });
                }
            }
        }
        debug!("listed records (count={})", records.len());
        Ok(records)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        validate_id(id)?;
        let path = record_path(&self.root, id);
        if !path.is_file() {
            debug!("delete of missing record (id={id})");
            return Ok(false);
        }
        self.backups.backup(id);
        let removed = self
            .retry
            .run(StoreOperation::Delete, &path, || fsio::remove_optional(&path))?;
        if removed {
            info!("deleted record (id={id})");
            self.sink.emit(StoreEvent::RecordDeleted { id: id.to_string() });
        }
        Ok(removed)
    }
}

/// Live file location for `id` under `root`.
pub(crate) fn record_path(root: &Path, id: &str) -> PathBuf {
    root.join(format!("{id}.{RECORD_EXTENSION}"))
}

/// Parse and validate record bytes stored under `id`.
///
/// The error string explains why the bytes were rejected.
pub(crate) fn decode_record(id: &str, bytes: &[u8]) -> Result<ContextRecord, String> {
    let record: ContextRecord =
        serde_json::from_slice(bytes).map_err(|err| format!("parse error: {err}"))?;
    record.validate().map_err(|err| err.to_string())?;
    if record.id != id {
        return Err(format!(
            "id mismatch: file key {id} holds record {}",
            record.id
        ));
    }
    Ok(record)
}

/// Serialize a record in the on-disk format.
pub(crate) fn encode_record(record: &ContextRecord) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec_pretty(record).map_err(|source| StoreError::Encode {
        id: record.id.clone(),
        source,
    })
}
