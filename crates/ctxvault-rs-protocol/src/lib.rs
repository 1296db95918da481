//! Shared types for ctxvault: the record model, error kinds, and store events.

mod record;

pub use record::{ContextRecord, RecordError, now_millis, validate_id};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Store operation that produced an event or error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StoreOperation {
    /// Writing a record.
    Save,
    /// Reading a record by id.
    Load,
    /// Enumerating records.
    List,
    /// Removing a record.
    Delete,
    /// Snapshotting a record before it changes.
    Backup,
    /// Writing a backup back to the live location.
    Restore,
}

impl StoreOperation {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            StoreOperation::Save => "save",
            StoreOperation::Load => "load",
            StoreOperation::List => "list",
            StoreOperation::Delete => "delete",
            StoreOperation::Backup => "backup",
            StoreOperation::Restore => "restore",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable error kind exposed to calling layers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum StoreErrorKind {
    /// Storage is out of space.
    DiskFull,
    /// The OS refused access.
    PermissionDenied,
    /// Record bytes are unreadable and no backup could replace them.
    CorruptedData,
    /// A transient failure outlived the retry budget.
    RetriesExhausted,
    /// The caller supplied a record or id that breaks the record invariant.
    InvalidRecord,
    /// Store settings are unusable.
    InvalidConfig,
}

impl StoreErrorKind {
    /// Stable kebab-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            StoreErrorKind::DiskFull => "disk-full",
            StoreErrorKind::PermissionDenied => "permission-denied",
            StoreErrorKind::CorruptedData => "corrupted-data",
            StoreErrorKind::RetriesExhausted => "retries-exhausted",
            StoreErrorKind::InvalidRecord => "invalid-record",
            StoreErrorKind::InvalidConfig => "invalid-config",
        }
    }
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side-channel events emitted by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum StoreEvent {
    /// A record was written.
    RecordSaved { id: String, created: bool },
    /// A record was removed.
    RecordDeleted { id: String },
    /// A snapshot of the previous bytes was taken.
    BackupCreated { id: String, timestamp: i64 },
    /// Snapshotting failed; the primary operation continued.
    BackupFailed { id: String, reason: String },
    /// A transient failure will be retried after a delay.
    RetryScheduled {
        operation: StoreOperation,
        attempt: u32,
        delay_ms: u64,
        reason: String,
    },
    /// A corrupted record was replaced by a backup.
    RecordRecovered {
        id: String,
        backup_timestamp: i64,
        backups_tried: usize,
    },
    /// A corrupted record had no usable backup and was left out of a listing.
    RecordSkipped { id: String, reason: String },
}

/// Sink interface for store events.
pub trait StoreEventSink: Send + Sync {
    /// Emit an event to downstream listeners.
    fn emit(&self, event: StoreEvent);
}
