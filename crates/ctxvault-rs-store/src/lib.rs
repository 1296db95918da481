//! File-backed persistence for context records: atomic writes, backups,
//! corruption recovery, retries, and search.

pub mod backup;
pub mod classify;
pub mod error;
mod fsio;
pub mod recovery;
pub mod retry;
pub mod search;
pub mod sink;
pub mod store;

/// Backup snapshots and their manager.
pub use backup::{BACKUP_SUFFIX, BackupEntry, BackupManager};
/// I/O failure classification.
pub use classify::{Classification, FailureKind, classify};
/// Store error type.
pub use error::StoreError;
/// Corruption recovery state machine.
pub use recovery::{RecoveryOutcome, RecoveryState, Restored};
/// Retry policy and executor.
pub use retry::{RetryExecutor, RetryPolicy};
/// Tag and full-text search.
pub use search::{
    CONTENT_WEIGHT, DEFAULT_SEARCH_LIMIT, FullTextOptions, RecordSearcher, ScoredRecord,
    SearchField, TITLE_WEIGHT, TagQuery,
};
/// Default logging event sink.
pub use sink::LogEventSink;
/// Record store interface and file implementation.
pub use store::{FileRecordStore, RecordStore};
