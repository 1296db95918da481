//! Error types for record store operations.

use crate::classify::{FailureKind, classify};
use ctxvault_rs_config::ConfigError;
use ctxvault_rs_protocol::{RecordError, StoreErrorKind, StoreOperation};
use std::io;
use std::path::PathBuf;

/// Errors returned by the record store, backup manager, and searcher.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Storage ran out of space. Never retried.
    #[error("disk full during {operation} at {}; free up space and try again: {source}", .path.display())]
    DiskFull {
        operation: StoreOperation,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The OS denied access. Never retried.
    #[error("permission denied during {operation} at {}: {source}", .path.display())]
    PermissionDenied {
        operation: StoreOperation,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The OS reported the bytes themselves as unreadable.
    #[error("unreadable data during {operation} at {}: {source}", .path.display())]
    UnreadableData {
        operation: StoreOperation,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A record failed validation and no backup could replace it.
    #[error("record {id} is corrupted and no valid backup was found (backups tried: {backups_tried}): {reason}")]
    Corrupted {
        id: String,
        reason: String,
        backups_tried: usize,
    },
    /// A transient failure persisted through every attempt.
    #[error("{operation} failed after {attempts} attempts at {}: {source}", .path.display())]
    RetriesExhausted {
        operation: StoreOperation,
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },
    /// The caller passed a record or id that breaks the record invariant.
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] RecordError),
    /// The store was opened with unusable settings.
    #[error("invalid store settings: {0}")]
    InvalidConfig(#[from] ConfigError),
    /// A record could not be encoded as JSON.
    #[error("failed to encode record {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Build the error for a failed I/O call after `attempts` tries.
    pub fn from_io(
        operation: StoreOperation,
        path: impl Into<PathBuf>,
        source: io::Error,
        attempts: u32,
    ) -> Self {
        let path = path.into();
        match classify(&source).kind {
            FailureKind::DiskFull => StoreError::DiskFull {
                operation,
                path,
                source,
            },
            FailureKind::PermissionDenied => StoreError::PermissionDenied {
                operation,
                path,
                source,
            },
            FailureKind::CorruptedData => StoreError::UnreadableData {
                operation,
                path,
                source,
            },
            FailureKind::Transient => StoreError::RetriesExhausted {
                operation,
                path,
                attempts,
                source,
            },
        }
    }

    /// Machine-readable kind for the calling layer.
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::DiskFull { .. } => StoreErrorKind::DiskFull,
            StoreError::PermissionDenied { .. } => StoreErrorKind::PermissionDenied,
            StoreError::UnreadableData { .. } | StoreError::Corrupted { .. } => {
                StoreErrorKind::CorruptedData
            }
            StoreError::RetriesExhausted { .. } => StoreErrorKind::RetriesExhausted,
            StoreError::InvalidRecord(_) | StoreError::Encode { .. } => {
                StoreErrorKind::InvalidRecord
            }
            StoreError::InvalidConfig(_) => StoreErrorKind::InvalidConfig,
        }
    }

    /// Whether repeating the call later could succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::RetriesExhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::StoreError;
    use ctxvault_rs_protocol::{RecordError, StoreErrorKind, StoreOperation};
    use pretty_assertions::assert_eq;
    use std::io;

    #[test]
    fn from_io_maps_classification_to_variant() {
        let err = StoreError::from_io(
            StoreOperation::Save,
            "/tmp/a.json",
            io::Error::from(io::ErrorKind::StorageFull),
            1,
        );
        assert_eq!(err.kind(), StoreErrorKind::DiskFull);
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("/tmp/a.json"));
        assert!(err.to_string().contains("free up space"));

        let err = StoreError::from_io(
            StoreOperation::Load,
            "/tmp/a.json",
            io::Error::from(io::ErrorKind::Interrupted),
            3,
        );
        assert_eq!(err.kind(), StoreErrorKind::RetriesExhausted);
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("after 3 attempts"));
    }

    #[test]
    fn corrupted_and_invalid_kinds() {
        let err = StoreError::Corrupted {
            id: "a".to_string(),
            reason: "parse error".to_string(),
            backups_tried: 0,
        };
        assert_eq!(err.kind(), StoreErrorKind::CorruptedData);
        assert!(err.to_string().contains("record a"));

        let err = StoreError::from(RecordError::EmptyId);
        assert_eq!(err.kind(), StoreErrorKind::InvalidRecord);
    }
}
