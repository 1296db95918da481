//! Classification of raw I/O failures.

use std::io;

/// Failure taxonomy for raw I/O errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Out of space or quota.
    DiskFull,
    /// Access refused by the OS or a read-only mount.
    PermissionDenied,
    /// The bytes are malformed at the I/O level.
    CorruptedData,
    /// Anything else; may succeed on retry.
    Transient,
}

/// Result of classifying an I/O error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Failure category.
    pub kind: FailureKind,
    /// Whether retrying the same call can help.
    pub recoverable: bool,
}

/// Classify an I/O error. Only `Transient` failures are recoverable.
pub fn classify(err: &io::Error) -> Classification {
    let kind = match err.kind() {
        io::ErrorKind::StorageFull | io::ErrorKind::QuotaExceeded => FailureKind::DiskFull,
        io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
            FailureKind::PermissionDenied
        }
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => FailureKind::CorruptedData,
        _ => FailureKind::Transient,
    };
    Classification {
        kind,
        recoverable: kind == FailureKind::Transient,
    }
}
