//! Error types for the copy engine.
//!
//! The primary error type is `EngineError`. Errors on the source root or the
//! destination root are fatal to a run; everything else is a per-file error,
//! caught by the orchestrator and recorded in the CopyReport instead of
//! aborting the run.

use std::error::Error;
use std::fmt::{self, Display};
use std::io;
use std::path::PathBuf;

/// Errors produced while enumerating, copying, or verifying files.
///
/// `SourceNotFound` and `PermissionDenied` on the source root, and
/// `DirectoryCreationFailed` on the destination root, stop the run.
/// `ChecksumMismatch` counts against the retry budget like any other
/// per-file failure. `Cancelled` is never retried.
#[derive(Debug)]
pub enum EngineError {
    /// Source path does not exist
    SourceNotFound { path: PathBuf },

    /// Path is not readable or writable
    PermissionDenied { path: PathBuf, source: io::Error },

    /// Failed to read from a source file
    ReadError { path: PathBuf, source: io::Error },

    /// Failed to write to a destination file
    WriteError { path: PathBuf, source: io::Error },

    /// Write failed because the destination volume is out of space
    DiskFull { path: PathBuf, source: io::Error },

    /// Post-copy verification found differing digests
    ChecksumMismatch {
        path: PathBuf,
        source_checksum: String,
        dest_checksum: String,
    },

    /// Failed to create a destination directory
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    /// Failed to enumerate the source tree
    EnumerationFailed { path: PathBuf, source: io::Error },

    /// Every attempt for one file failed; wraps the last underlying error
    RetryExhausted {
        path: PathBuf,
        attempts: u32,
        source: Box<EngineError>,
    },

    /// The run was interrupted through its cancel token
    Cancelled,
}

impl Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceNotFound { path } => {
                write!(f, "Source path not found: {}", path.display())
            }
            Self::PermissionDenied { path, .. } => {
                write!(f, "Permission denied: {}", path.display())
            }
            Self::ReadError { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            Self::WriteError { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
            Self::DiskFull { path, .. } => {
                write!(f, "Destination out of space: {}", path.display())
            }
            Self::ChecksumMismatch {
                path,
                source_checksum,
                dest_checksum,
            } => {
                write!(
                    f,
                    "Checksum mismatch for {}: source {} != destination {}",
                    path.display(),
                    source_checksum,
                    dest_checksum
                )
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::EnumerationFailed { path, source } => {
                write!(
                    f,
                    "Failed to enumerate {}: {}",
                    path.display(),
                    source
                )
            }
            Self::RetryExhausted {
                path,
                attempts,
                source,
            } => {
                write!(
                    f,
                    "All {} attempts failed for {}: {}",
                    attempts,
                    path.display(),
                    source
                )
            }
            Self::Cancelled => write!(f, "Operation cancelled"),
        }
    }
}

impl Error for EngineError {}

impl EngineError {
    /// Extract the OS error code from this error, if available.
    pub fn raw_os_error(&self) -> Option<u32> {
        match self {
            Self::PermissionDenied { source, .. }
            | Self::ReadError { source, .. }
            | Self::WriteError { source, .. }
            | Self::DiskFull { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::EnumerationFailed { source, .. } => {
                source.raw_os_error().map(|e| e as u32)
            }
            Self::RetryExhausted { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

/// Map a write failure to `DiskFull` when the OS reports exhausted space,
/// `WriteError` otherwise.
pub(crate) fn classify_write_error(path: &std::path::Path, err: io::Error) -> EngineError {
    if is_disk_full(&err) {
        EngineError::DiskFull {
            path: path.to_path_buf(),
            source: err,
        }
    } else {
        EngineError::WriteError {
            path: path.to_path_buf(),
            source: err,
        }
    }
}

fn is_disk_full(err: &io::Error) -> bool {
    // ENOSPC on Unix; ERROR_HANDLE_DISK_FULL / ERROR_DISK_FULL on Windows.
    #[cfg(unix)]
    const DISK_FULL_CODES: &[i32] = &[28];
    #[cfg(windows)]
    const DISK_FULL_CODES: &[i32] = &[39, 112];
    #[cfg(not(any(unix, windows)))]
    const DISK_FULL_CODES: &[i32] = &[];

    err.raw_os_error()
        .map(|code| DISK_FULL_CODES.contains(&code))
        .unwrap_or(false)
}
