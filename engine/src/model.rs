//! Core data model for verified copy runs.
//!
//! This module defines the main data structures for representing a run:
//! - PathEntry: a single item discovered under the source root
//! - TransferTask: one file's copy job, including its terminal outcome
//! - TransferResult: the verified result of a successful attempt
//! - CopyReport: the aggregate outcome handed to the presentation layer
//! - OperationMode, TaskOutcome: enums controlling behavior

use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use crate::checksum::ChecksumValue;

/// A single item discovered under the source root.
///
/// Entries are produced by the tree walker and are immutable afterwards.
/// A single-file source yields exactly one entry with an empty relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    /// Absolute path of the item at the source
    pub source_path: PathBuf,

    /// Path relative to the source root (empty for a single-file source)
    pub relative_path: PathBuf,

    /// File size in bytes (0 for directories)
    pub file_size: u64,

    /// True if this item is a directory
    pub is_dir: bool,
}

impl PathEntry {
    /// Resolve where this entry lands under a destination root.
    ///
    /// An empty relative path resolves to the root itself, which is how a
    /// single-file source maps onto its destination path.
    pub fn destination_under(&self, destination_root: &Path) -> PathBuf {
        if self.relative_path.as_os_str().is_empty() {
            destination_root.to_path_buf()
        } else {
            destination_root.join(&self.relative_path)
        }
    }

    /// File name of the entry, for display.
    pub fn display_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.to_string_lossy().into_owned())
    }
}

/// The terminal state of a single transfer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Not yet processed
    Pending,
    /// Copied and checksum-verified
    Succeeded,
    /// All attempts failed
    Failed,
}

impl TaskOutcome {
    /// Returns true if this outcome is terminal (no further changes expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded | TaskOutcome::Failed)
    }
}

/// One file's copy job.
///
/// Owned by the orchestrator for its lifetime; the outcome only becomes
/// `Succeeded` when source and destination checksums matched bit-for-bit.
#[derive(Debug)]
pub struct TransferTask {
    /// Unique identifier for this task within the run
    pub id: Uuid,

    /// The source item being copied
    pub entry: PathEntry,

    /// Resolved absolute destination path
    pub destination_path: PathBuf,

    /// Number of attempts actually made (0 until the first attempt finishes)
    pub attempts: u32,

    /// Current outcome
    pub outcome: TaskOutcome,

    /// Result of the successful attempt, if any
    pub result: Option<TransferResult>,

    /// Message of the last error, if the task failed
    pub error_message: Option<String>,
}

impl TransferTask {
    /// Create a pending task for an entry and its resolved destination.
    pub fn new(entry: PathEntry, destination_path: PathBuf) -> Self {
        TransferTask {
            id: Uuid::new_v4(),
            entry,
            destination_path,
            attempts: 0,
            outcome: TaskOutcome::Pending,
            result: None,
            error_message: None,
        }
    }
}

/// The verified result of one successful copy attempt.
#[derive(Debug, Clone)]
pub struct TransferResult {
    /// Bytes written to the destination
    pub bytes_written: u64,

    /// Wall-clock duration of the attempt, including verification
    pub elapsed: Duration,

    /// Digest of the source file
    pub source_checksum: ChecksumValue,

    /// Digest of the destination file, computed after the write
    pub dest_checksum: ChecksumValue,

    /// True when the two digests matched
    pub verified: bool,
}

/// What a run does with the enumerated source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Copy every enumerated file
    CopyAll,
    /// Report files absent or mismatched at the destination; copy nothing
    ListMissing,
    /// Copy only files absent or mismatched at the destination
    CopyMissingOnly,
}

impl std::fmt::Display for OperationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationMode::CopyAll => write!(f, "Copy"),
            OperationMode::ListMissing => write!(f, "List missing"),
            OperationMode::CopyMissingOnly => write!(f, "Copy missing"),
        }
    }
}

/// A failed file recorded in the final report.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    /// Absolute source path of the failed item
    pub source_path: PathBuf,

    /// Path relative to the source root
    pub relative_path: PathBuf,

    /// Message of the last error for this item
    pub error: String,
}

/// Aggregate result across all tasks of one run.
///
/// Built incrementally by the orchestrator and finalized at the end of the
/// run; the presentation layer derives all user-visible output from it.
#[derive(Debug)]
pub struct CopyReport {
    /// Mode the run executed in
    pub mode: OperationMode,

    /// Files copied and verified
    pub files_succeeded: u64,

    /// Files that exhausted their retry budget
    pub files_failed: u64,

    /// Files not attempted because the destination already matched
    /// (or, in ListMissing mode, because nothing is copied)
    pub files_skipped: u64,

    /// Total bytes written across succeeded files
    pub bytes_copied: u64,

    /// Wall-clock duration of the whole run
    pub elapsed: Duration,

    /// Every failed file with its last error
    pub failures: Vec<FailureRecord>,

    /// The resolved missing set (populated by the missing-set modes)
    pub missing: Vec<PathEntry>,

    /// True if the run was cancelled before processing every file
    pub cancelled: bool,
}

impl CopyReport {
    /// Create an empty report for a run in the given mode.
    pub fn new(mode: OperationMode) -> Self {
        CopyReport {
            mode,
            files_succeeded: 0,
            files_failed: 0,
            files_skipped: 0,
            bytes_copied: 0,
            elapsed: Duration::ZERO,
            failures: Vec::new(),
            missing: Vec::new(),
            cancelled: false,
        }
    }

    /// True when every requested file succeeded.
    pub fn overall_success(&self) -> bool {
        self.files_failed == 0
    }
}
