//! # VCopy Engine - Verified Copy Library
//!
//! A headless copy-verify-retry engine in Rust.
//! Designed as the foundation for multiple UIs (CLI, automation).
//!
//! ## Overview
//!
//! The engine copies a file or directory tree from a source path to a
//! destination path. It features:
//! - Recursive, stably ordered source enumeration
//! - Chunked transfers with per-block progress reporting
//! - Checksum verification of every copy (MD5, SHA-256, BLAKE3)
//! - A bounded retry policy around each file
//! - A missing-set mode that reports or repairs files absent or
//!   mismatched at the destination
//! - Per-file error isolation: one bad file never aborts the run
//!
//! ## Basic Usage
//!
//! ```no_run
//! use engine::{run, CancelToken, RunOptions};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = RunOptions {
//!     max_retries: 2,
//!     ..RunOptions::default()
//! };
//! let cancel = CancelToken::new();
//!
//! let report = run(
//!     Path::new("/data/photos"),
//!     Path::new("/mnt/backup/photos"),
//!     &options,
//!     None,
//!     &cancel,
//! )?;
//!
//! println!(
//!     "{} copied, {} failed, {} bytes",
//!     report.files_succeeded, report.files_failed, report.bytes_copied
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: Core data structures (PathEntry, TransferTask, CopyReport)
//! - **error**: Error types and handling
//! - **walker**: Source tree enumeration
//! - **checksum**: Digest computation and comparison
//! - **transfer**: Chunked single-file copy with cancellation
//! - **retry**: Bounded retry policy
//! - **missing**: Missing-set resolution
//! - **orchestrator**: Run orchestration across all of the above
//! - **progress**: Progress sink trait

pub mod checksum;
pub mod error;
pub mod missing;
pub mod model;
pub mod orchestrator;
pub mod progress;
pub mod retry;
pub mod transfer;
pub mod walker;

// Re-export main types and functions
pub use checksum::{
    compute_file_checksum, compute_stream_checksum, ChecksumAlgorithm, ChecksumValue,
};
pub use error::EngineError;
pub use missing::{classify_entry, resolve_missing, Presence};
pub use model::{
    CopyReport, FailureRecord, OperationMode, PathEntry, TaskOutcome, TransferResult,
    TransferTask,
};
pub use orchestrator::{run, RunOptions};
pub use progress::ProgressSink;
pub use retry::with_retries;
pub use transfer::{transfer_file, CancelToken, DEFAULT_BLOCK_SIZE};
pub use walker::{enumerate_source, total_file_bytes};
