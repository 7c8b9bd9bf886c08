//! Progress reporting trait.
//!
//! This module defines the ProgressSink trait, which allows decoupling
//! the copy engine from any specific UI technology (CLI, GUI, etc.).
//!
//! All methods are called synchronously from the copy loop, after every
//! block for `on_progress`, so implementations must be cheap and must not
//! block.

use crate::model::{CopyReport, PathEntry, TransferTask};

/// Trait for receiving progress updates from a copy run.
///
/// Implement this trait to drive a progress display. The CLI provides an
/// implementation backed by a terminal progress bar.
pub trait ProgressSink: Send {
    /// Called once before the first file, with the number of files to copy
    /// and the total byte count across them.
    fn on_run_started(&self, total_files: usize, total_bytes: u64);

    /// Called when a file is about to be copied.
    fn on_file_started(&self, entry: &PathEntry);

    /// Called after each block with run-level byte counts.
    ///
    /// `bytes_copied` covers completed files plus the current file's
    /// progress; a retried file's contribution restarts from zero.
    fn on_progress(&self, bytes_copied: u64, bytes_total: u64, entry: &PathEntry);

    /// Called when a file reaches a terminal outcome.
    fn on_file_completed(&self, task: &TransferTask);

    /// Called once after the last file, with the finalized report.
    fn on_run_completed(&self, report: &CopyReport);
}
