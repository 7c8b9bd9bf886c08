//! Run orchestration.
//!
//! The top-level driver for a copy run:
//! - enumerates the source tree
//! - resolves the destination root and creates directories as needed
//! - dispatches on the operation mode (copy all, list missing, copy missing)
//! - copies each file under the retry policy with checksum verification
//! - aggregates per-file outcomes into a CopyReport
//!
//! Individual file errors are recorded but do NOT stop the run. Only errors
//! on the source root or the destination root are fatal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::checksum::{compute_file_checksum, ChecksumAlgorithm};
use crate::error::EngineError;
use crate::missing::resolve_missing;
use crate::model::{
    CopyReport, FailureRecord, OperationMode, PathEntry, TaskOutcome, TransferResult,
    TransferTask,
};
use crate::progress::ProgressSink;
use crate::retry::with_retries;
use crate::transfer::{transfer_file, CancelToken, DEFAULT_BLOCK_SIZE};
use crate::walker::{enumerate_source, total_file_bytes};

/// Options controlling a copy run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// What to do with the enumerated files
    pub mode: OperationMode,

    /// Additional attempts allowed after a failed copy (0 = single attempt)
    pub max_retries: u32,

    /// Digest algorithm used for verification and missing-set resolution
    pub algorithm: ChecksumAlgorithm,

    /// Copy block size in bytes
    pub block_size: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            mode: OperationMode::CopyAll,
            max_retries: 0,
            algorithm: ChecksumAlgorithm::Md5,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

/// Execute a copy run from `source` to `destination`.
///
/// For a directory source, files land at `destination/<relative path>`.
/// For a single-file source, an existing directory destination receives the
/// file under its source name; any other destination path is the target
/// file itself.
///
/// # Errors
/// Returns an error only for run-fatal conditions: the source root is
/// absent or unreadable, or the destination root cannot be created.
/// Per-file failures are recorded in the returned report instead.
pub fn run(
    source: &Path,
    destination: &Path,
    options: &RunOptions,
    sink: Option<&dyn ProgressSink>,
    cancel: &CancelToken,
) -> Result<CopyReport, EngineError> {
    let started = Instant::now();

    let entries = enumerate_source(source)?;
    let source_is_file =
        entries.len() == 1 && !entries[0].is_dir && entries[0].relative_path.as_os_str().is_empty();

    let destination_root = resolve_destination_root(source, destination, source_is_file);

    let mut report = CopyReport::new(options.mode);
    let files: Vec<PathEntry> = entries.iter().filter(|e| !e.is_dir).cloned().collect();

    // ListMissing only inspects the destination, so it comes before any
    // directory creation.
    if options.mode == OperationMode::ListMissing {
        report.missing = resolve_missing(&files, &destination_root, options.algorithm);
        report.files_skipped = files.len() as u64;
        report.elapsed = started.elapsed();
        return Ok(report);
    }

    // Destination root failures are fatal: there is nowhere to write.
    if source_is_file {
        ensure_parent_dir(&destination_root)?;
    } else {
        ensure_dir(&destination_root)?;
    }

    let to_copy: Vec<PathEntry> = if options.mode == OperationMode::CopyMissingOnly {
        let missing = resolve_missing(&files, &destination_root, options.algorithm);
        report.files_skipped = (files.len() - missing.len()) as u64;
        report.missing = missing.clone();
        missing
    } else {
        mirror_directories(&entries, &destination_root, &mut report);
        files
    };

    let total_bytes = total_file_bytes(&to_copy);
    if let Some(s) = sink {
        s.on_run_started(to_copy.len(), total_bytes);
    }

    let mut completed_bytes: u64 = 0;
    for entry in to_copy {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let destination_path = entry.destination_under(&destination_root);
        let mut task = TransferTask::new(entry.clone(), destination_path.clone());

        if let Some(s) = sink {
            s.on_file_started(&entry);
        }

        match copy_one(
            &entry,
            &destination_path,
            options,
            sink,
            cancel,
            completed_bytes,
            total_bytes,
            &mut task.attempts,
        ) {
            Ok(result) => {
                completed_bytes += result.bytes_written;
                report.bytes_copied += result.bytes_written;
                report.files_succeeded += 1;
                task.outcome = TaskOutcome::Succeeded;
                task.result = Some(result);
            }
            Err(EngineError::Cancelled) => {
                report.cancelled = true;
                break;
            }
            Err(e) => {
                report.files_failed += 1;
                report.failures.push(FailureRecord {
                    source_path: entry.source_path.clone(),
                    relative_path: entry.relative_path.clone(),
                    error: e.to_string(),
                });
                task.outcome = TaskOutcome::Failed;
                task.error_message = Some(e.to_string());
            }
        }

        if let Some(s) = sink {
            s.on_file_completed(&task);
        }
    }

    report.elapsed = started.elapsed();
    if let Some(s) = sink {
        s.on_run_completed(&report);
    }
    Ok(report)
}

/// Copy and verify a single file under the retry policy.
#[allow(clippy::too_many_arguments)]
fn copy_one(
    entry: &PathEntry,
    destination_path: &Path,
    options: &RunOptions,
    sink: Option<&dyn ProgressSink>,
    cancel: &CancelToken,
    completed_bytes: u64,
    total_bytes: u64,
    attempts_made: &mut u32,
) -> Result<TransferResult, EngineError> {
    // Parent creation failures here are per-file, not fatal to the run.
    ensure_parent_dir(destination_path)?;

    with_retries(&entry.source_path, options.max_retries, |attempt| {
        *attempts_made = attempt + 1;
        let attempt_started = Instant::now();

        let bytes_written = transfer_file(
            &entry.source_path,
            destination_path,
            options.block_size,
            cancel,
            |file_bytes, _file_total| {
                if let Some(s) = sink {
                    s.on_progress(completed_bytes + file_bytes, total_bytes, entry);
                }
            },
        )?;

        let source_checksum = compute_file_checksum(&entry.source_path, options.algorithm)?;
        let dest_checksum = compute_file_checksum(destination_path, options.algorithm)?;

        if !source_checksum.matches(&dest_checksum) {
            // A corrupt copy is no better than a partial one
            let _ = fs::remove_file(destination_path);
            return Err(EngineError::ChecksumMismatch {
                path: destination_path.to_path_buf(),
                source_checksum: source_checksum.hex().to_string(),
                dest_checksum: dest_checksum.hex().to_string(),
            });
        }

        Ok(TransferResult {
            bytes_written,
            elapsed: attempt_started.elapsed(),
            source_checksum,
            dest_checksum,
            verified: true,
        })
    })
}

/// For a directory source the destination path is the root as given; a
/// single file dropped onto an existing directory lands inside it.
fn resolve_destination_root(source: &Path, destination: &Path, source_is_file: bool) -> PathBuf {
    if source_is_file && destination.is_dir() {
        match source.file_name() {
            Some(name) => destination.join(name),
            None => destination.to_path_buf(),
        }
    } else {
        destination.to_path_buf()
    }
}

/// Mirror every source directory at the destination so empty directories
/// survive the copy. Failures are recorded and the run continues.
fn mirror_directories(entries: &[PathEntry], destination_root: &Path, report: &mut CopyReport) {
    for entry in entries.iter().filter(|e| e.is_dir) {
        let destination = entry.destination_under(destination_root);
        if let Err(e) = ensure_dir(&destination) {
            report.files_failed += 1;
            report.failures.push(FailureRecord {
                source_path: entry.source_path.clone(),
                relative_path: entry.relative_path.clone(),
                error: e.to_string(),
            });
        }
    }
}

/// Create a directory and any missing ancestors. Already-exists is not an
/// error.
fn ensure_dir(path: &Path) -> Result<(), EngineError> {
    fs::create_dir_all(path).map_err(|e| EngineError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Ensure the parent directory of a path exists, creating it if necessary.
fn ensure_parent_dir(path: &Path) -> Result<(), EngineError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };

    match fs::metadata(parent) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(EngineError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                "parent path exists but is not a directory",
            ),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => ensure_dir(parent),
        Err(e) => Err(EngineError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;

    fn write_file(path: &Path, contents: &[u8]) {
        let mut file = File::create(path).expect("Failed to create file");
        file.write_all(contents).expect("Failed to write file");
    }

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir(&src).expect("Failed to create src dir");
        (temp_dir, src, dst)
    }

    #[test]
    fn test_copy_all_round_trip() {
        let (_tmp, src, dst) = setup();
        let subdir = src.join("nested");
        fs::create_dir(&subdir).expect("Failed to create subdir");
        write_file(&src.join("a.txt"), b"alpha");
        write_file(&subdir.join("b.txt"), b"beta content");

        let report = run(
            &src,
            &dst,
            &RunOptions::default(),
            None,
            &CancelToken::new(),
        )
        .expect("run should succeed");

        assert!(report.overall_success());
        assert_eq!(report.files_succeeded, 2);
        assert_eq!(report.files_failed, 0);
        assert_eq!(report.bytes_copied, 17);
        assert_eq!(
            fs::read_to_string(dst.join("a.txt")).expect("Failed to read"),
            "alpha"
        );
        assert_eq!(
            fs::read_to_string(dst.join("nested/b.txt")).expect("Failed to read"),
            "beta content"
        );
    }

    #[test]
    fn test_copied_checksums_match() {
        let (_tmp, src, dst) = setup();
        write_file(&src.join("a.bin"), &[0x42u8; 1000]);

        let options = RunOptions {
            algorithm: ChecksumAlgorithm::Sha256,
            ..RunOptions::default()
        };
        let report = run(&src, &dst, &options, None, &CancelToken::new())
            .expect("run should succeed");
        assert!(report.overall_success());

        let src_sum = compute_file_checksum(&src.join("a.bin"), ChecksumAlgorithm::Sha256)
            .expect("checksum should succeed");
        let dst_sum = compute_file_checksum(&dst.join("a.bin"), ChecksumAlgorithm::Sha256)
            .expect("checksum should succeed");
        assert!(src_sum.matches(&dst_sum));
    }

    #[test]
    fn test_empty_source_directory_is_success() {
        let (_tmp, src, dst) = setup();

        let report = run(
            &src,
            &dst,
            &RunOptions::default(),
            None,
            &CancelToken::new(),
        )
        .expect("run should succeed");

        assert!(report.overall_success());
        assert_eq!(report.files_succeeded, 0);
        assert_eq!(report.bytes_copied, 0);
        assert!(dst.is_dir(), "destination root should have been created");
    }

    #[test]
    fn test_empty_directories_are_mirrored() {
        let (_tmp, src, dst) = setup();
        fs::create_dir(src.join("hollow")).expect("Failed to create dir");

        let report = run(
            &src,
            &dst,
            &RunOptions::default(),
            None,
            &CancelToken::new(),
        )
        .expect("run should succeed");

        assert!(report.overall_success());
        assert!(dst.join("hollow").is_dir());
    }

    #[test]
    fn test_missing_source_root_is_fatal() {
        let (_tmp, src, dst) = setup();
        let result = run(
            &src.join("nope"),
            &dst,
            &RunOptions::default(),
            None,
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(EngineError::SourceNotFound { .. })));
    }

    #[test]
    fn test_partial_failure_does_not_stop_the_run() {
        let (_tmp, src, dst) = setup();
        for name in ["f1", "f2", "f3", "f4", "f5"] {
            write_file(&src.join(name), name.as_bytes());
        }
        // A directory at f3's destination makes every attempt fail
        fs::create_dir_all(dst.join("f3")).expect("Failed to create blocking dir");

        let options = RunOptions {
            max_retries: 1,
            ..RunOptions::default()
        };
        let report = run(&src, &dst, &options, None, &CancelToken::new())
            .expect("run should succeed");

        assert_eq!(report.files_succeeded, 4);
        assert_eq!(report.files_failed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].relative_path, PathBuf::from("f3"));
        assert!(report.failures[0].error.contains("attempts failed"));
        // Files after the failing one were still attempted
        assert!(dst.join("f4").is_file());
        assert!(dst.join("f5").is_file());
    }

    #[test]
    fn test_copy_all_is_idempotent() {
        let (_tmp, src, dst) = setup();
        write_file(&src.join("a.txt"), b"stable");
        write_file(&src.join("b.txt"), b"content");

        let first = run(
            &src,
            &dst,
            &RunOptions::default(),
            None,
            &CancelToken::new(),
        )
        .expect("first run should succeed");
        let second = run(
            &src,
            &dst,
            &RunOptions::default(),
            None,
            &CancelToken::new(),
        )
        .expect("second run should succeed");

        assert_eq!(first.files_succeeded, second.files_succeeded);
        assert!(second.overall_success());
        assert_eq!(second.bytes_copied, first.bytes_copied);
    }

    #[test]
    fn test_list_missing_reports_without_copying() {
        let (_tmp, src, dst) = setup();
        write_file(&src.join("a.txt"), b"aaa");
        write_file(&src.join("b.txt"), b"bbb");
        write_file(&src.join("c.txt"), b"ccc");
        fs::create_dir(&dst).expect("Failed to create dst dir");
        write_file(&dst.join("a.txt"), b"aaa");
        write_file(&dst.join("b.txt"), b"bbb");

        let options = RunOptions {
            mode: OperationMode::ListMissing,
            ..RunOptions::default()
        };
        let report = run(&src, &dst, &options, None, &CancelToken::new())
            .expect("run should succeed");

        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].relative_path, PathBuf::from("c.txt"));
        assert_eq!(report.files_succeeded, 0);
        assert_eq!(report.files_skipped, 3);
        assert!(!dst.join("c.txt").exists(), "ListMissing must not copy");
    }

    #[test]
    fn test_copy_missing_only_copies_the_missing_subset() {
        let (_tmp, src, dst) = setup();
        write_file(&src.join("a.txt"), b"aaa");
        write_file(&src.join("b.txt"), b"bbb");
        write_file(&src.join("c.txt"), b"ccc");
        fs::create_dir(&dst).expect("Failed to create dst dir");
        write_file(&dst.join("a.txt"), b"aaa");
        write_file(&dst.join("b.txt"), b"bbb");

        let options = RunOptions {
            mode: OperationMode::CopyMissingOnly,
            ..RunOptions::default()
        };
        let report = run(&src, &dst, &options, None, &CancelToken::new())
            .expect("run should succeed");

        assert_eq!(report.files_succeeded, 1);
        assert_eq!(report.files_skipped, 2);
        assert!(report.overall_success());
        assert_eq!(
            fs::read_to_string(dst.join("c.txt")).expect("Failed to read"),
            "ccc"
        );
    }

    #[test]
    fn test_copy_missing_repairs_mismatched_file() {
        let (_tmp, src, dst) = setup();
        write_file(&src.join("a.txt"), b"fresh");
        fs::create_dir(&dst).expect("Failed to create dst dir");
        write_file(&dst.join("a.txt"), b"stale");

        let options = RunOptions {
            mode: OperationMode::CopyMissingOnly,
            ..RunOptions::default()
        };
        let report = run(&src, &dst, &options, None, &CancelToken::new())
            .expect("run should succeed");

        assert_eq!(report.files_succeeded, 1);
        assert_eq!(report.files_skipped, 0);
        assert_eq!(
            fs::read_to_string(dst.join("a.txt")).expect("Failed to read"),
            "fresh"
        );
    }

    #[test]
    fn test_single_file_into_existing_directory() {
        let (_tmp, src, dst) = setup();
        let file = src.join("report.pdf");
        write_file(&file, b"pdf bytes");
        fs::create_dir(&dst).expect("Failed to create dst dir");

        let report = run(
            &file,
            &dst,
            &RunOptions::default(),
            None,
            &CancelToken::new(),
        )
        .expect("run should succeed");

        assert_eq!(report.files_succeeded, 1);
        assert_eq!(
            fs::read_to_string(dst.join("report.pdf")).expect("Failed to read"),
            "pdf bytes"
        );
    }

    #[test]
    fn test_single_file_to_explicit_target_path() {
        let (_tmp, src, dst) = setup();
        let file = src.join("data.bin");
        write_file(&file, b"payload");
        let target = dst.join("renamed.bin");

        let report = run(
            &file,
            &target,
            &RunOptions::default(),
            None,
            &CancelToken::new(),
        )
        .expect("run should succeed");

        assert_eq!(report.files_succeeded, 1);
        assert_eq!(
            fs::read_to_string(&target).expect("Failed to read"),
            "payload"
        );
    }

    #[test]
    fn test_cancelled_run_reports_cancellation() {
        let (_tmp, src, dst) = setup();
        write_file(&src.join("a.txt"), b"aaa");
        write_file(&src.join("b.txt"), b"bbb");

        let cancel = CancelToken::new();
        cancel.cancel();

        let report = run(&src, &dst, &RunOptions::default(), None, &cancel)
            .expect("run should succeed");

        assert!(report.cancelled);
        assert_eq!(report.files_succeeded, 0);
        assert!(!dst.join("a.txt").exists());
        assert!(!dst.join("b.txt").exists());
    }

    #[test]
    fn test_retry_budget_is_honored_per_file() {
        let (_tmp, src, dst) = setup();
        write_file(&src.join("f1"), b"data");
        fs::create_dir_all(dst.join("f1")).expect("Failed to create blocking dir");

        let options = RunOptions {
            max_retries: 2,
            ..RunOptions::default()
        };
        let report = run(&src, &dst, &options, None, &CancelToken::new())
            .expect("run should succeed");

        assert_eq!(report.files_failed, 1);
        assert!(report.failures[0].error.contains("All 3 attempts failed"));
    }

    // Sink that records the call sequence.
    struct RecordingSink {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            RecordingSink {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock poisoned").clone()
        }
    }

    impl ProgressSink for RecordingSink {
        fn on_run_started(&self, total_files: usize, total_bytes: u64) {
            self.calls
                .lock()
                .expect("lock poisoned")
                .push(format!("run_started({}, {})", total_files, total_bytes));
        }

        fn on_file_started(&self, entry: &PathEntry) {
            self.calls
                .lock()
                .expect("lock poisoned")
                .push(format!("file_started({})", entry.display_name()));
        }

        fn on_progress(&self, bytes_copied: u64, bytes_total: u64, _entry: &PathEntry) {
            self.calls
                .lock()
                .expect("lock poisoned")
                .push(format!("progress({}, {})", bytes_copied, bytes_total));
        }

        fn on_file_completed(&self, task: &TransferTask) {
            self.calls
                .lock()
                .expect("lock poisoned")
                .push(format!("file_completed({:?})", task.outcome));
        }

        fn on_run_completed(&self, report: &CopyReport) {
            self.calls
                .lock()
                .expect("lock poisoned")
                .push(format!("run_completed({})", report.files_succeeded));
        }
    }

    #[test]
    fn test_sink_receives_ordered_updates() {
        let (_tmp, src, dst) = setup();
        write_file(&src.join("a.txt"), b"abcdef");

        let sink = RecordingSink::new();
        run(
            &src,
            &dst,
            &RunOptions::default(),
            Some(&sink),
            &CancelToken::new(),
        )
        .expect("run should succeed");

        let calls = sink.calls();
        assert_eq!(calls.first().map(String::as_str), Some("run_started(1, 6)"));
        assert!(calls.contains(&"file_started(a.txt)".to_string()));
        assert!(calls.contains(&"progress(6, 6)".to_string()));
        assert!(calls.contains(&"file_completed(Succeeded)".to_string()));
        assert_eq!(
            calls.last().map(String::as_str),
            Some("run_completed(1)")
        );
    }

    #[test]
    fn test_attempt_counter_lands_on_the_task() {
        let (_tmp, src, dst) = setup();
        write_file(&src.join("a.txt"), b"x");

        struct AttemptSink {
            attempts: Mutex<Vec<u32>>,
        }
        impl ProgressSink for AttemptSink {
            fn on_run_started(&self, _: usize, _: u64) {}
            fn on_file_started(&self, _: &PathEntry) {}
            fn on_progress(&self, _: u64, _: u64, _: &PathEntry) {}
            fn on_file_completed(&self, task: &TransferTask) {
                self.attempts
                    .lock()
                    .expect("lock poisoned")
                    .push(task.attempts);
            }
            fn on_run_completed(&self, _: &CopyReport) {}
        }

        let sink = AttemptSink {
            attempts: Mutex::new(Vec::new()),
        };
        run(
            &src,
            &dst,
            &RunOptions::default(),
            Some(&sink),
            &CancelToken::new(),
        )
        .expect("run should succeed");

        assert_eq!(*sink.attempts.lock().expect("lock poisoned"), vec![1]);
    }
}
