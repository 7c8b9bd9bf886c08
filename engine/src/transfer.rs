//! Single-file transfer.
//!
//! Copies one source file to a destination path in fixed-size blocks,
//! invoking a progress callback after each block. On any failure or
//! cancellation the partially written destination file is removed before
//! the error propagates; no partial files are observable afterwards.
//!
//! The destination's parent directory must already exist; the orchestrator
//! is responsible for creating it.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{classify_write_error, EngineError};

/// Default copy block size. Trades memory for syscall overhead.
pub const DEFAULT_BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Shared flag used to interrupt a run from another thread.
///
/// Cancellation is observed between blocks; the in-progress destination
/// file is cleaned up before `Cancelled` propagates.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Request cancellation. Safe to call from any thread, any number of
    /// times.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// True once `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Copy a single file from `src` to `dst` in blocks of `block_size` bytes.
///
/// `on_chunk` receives (bytes transferred so far, total size) after each
/// block. Returns the number of bytes written. The source's modification
/// time is applied to the destination, best effort.
///
/// # Errors
/// `ReadError` on source failures, `WriteError`/`DiskFull` on destination
/// failures, `Cancelled` if the token fires mid-copy. In every error case
/// the destination file has been removed.
pub fn transfer_file<F>(
    src: &Path,
    dst: &Path,
    block_size: usize,
    cancel: &CancelToken,
    mut on_chunk: F,
) -> Result<u64, EngineError>
where
    F: FnMut(u64, u64),
{
    let result = copy_blocks(src, dst, block_size, cancel, &mut on_chunk);
    if result.is_err() {
        // Never leave a truncated destination behind
        let _ = fs::remove_file(dst);
    }
    result
}

fn copy_blocks(
    src: &Path,
    dst: &Path,
    block_size: usize,
    cancel: &CancelToken,
    on_chunk: &mut dyn FnMut(u64, u64),
) -> Result<u64, EngineError> {
    let mut src_file = File::open(src).map_err(|e| EngineError::ReadError {
        path: src.to_path_buf(),
        source: e,
    })?;

    let src_metadata = src_file.metadata().map_err(|e| EngineError::ReadError {
        path: src.to_path_buf(),
        source: e,
    })?;
    let total_size = src_metadata.len();
    let src_mtime = src_metadata.modified().ok();

    let mut dst_file = File::create(dst).map_err(|e| classify_write_error(dst, e))?;

    let mut buffer = vec![0u8; block_size.max(1)];
    let mut written: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let n = src_file
            .read(&mut buffer)
            .map_err(|e| EngineError::ReadError {
                path: src.to_path_buf(),
                source: e,
            })?;
        if n == 0 {
            break;
        }

        dst_file
            .write_all(&buffer[..n])
            .map_err(|e| classify_write_error(dst, e))?;

        written += n as u64;
        on_chunk(written, total_size);
    }

    dst_file
        .flush()
        .map_err(|e| classify_write_error(dst, e))?;
    drop(dst_file);

    // Preserve modification time if available
    if let Some(mtime) = src_mtime {
        let _ = filetime::set_file_mtime(dst, filetime::FileTime::from_system_time(mtime));
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_copies_contents() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("source.txt");
        let dst = temp_dir.path().join("dest.txt");
        fs::write(&src, b"test content").expect("Failed to write source");

        let bytes = transfer_file(&src, &dst, DEFAULT_BLOCK_SIZE, &CancelToken::new(), |_, _| {})
            .expect("Failed to copy");
        assert_eq!(bytes, 12);

        let contents = fs::read_to_string(&dst).expect("Failed to read dest");
        assert_eq!(contents, "test content");
    }

    #[test]
    fn test_progress_reports_every_block() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("source.bin");
        let dst = temp_dir.path().join("dest.bin");
        fs::write(&src, vec![7u8; 10]).expect("Failed to write source");

        let mut updates = Vec::new();
        transfer_file(&src, &dst, 4, &CancelToken::new(), |so_far, total| {
            updates.push((so_far, total));
        })
        .expect("Failed to copy");

        // 10 bytes in blocks of 4: 4, 8, 10
        assert_eq!(updates, vec![(4, 10), (8, 10), (10, 10)]);
    }

    #[test]
    fn test_empty_file_copies_without_progress() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("empty");
        let dst = temp_dir.path().join("empty-copy");
        fs::write(&src, b"").expect("Failed to write source");

        let mut called = false;
        let bytes = transfer_file(&src, &dst, DEFAULT_BLOCK_SIZE, &CancelToken::new(), |_, _| {
            called = true;
        })
        .expect("Failed to copy");

        assert_eq!(bytes, 0);
        assert!(!called);
        assert!(dst.exists());
    }

    #[test]
    fn test_cancelled_transfer_leaves_no_partial_file() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("source.bin");
        let dst = temp_dir.path().join("dest.bin");
        fs::write(&src, vec![1u8; 1024]).expect("Failed to write source");

        let cancel = CancelToken::new();
        cancel.cancel();

        let result = transfer_file(&src, &dst, 64, &cancel, |_, _| {});
        assert!(matches!(result, Err(EngineError::Cancelled)));
        assert!(!dst.exists(), "partial destination file must be removed");
    }

    #[test]
    fn test_missing_source_is_read_error_and_no_destination() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("absent");
        let dst = temp_dir.path().join("dest");

        let result = transfer_file(&src, &dst, DEFAULT_BLOCK_SIZE, &CancelToken::new(), |_, _| {});
        assert!(matches!(result, Err(EngineError::ReadError { .. })));
        assert!(!dst.exists());
    }

    #[test]
    fn test_write_into_blocked_path_cleans_up() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("source.txt");
        fs::write(&src, b"data").expect("Failed to write source");

        // A directory at the destination path makes File::create fail
        let dst = temp_dir.path().join("blocked");
        fs::create_dir(&dst).expect("Failed to create blocking dir");

        let result = transfer_file(&src, &dst, DEFAULT_BLOCK_SIZE, &CancelToken::new(), |_, _| {});
        assert!(result.is_err());
        assert!(dst.is_dir(), "blocking directory must be untouched");
    }

    #[test]
    fn test_cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
