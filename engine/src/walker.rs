//! Source tree enumeration.
//!
//! Walks a source path into a flat list of `PathEntry` values:
//! - a regular-file source yields exactly one entry with an empty relative
//!   path
//! - a directory source yields every directory and regular file underneath
//!   it, recursively, with paths relative to the source root
//!
//! Entries at each level are sorted by file name, so the produced order is
//! stable across repeated walks of an unchanged tree. Symbolic links below
//! the root are skipped; the root path itself is resolved through a final
//! symlink.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::EngineError;
use crate::model::PathEntry;

/// Enumerate a source path into a list of entries.
///
/// # Errors
/// Returns `SourceNotFound` if the source does not exist, `PermissionDenied`
/// if the root is unreadable, and `EnumerationFailed` for read failures
/// while walking the tree.
pub fn enumerate_source(source: &Path) -> Result<Vec<PathEntry>, EngineError> {
    let metadata = fs::metadata(source).map_err(|e| root_error(source, e))?;

    if metadata.is_file() {
        return Ok(vec![PathEntry {
            source_path: source.to_path_buf(),
            relative_path: PathBuf::new(),
            file_size: metadata.len(),
            is_dir: false,
        }]);
    }

    if !metadata.is_dir() {
        return Err(EngineError::EnumerationFailed {
            path: source.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                "source is neither a regular file nor a directory",
            ),
        });
    }

    let mut entries = Vec::new();
    recurse(source, Path::new(""), &mut entries)?;
    Ok(entries)
}

/// Sum of file sizes across the non-directory entries.
pub fn total_file_bytes(entries: &[PathEntry]) -> u64 {
    entries
        .iter()
        .filter(|e| !e.is_dir)
        .map(|e| e.file_size)
        .sum()
}

fn root_error(path: &Path, err: io::Error) -> EngineError {
    match err.kind() {
        io::ErrorKind::NotFound => EngineError::SourceNotFound {
            path: path.to_path_buf(),
        },
        io::ErrorKind::PermissionDenied => EngineError::PermissionDenied {
            path: path.to_path_buf(),
            source: err,
        },
        _ => EngineError::EnumerationFailed {
            path: path.to_path_buf(),
            source: err,
        },
    }
}

fn recurse(
    dir: &Path,
    rel_path: &Path,
    entries: &mut Vec<PathEntry>,
) -> Result<(), EngineError> {
    let read_dir = fs::read_dir(dir).map_err(|e| match e.kind() {
        io::ErrorKind::PermissionDenied => EngineError::PermissionDenied {
            path: dir.to_path_buf(),
            source: e,
        },
        _ => EngineError::EnumerationFailed {
            path: dir.to_path_buf(),
            source: e,
        },
    })?;

    let mut children = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| EngineError::EnumerationFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
        children.push(entry);
    }
    // read_dir order is platform-defined; sort for a stable sequence
    children.sort_by_key(|e| e.file_name());

    for child in children {
        let file_type = child.file_type().map_err(|e| EngineError::EnumerationFailed {
            path: child.path(),
            source: e,
        })?;

        // Links are neither copied nor followed
        if file_type.is_symlink() {
            continue;
        }

        let child_rel = rel_path.join(child.file_name());
        let child_path = child.path();

        if file_type.is_dir() {
            entries.push(PathEntry {
                source_path: child_path.clone(),
                relative_path: child_rel.clone(),
                file_size: 0,
                is_dir: true,
            });
            recurse(&child_path, &child_rel, entries)?;
        } else if file_type.is_file() {
            let metadata = child.metadata().map_err(|e| EngineError::EnumerationFailed {
                path: child_path.clone(),
                source: e,
            })?;
            entries.push(PathEntry {
                source_path: child_path,
                relative_path: child_rel,
                file_size: metadata.len(),
                is_dir: false,
            });
        }
        // Sockets, FIFOs and other special files are skipped
    }

    Ok(())
}
