//! Missing-set resolution.
//!
//! Classifies each source file as Present (destination file exists and its
//! checksum matches the source) or Missing. A destination file that exists
//! but differs is Missing, so a later copy repairs it. Classification never
//! mutates the filesystem.
//!
//! A file whose checksums cannot be computed is also classified Missing;
//! the subsequent copy attempt surfaces the real error through normal
//! per-file reporting.

use std::path::Path;

use crate::checksum::{compute_file_checksum, ChecksumAlgorithm};
use crate::model::PathEntry;

/// Classification of one source file against the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Destination file exists and matches the source checksum
    Present,
    /// Destination file is absent, differs, or could not be compared
    Missing,
}

/// Classify a single file entry against its resolved destination path.
pub fn classify_entry(
    entry: &PathEntry,
    destination_path: &Path,
    algorithm: ChecksumAlgorithm,
) -> Presence {
    if !destination_path.is_file() {
        return Presence::Missing;
    }
    let source_checksum = match compute_file_checksum(&entry.source_path, algorithm) {
        Ok(checksum) => checksum,
        Err(_) => return Presence::Missing,
    };
    let dest_checksum = match compute_file_checksum(destination_path, algorithm) {
        Ok(checksum) => checksum,
        Err(_) => return Presence::Missing,
    };
    if source_checksum.matches(&dest_checksum) {
        Presence::Present
    } else {
        Presence::Missing
    }
}

/// Produce the subset of file entries classified Missing under a
/// destination root. Directory entries are ignored.
pub fn resolve_missing(
    entries: &[PathEntry],
    destination_root: &Path,
    algorithm: ChecksumAlgorithm,
) -> Vec<PathEntry> {
    entries
        .iter()
        .filter(|entry| !entry.is_dir)
        .filter(|entry| {
            let destination = entry.destination_under(destination_root);
            classify_entry(entry, &destination, algorithm) == Presence::Missing
        })
        .cloned()
        .collect()
}
