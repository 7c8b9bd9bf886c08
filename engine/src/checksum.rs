//! Checksum computation for copy verification.
//!
//! This module provides:
//! - Multiple digest algorithms (MD5, SHA-256, BLAKE3)
//! - Streaming computation over any reader, in bounded-size chunks
//! - File-level computation with path-aware errors
//!
//! The digest of a byte sequence does not depend on how the underlying
//! reader chunks its data.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::error::EngineError;

/// Internal read buffer for streaming computation.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    /// MD5 (fast, adequate for corruption detection; the default)
    Md5,
    /// SHA-256 (cryptographic, 256-bit)
    Sha256,
    /// BLAKE3 (modern, fast, 256-bit)
    Blake3,
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Md5 => write!(f, "md5"),
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

impl ChecksumAlgorithm {
    /// Parse algorithm from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "md5" => Some(Self::Md5),
            "sha256" => Some(Self::Sha256),
            "blake3" => Some(Self::Blake3),
            _ => None,
        }
    }
}

/// A computed digest value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumValue {
    algorithm: ChecksumAlgorithm,
    hex: String,
}

impl ChecksumValue {
    /// Create a new checksum value
    pub fn new(algorithm: ChecksumAlgorithm, hex: String) -> Self {
        ChecksumValue { algorithm, hex }
    }

    /// Get the algorithm
    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// Get the lowercase hex representation
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// True when another value carries the same algorithm and digest.
    pub fn matches(&self, other: &ChecksumValue) -> bool {
        self.algorithm == other.algorithm && self.hex == other.hex
    }
}

impl fmt::Display for ChecksumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex)
    }
}

/// Incremental hasher over one of the supported algorithms.
enum StreamHasher {
    Md5(md5::Context),
    Sha256(sha2::Sha256),
    Blake3(blake3::Hasher),
}

impl StreamHasher {
    fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Md5 => StreamHasher::Md5(md5::Context::new()),
            ChecksumAlgorithm::Sha256 => StreamHasher::Sha256(sha2::Sha256::default()),
            ChecksumAlgorithm::Blake3 => StreamHasher::Blake3(blake3::Hasher::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            StreamHasher::Md5(context) => context.consume(data),
            StreamHasher::Sha256(hasher) => {
                use sha2::Digest;
                hasher.update(data);
            }
            StreamHasher::Blake3(hasher) => {
                hasher.update(data);
            }
        }
    }

    fn finalize(self) -> ChecksumValue {
        match self {
            StreamHasher::Md5(context) => ChecksumValue::new(
                ChecksumAlgorithm::Md5,
                format!("{:x}", context.compute()),
            ),
            StreamHasher::Sha256(hasher) => {
                use sha2::Digest;
                ChecksumValue::new(
                    ChecksumAlgorithm::Sha256,
                    format!("{:x}", hasher.finalize()),
                )
            }
            StreamHasher::Blake3(hasher) => ChecksumValue::new(
                ChecksumAlgorithm::Blake3,
                hasher.finalize().to_hex().to_string(),
            ),
        }
    }
}

/// Compute the digest of everything a reader yields.
///
/// Reads in bounded chunks so arbitrarily large inputs never have to fit in
/// memory.
///
/// # Errors
/// Returns the underlying `io::Error` if the reader fails before the end of
/// the stream.
pub fn compute_stream_checksum<R: Read>(
    mut reader: R,
    algorithm: ChecksumAlgorithm,
) -> io::Result<ChecksumValue> {
    let mut hasher = StreamHasher::new(algorithm);
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(e) => return Err(e),
        }
    }
    Ok(hasher.finalize())
}

/// Compute the digest of a file on disk.
///
/// # Errors
/// Returns `ReadError` if the file cannot be opened or read to completion.
pub fn compute_file_checksum(
    path: &Path,
    algorithm: ChecksumAlgorithm,
) -> Result<ChecksumValue, EngineError> {
    let file = File::open(path).map_err(|e| EngineError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    compute_stream_checksum(file, algorithm).map_err(|e| EngineError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })
}
