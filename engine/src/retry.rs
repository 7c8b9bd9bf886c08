//! Bounded retry around a fallible per-file operation.
//!
//! An operation is invoked up to `max_retries + 1` times total. Retries
//! happen immediately after a failed attempt; when the budget is exhausted
//! the last error is wrapped in `RetryExhausted` together with the total
//! attempt count. Cancellation is never retried.

use std::path::Path;

use crate::error::EngineError;

/// Invoke `op` until it succeeds or `max_retries + 1` attempts have failed.
///
/// `op` receives the zero-based attempt index. Each attempt is fully
/// independent; a retried file copy restarts from the beginning.
///
/// # Errors
/// `Cancelled` propagates unchanged on the attempt that observed it. Any
/// other failure on the final attempt is returned as `RetryExhausted`
/// wrapping that failure, with `attempts` set to the total number made.
pub fn with_retries<T, F>(
    path: &Path,
    max_retries: u32,
    mut op: F,
) -> Result<T, EngineError>
where
    F: FnMut(u32) -> Result<T, EngineError>,
{
    let mut attempt = 0;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(EngineError::Cancelled) => return Err(EngineError::Cancelled),
            Err(e) => {
                if attempt >= max_retries {
                    return Err(EngineError::RetryExhausted {
                        path: path.to_path_buf(),
                        attempts: attempt + 1,
                        source: Box::new(e),
                    });
                }
                attempt += 1;
            }
        }
    }
}
