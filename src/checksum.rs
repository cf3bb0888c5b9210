//! Streaming SHA-256 helpers.
//!
//! Digests are computed in fixed-size blocks so multi-gigabyte media never
//! sits in memory. Hex output is lowercase; comparisons are
//! case-insensitive.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Block size for streaming reads (1 MiB).
const BLOCK_SIZE: usize = 1024 * 1024;

/// Compute the SHA-256 digest of a file, streaming in fixed-size blocks.
///
/// Returns lowercase hex.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {} for checksum", path.display()))?;

    let mut reader = std::io::BufReader::with_capacity(BLOCK_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BLOCK_SIZE];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// True when `actual` matches `expected`, ignoring hex case.
pub fn digests_match(expected: &str, actual: &str) -> bool {
    expected.eq_ignore_ascii_case(actual)
}
