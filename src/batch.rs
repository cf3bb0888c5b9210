//! Batch fetch coordination across a whole catalog.
//!
//! Drives the atomic fetcher over every catalog entry in fixed category
//! order (drivers, updates, applications) with continue-on-error
//! aggregation: one broken source never blocks unrelated media, and every
//! failed identifier is reported, not just the first.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::catalog::MediaCatalog;
use crate::download::Fetcher;

/// Outcome of a batch fetch.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Identifier and final destination of every fetched entry.
    pub succeeded: Vec<(String, PathBuf)>,
    /// Identifiers of entries that failed to fetch or verify.
    pub failed: Vec<String>,
}

impl FetchReport {
    /// The batch failed iff any entry failed.
    pub fn is_failure(&self) -> bool {
        !self.failed.is_empty()
    }

    /// One line per failed identifier plus a summary count.
    pub fn print_summary(&self) {
        if self.is_failure() {
            for id in &self.failed {
                println!("failed: {id}");
            }
            println!(
                "{} of {} entries failed",
                self.failed.len(),
                self.succeeded.len() + self.failed.len()
            );
        } else {
            println!("{} entries fetched", self.succeeded.len());
        }
    }
}

/// Fetch every catalog entry under `dest_root`.
///
/// Checksum verification applies only when `verify_checksums` is true and
/// the entry declares a checksum. Entries are fetched sequentially; each
/// failure is recorded against its identifier and the batch continues.
pub fn fetch_all(
    catalog: &MediaCatalog,
    dest_root: &Path,
    verify_checksums: bool,
) -> Result<FetchReport> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
    let fetcher = Fetcher::new()?;

    let mut report = FetchReport::default();

    for entry in catalog.all_entries() {
        let dest = dest_root.join(&entry.target);
        let expected = if verify_checksums {
            entry.checksum.as_deref()
        } else {
            None
        };

        match rt.block_on(fetcher.fetch(&entry.source, &dest, expected)) {
            Ok(path) => {
                println!("  {} ({}): {} [OK]", entry.id, entry.install_type, path.display());
                report.succeeded.push((entry.id.clone(), path));
            }
            Err(e) => {
                eprintln!("  {} ({}): {}", entry.id, entry.install_type, e);
                report.failed.push(entry.id.clone());
            }
        }
    }

    Ok(report)
}
