//! Typed errors for catalog parsing, fetching, and image servicing.
//!
//! Expected failures (bad catalog, checksum mismatch) carry enough detail
//! to reproduce the problem: offending section and index, expected vs
//! actual digest. They are printed as single lines, never as backtraces.

use std::path::PathBuf;
use thiserror::Error;

/// Catalog payload is malformed or incomplete.
///
/// Parsing is fail-fast: the first bad entry aborts with its section and
/// index, and no partial catalog is produced.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("entry {index} in '{section}' is missing required field '{field}'")]
    MissingField {
        section: &'static str,
        index: usize,
        field: &'static str,
    },

    #[error("entry {index} in '{section}' has empty field '{field}'")]
    EmptyField {
        section: &'static str,
        index: usize,
        field: &'static str,
    },

    #[error("entry {index} in '{section}' has unknown install_type '{value}'")]
    UnknownInstallType {
        section: &'static str,
        index: usize,
        value: String,
    },

    #[error(
        "entry {index} in '{section}' declares install_type '{value}' \
         which contradicts its section"
    )]
    MismatchedInstallType {
        section: &'static str,
        index: usize,
        value: String,
    },

    #[error("entry {index} in '{section}' repeats id '{id}'")]
    DuplicateId {
        section: &'static str,
        index: usize,
        id: String,
    },

    #[error("entry {index} in '{section}' has invalid checksum '{value}' (expected 64 hex chars)")]
    InvalidChecksum {
        section: &'static str,
        index: usize,
        value: String,
    },
}

/// A single artifact fetch failed.
///
/// Any variant guarantees the destination was left untouched and the
/// temporary file removed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("source not found: {}", path.display())]
    SourceMissing { path: PathBuf },

    #[error("I/O error while fetching {}: {source}", dest.display())]
    Io {
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", dest.display())]
    ChecksumMismatch {
        dest: PathBuf,
        expected: String,
        actual: String,
    },
}

impl FetchError {
    /// True when the failure was a digest mismatch rather than transport/IO.
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(self, FetchError::ChecksumMismatch { .. })
    }
}

/// Image servicing failed.
#[derive(Debug, Error)]
pub enum ServicingError {
    /// The external imaging tool reported failure for one operation.
    #[error("imaging tool failed during {operation}: {detail}")]
    Tool { operation: String, detail: String },

    /// Operation invoked in a state that does not allow it.
    #[error("invalid session state: {operation} requires {required}, session is {actual}")]
    InvalidState {
        operation: &'static str,
        required: &'static str,
        actual: &'static str,
    },

    /// Required host tooling is absent; fails before any mutation.
    #[error("required tool '{tool}' not found on this host")]
    PlatformUnsupported { tool: String },

    /// Caller passed an argument the tool contract rejects.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
