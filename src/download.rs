//! Atomic artifact fetching.
//!
//! Every fetch streams into a temporary sibling of the destination and is
//! renamed into place only after the payload is fully written and (when a
//! checksum was declared) verified. A reader therefore never observes a
//! partial artifact: on any failure the temporary file is removed and the
//! destination is left untouched, so a retry starts from a clean slate.

use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};

use crate::checksum;
use crate::error::FetchError;

/// Reserved marker suffix for in-flight downloads.
///
/// Appended to the destination path, so the temporary file is always a
/// sibling on the same filesystem (rename stays atomic) and can never
/// collide with a real media extension.
pub const TMP_SUFFIX: &str = ".fetchpart";

/// Chunk size for streaming local sources (64 KiB).
const CHUNK_SIZE: usize = 64 * 1024;

/// Temporary sibling path for a destination.
pub fn temp_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

/// Fetches artifacts with all-or-nothing write semantics.
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("deploykit/0.1")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {e}"))?;
        Ok(Self { client })
    }

    /// Fetch `source` to `dest`, verifying against `expected_sha256` when
    /// given (hex, case-insensitive).
    ///
    /// `source` is an http(s) URL or a filesystem path. Parent directories
    /// of `dest` are created idempotently. Returns the destination path on
    /// success.
    pub async fn fetch(
        &self,
        source: &str,
        dest: &Path,
        expected_sha256: Option<&str>,
    ) -> Result<PathBuf, FetchError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchError::Io {
                    dest: dest.to_path_buf(),
                    source: e,
                })?;
        }

        let tmp = temp_path(dest);

        match self.fetch_into(source, dest, &tmp, expected_sha256).await {
            Ok(()) => Ok(dest.to_path_buf()),
            Err(e) => {
                // Absence is not an error: the failure may have happened
                // before the temp file was created.
                let _ = tokio::fs::remove_file(&tmp).await;
                Err(e)
            }
        }
    }

    /// One fetch attempt: stream to temp, verify, rename onto dest.
    async fn fetch_into(
        &self,
        source: &str,
        dest: &Path,
        tmp: &Path,
        expected_sha256: Option<&str>,
    ) -> Result<(), FetchError> {
        if is_url(source) {
            self.stream_http(source, tmp).await?;
        } else {
            stream_local(Path::new(source), tmp).await?;
        }

        if let Some(expected) = expected_sha256 {
            // The read happens on the temp file; report failures against it.
            let actual = checksum::sha256_file(tmp).map_err(|e| FetchError::Io {
                dest: tmp.to_path_buf(),
                source: std::io::Error::other(e),
            })?;
            if !checksum::digests_match(expected, &actual) {
                return Err(FetchError::ChecksumMismatch {
                    dest: dest.to_path_buf(),
                    expected: expected.to_lowercase(),
                    actual,
                });
            }
        }

        // Last step: the destination only ever appears fully written.
        tokio::fs::rename(tmp, dest)
            .await
            .map_err(|e| FetchError::Io {
                dest: dest.to_path_buf(),
                source: e,
            })
    }

    /// Stream an HTTP(S) resource to the temp file in chunks.
    async fn stream_http(&self, url: &str, tmp: &Path) -> Result<(), FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Http {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let file = tokio::fs::File::create(tmp)
            .await
            .map_err(|e| io_err(tmp, e))?;
        let mut writer = BufWriter::new(file);

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::Http {
                url: url.to_string(),
                source: e,
            })?;
            writer.write_all(&chunk).await.map_err(|e| io_err(tmp, e))?;
        }

        writer.flush().await.map_err(|e| io_err(tmp, e))
    }
}

/// Stream a filesystem source to the temp file in fixed-size chunks.
///
/// Used for file shares and local fixtures; goes through the same
/// temp-and-rename path as HTTP so the atomicity contract holds for every
/// locator kind.
async fn stream_local(source: &Path, tmp: &Path) -> Result<(), FetchError> {
    let mut reader = match tokio::fs::File::open(source).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FetchError::SourceMissing {
                path: source.to_path_buf(),
            })
        }
        Err(e) => return Err(io_err(source, e)),
    };

    let file = tokio::fs::File::create(tmp)
        .await
        .map_err(|e| io_err(tmp, e))?;
    let mut writer = BufWriter::new(file);

    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .await
            .map_err(|e| io_err(source, e))?;
        if bytes_read == 0 {
            break;
        }
        writer
            .write_all(&buffer[..bytes_read])
            .await
            .map_err(|e| io_err(tmp, e))?;
    }

    writer.flush().await.map_err(|e| io_err(tmp, e))
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn io_err(path: &Path, e: std::io::Error) -> FetchError {
    FetchError::Io {
        dest: path.to_path_buf(),
        source: e,
    }
}
