//! Download-then-extract orchestration.
//!
//! Transport and extraction failures are recovered locally: the working
//! directory is cleared and a [`DownloadOutcome::RetryRequested`] is
//! returned so the host can fall back to another resolution strategy
//! (typically a plain Git clone). Status failures are hard errors,
//! translated into the taxonomy the host displays.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use arti_core::{ArtiError, ArtiResult};
use arti_registry::RegistryClient;

use crate::download::{self, RetryConfig, ARCHIVE_FILENAME};
use crate::extract;

/// Result of one fetch attempt. Created fresh per resolution attempt,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Archive downloaded and unpacked into the directory
    Extracted(PathBuf),
    /// Download or extraction failed locally; the host should fall back
    /// to an alternative resolution strategy
    RetryRequested { reason: String },
}

/// Downloads and unpacks archives for a resolution session
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: RegistryClient,
    retry: RetryConfig,
}

impl ArtifactFetcher {
    pub fn new(client: RegistryClient) -> Self {
        Self::with_retry(client, RetryConfig::default())
    }

    pub fn with_retry(client: RegistryClient, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    /// Download the archive at `url` into `work_dir` and unpack it
    /// there.
    ///
    /// `target` names the tag/branch/version being fetched and is only
    /// used for error reporting. On a 404 the registry's JSON error body
    /// is fetched so the user sees the server's own diagnostic.
    pub async fn fetch_and_extract(
        &self,
        url: &str,
        target: &str,
        work_dir: &Path,
    ) -> ArtiResult<DownloadOutcome> {
        let archive = work_dir.join(ARCHIVE_FILENAME);

        match download::download(&self.client, url, &archive, &self.retry).await {
            Ok(()) => {}
            Err(ArtiError::InvalidResponse { url, status: 404 }) => {
                let details = self.client.error_message(&url).await;
                return Err(ArtiError::TargetNotFound {
                    target: target.to_string(),
                    details,
                });
            }
            Err(err @ ArtiError::InvalidResponse { .. }) => return Err(err),
            Err(err) => {
                debug!(error = %err, "download error");
                warn!("download of {url} failed with {}, falling back", err.code());
                clean_dir(work_dir).await?;
                return Ok(DownloadOutcome::RetryRequested {
                    reason: err.to_string(),
                });
            }
        }

        match run_extract(&archive, work_dir).await {
            Ok(()) => {
                // Leave only the unpacked tree in the directory
                let _ = tokio::fs::remove_file(&archive).await;
                Ok(DownloadOutcome::Extracted(work_dir.to_path_buf()))
            }
            Err(err) => {
                debug!(error = %err, "extraction error");
                warn!(
                    "decompression of {} failed with {}, falling back",
                    archive.display(),
                    err.code()
                );
                clean_dir(work_dir).await?;
                Ok(DownloadOutcome::RetryRequested {
                    reason: err.to_string(),
                })
            }
        }
    }
}

/// Extraction walks the whole archive synchronously, so it runs on the
/// blocking pool.
async fn run_extract(archive: &Path, dest_dir: &Path) -> ArtiResult<()> {
    let archive = archive.to_path_buf();
    let dest_dir = dest_dir.to_path_buf();
    let display = archive.display().to_string();

    tokio::task::spawn_blocking(move || extract::extract_archive(&archive, &dest_dir))
        .await
        .map_err(|e| ArtiError::Extraction {
            archive: display,
            message: format!("extraction task failed: {e}"),
        })?
}

/// Remove everything inside `dir`, keeping the directory itself.
pub async fn clean_dir(dir: &Path) -> ArtiResult<()> {
    let io_err = |e| ArtiError::io(format!("failed to clean {}", dir.display()), e);

    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(io_err)?;
        if file_type.is_dir() {
            tokio::fs::remove_dir_all(&path).await.map_err(io_err)?;
        } else {
            tokio::fs::remove_file(&path).await.map_err(io_err)?;
        }
    }
    Ok(())
}
