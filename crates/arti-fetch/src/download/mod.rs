//! Streaming archive download with exponential-backoff retries.
//!
//! Transport-level failures (DNS, connect, timeout) are retried with a
//! growing delay, each retry logged with the error class and the
//! computed wait. Status failures are never retried: a registry that
//! answered is not going to answer differently in two hundred
//! milliseconds, and the caller needs the status to translate it.

use std::path::Path;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use arti_core::{ArtiError, ArtiResult};
use arti_registry::client::transport_error;
use arti_registry::RegistryClient;

/// Fixed archive filename inside the session's working directory
pub const ARCHIVE_FILENAME: &str = "package.tar.gz";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// Download `url` into the file at `dest`, retrying transport failures
/// per `retry`.
pub async fn download(
    client: &RegistryClient,
    url: &str,
    dest: &Path,
    retry: &RetryConfig,
) -> ArtiResult<()> {
    let mut delay = retry.initial_delay;
    let mut attempt = 0;

    loop {
        match stream_to_file(client, url, dest).await {
            Ok(()) => return Ok(()),
            Err(err) if err.is_retryable() && attempt < retry.max_retries => {
                attempt += 1;
                debug!(error = %err, "download error");
                warn!(
                    "download of {url} failed with {}, retrying in {:.1}s",
                    err.code(),
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                delay = next_delay(delay, retry);
            }
            Err(err) => return Err(err),
        }
    }
}

fn next_delay(current: Duration, retry: &RetryConfig) -> Duration {
    let scaled = current.as_millis() as f64 * retry.multiplier;
    Duration::from_millis(scaled as u64).min(retry.max_delay)
}

async fn stream_to_file(client: &RegistryClient, url: &str, dest: &Path) -> ArtiResult<()> {
    let mut response = client.get(url).await?;
    let total = response.content_length();

    let mut file = File::create(dest)
        .await
        .map_err(|e| ArtiError::io(format!("failed to create {}", dest.display()), e))?;

    let mut received: u64 = 0;
    let mut reported_mb: u64 = 0;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| transport_error(url, &e))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| ArtiError::io(format!("failed to write {}", dest.display()), e))?;
        received += chunk.len() as u64;

        let whole_mb = received / (1024 * 1024);
        if whole_mb > reported_mb {
            reported_mb = whole_mb;
            report_progress(received, total);
        }
    }

    file.flush()
        .await
        .map_err(|e| ArtiError::io(format!("failed to flush {}", dest.display()), e))?;
    Ok(())
}

fn report_progress(received: u64, total: Option<u64>) {
    let mut msg = format!("received {:.1}MB", received as f64 / BYTES_PER_MB);
    if let Some(total) = total.filter(|total| *total > 0) {
        msg += &format!(
            " of {:.1}MB downloaded, {}%",
            total as f64 / BYTES_PER_MB,
            received * 100 / total
        );
    }
    info!("{msg}");
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use arti_config::Config;

    fn test_client() -> RegistryClient {
        RegistryClient::new(&Config::default()).unwrap()
    }

    fn quick_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_download_writes_body_to_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/binaries/acme/widgets.git/1.0.0"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(ARCHIVE_FILENAME);
        let url = format!("{}/binaries/acme/widgets.git/1.0.0", server.uri());

        download(&test_client(), &url, &dest, &quick_retry())
            .await
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"archive-bytes");
    }

    #[tokio::test]
    async fn test_status_failure_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(ARCHIVE_FILENAME);

        let err = download(&test_client(), &server.uri(), &dest, &quick_retry())
            .await
            .unwrap_err();
        match err {
            ArtiError::InvalidResponse { status, .. } => assert_eq!(status, 500),
            other => panic!("expected InvalidResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_exhausts_retries() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(ARCHIVE_FILENAME);

        // Nothing listens on port 1
        let err = download(
            &test_client(),
            "http://127.0.0.1:1/archive",
            &dest,
            &quick_retry(),
        )
        .await
        .unwrap_err();
        match err {
            ArtiError::Transport { .. } => {}
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        let retry = RetryConfig {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(150),
            multiplier: 2.0,
        };
        assert_eq!(
            next_delay(Duration::from_millis(100), &retry),
            Duration::from_millis(150)
        );
    }
}
