//! The minimal transport seam the reference reader and range resolver fetch
//! bytes through. Kept deliberately small (no retries, auth headers, or
//! checksum verification — see the teacher's `kargo-maven::download` for
//! the full production version this is simplified from) so that a fixture
//! implementation can exercise the engine end-to-end without the network.

use async_trait::async_trait;
use reqwest::Client;

/// Fetches raw bytes from a repository URL. `None` means "not found in
/// this repository" (the caller tries the next repository, if any);
/// `Err` means the fetch itself failed.
#[async_trait]
pub trait ArtifactTransport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, TransportError>;
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("transport error fetching {url}: {message}")]
pub struct TransportError {
    pub url: String,
    pub message: String,
}

/// Production transport backed by `reqwest`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent("resolvecore/0.1")
                .build()
                .expect("reqwest client config is valid"),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactTransport for ReqwestTransport {
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, TransportError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError { url: url.to_string(), message: e.to_string() })?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(TransportError { url: url.to_string(), message: format!("HTTP {}", resp.status()) });
        }
        let bytes = resp.bytes().await.map_err(|e| TransportError { url: url.to_string(), message: e.to_string() })?;
        Ok(Some(bytes.to_vec()))
    }
}

/// In-memory fixture transport for tests: an exact-match URL-to-bytes
/// table, no network involved.
#[derive(Default, Clone)]
pub struct FixtureTransport {
    files: std::collections::BTreeMap<String, Vec<u8>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, url: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.insert(url.into(), contents.into());
        self
    }
}

#[async_trait]
impl ArtifactTransport for FixtureTransport {
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.files.get(url).cloned())
    }
}
