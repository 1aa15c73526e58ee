use crate::catalog::{Build, Catalog};
use crate::platform::Platform;
use crate::version::SolcVersion;
use crate::{Result, SvmError};
use async_trait::async_trait;
use tracing::debug;

/// Where catalogs and compiler binaries come from.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn fetch_catalog(&self, platform: Platform) -> Result<Catalog>;

    /// Downloads the artifact `build` names. `session` reuses a caller's HTTP
    /// connection pool when the source talks HTTP.
    async fn fetch_binary(
        &self,
        platform: Platform,
        version: &SolcVersion,
        build: &Build,
        session: Option<reqwest::Client>,
    ) -> Result<Vec<u8>>;
}

/// The official mirror layout: `<base>/<platform>/list.json` and
/// `<base>/<platform>/<path>`.
#[derive(Debug, Clone)]
pub struct HttpReleaseSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpReleaseSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, platform: Platform, file: &str) -> String {
        format!("{}/{}/{}", self.base_url, platform, file)
    }
}

#[async_trait]
impl ReleaseSource for HttpReleaseSource {
    async fn fetch_catalog(&self, platform: Platform) -> Result<Catalog> {
        let url = self.url(platform, "list.json");
        debug!(%url, "Fetching release catalog");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SvmError::Catalog(format!("{}: {}", url, e)))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SvmError::Catalog(format!("{}: {}", url, e)))?;
        Catalog::parse(&bytes)
    }

    async fn fetch_binary(
        &self,
        platform: Platform,
        version: &SolcVersion,
        build: &Build,
        session: Option<reqwest::Client>,
    ) -> Result<Vec<u8>> {
        let url = self.url(platform, &build.path);
        let failure = |e: reqwest::Error| SvmError::TransferFailure {
            version: version.clone(),
            reason: format!("{}: {}", url, e),
        };

        let client = session.unwrap_or_else(|| self.client.clone());
        let mut response = client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(failure)?;

        let mut body = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);
        while let Some(chunk) = response.chunk().await.map_err(failure)? {
            body.extend_from_slice(&chunk);
        }
        debug!(%url, bytes = body.len(), "Downloaded compiler");
        Ok(body)
    }
}
