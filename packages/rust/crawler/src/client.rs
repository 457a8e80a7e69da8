//! HTTP client for the documentation site.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use cdkdocset_shared::{DocsetError, FetchConfig, Result, SiteConfig};

/// User-Agent string for site requests.
const USER_AGENT: &str = concat!("cdk-docset/", env!("CARGO_PKG_VERSION"));

/// Retrieves site resources by path. Cheap to clone; clones share a connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    base_url: Url,
}

impl Fetcher {
    /// Create a fetcher for the configured site.
    pub fn new(site: &SiteConfig, fetch: &FetchConfig) -> Result<Self> {
        let base_url = Url::parse(&site.base_url)
            .map_err(|e| DocsetError::config(format!("invalid base_url {}: {e}", site.base_url)))?;
        Self::with_base_url(base_url, Duration::from_secs(fetch.timeout_secs))
    }

    pub fn with_base_url(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| DocsetError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL of a site path.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DocsetError::parse(format!("cannot resolve {path}: {e}")))
    }

    /// Raw bytes of the resource at `path`. Any non-2xx status is an error.
    #[instrument(skip(self))]
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.url_for(path)?;
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| DocsetError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocsetError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DocsetError::Network(format!("{url}: body read failed: {e}")))?;
        debug!(%url, size = body.len(), "fetched");
        Ok(body.to_vec())
    }

    /// The resource at `path` decoded as UTF-8 (invalid sequences replaced).
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let bytes = self.get_bytes(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
