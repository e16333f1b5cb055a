//! Catalog providers.
//!
//! The playback engine never talks HTTP itself; it is handed a
//! [`CatalogProvider`] and asks it for a fresh [`Catalog`].

use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use crate::types::ErrorPayload;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Source of track catalogs.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch the complete, validated track list.
    async fn fetch_tracks(&self) -> Result<Catalog>;
}

/// Configuration for [`HttpCatalogProvider`].
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Full URL of the tracks endpoint (e.g. "http://localhost:8080/api/tracks")
    pub url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Fetches the catalog with a single `GET` request.
pub struct HttpCatalogProvider {
    http: Client,
    url: Url,
}

impl HttpCatalogProvider {
    /// Create a provider for the given endpoint.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(CatalogError::InvalidUrl("URL cannot be empty".into()));
        }

        let url = Url::parse(config.url.trim())
            .map_err(|e| CatalogError::InvalidUrl(format!("{}: {}", config.url, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(CatalogError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Reverie/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, url })
    }

    /// Endpoint this provider reads from.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

#[async_trait]
impl CatalogProvider for HttpCatalogProvider {
    async fn fetch_tracks(&self) -> Result<Catalog> {
        debug!(url = %self.url, "Fetching track catalog");

        let response = self.http.get(self.url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorPayload>(&body)
                .map(|payload| payload.error)
                .unwrap_or_else(|_| body.trim().to_string());

            warn!(status = status.as_u16(), message = %message, "Catalog provider returned an error");

            return Err(CatalogError::Provider {
                status: Some(status.as_u16()),
                message,
            });
        }

        let catalog = Catalog::from_json(&body)?;
        info!(tracks = catalog.len(), "Fetched track catalog");

        Ok(catalog)
    }
}

/// Provider that always returns the same body.
///
/// Useful for hosts that embed their catalog and for tests.
#[derive(Debug, Clone)]
pub struct StaticCatalogProvider {
    body: String,
}

impl StaticCatalogProvider {
    /// Serve a raw JSON body, validated on every fetch.
    pub fn from_json(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Serve an existing catalog.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let body = serde_json::to_string(catalog.tracks()).unwrap_or_else(|_| "[]".to_string());
        Self { body }
    }
}

#[async_trait]
impl CatalogProvider for StaticCatalogProvider {
    async fn fetch_tracks(&self) -> Result<Catalog> {
        Catalog::from_json(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_url() {
        let result = HttpCatalogProvider::new(ProviderConfig::new(""));
        assert!(matches!(result, Err(CatalogError::InvalidUrl(msg)) if msg.contains("empty")));
    }

    #[test]
    fn rejects_non_http_scheme() {
        let result = HttpCatalogProvider::new(ProviderConfig::new("ftp://example.com/tracks"));
        assert!(matches!(result, Err(CatalogError::InvalidUrl(_))));
    }

    #[test]
    fn rejects_unparseable_url() {
        let result = HttpCatalogProvider::new(ProviderConfig::new("not a url"));
        assert!(matches!(result, Err(CatalogError::InvalidUrl(_))));
    }

    #[test]
    fn keeps_endpoint_path() {
        let provider =
            HttpCatalogProvider::new(ProviderConfig::new("http://localhost:8080/api/tracks"))
                .unwrap();
        assert_eq!(provider.url(), "http://localhost:8080/api/tracks");
    }

    #[tokio::test]
    async fn static_provider_validates_body() {
        let provider = StaticCatalogProvider::from_json("{\"error\": \"offline\"}");
        assert!(matches!(
            provider.fetch_tracks().await,
            Err(CatalogError::Provider { .. })
        ));

        let provider = StaticCatalogProvider::from_json(
            r#"[{"id": 1, "title": "A", "artist": "B", "durationSeconds": 3, "sourceLocator": "/a.mp3"}]"#,
        );
        assert_eq!(provider.fetch_tracks().await.unwrap().len(), 1);
    }
}
