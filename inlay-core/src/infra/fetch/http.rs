use std::fmt;

use async_trait::async_trait;
use inlay_model::ImageReference;
use tracing::debug;
use url::Url;

use super::ImageFetcher;
use crate::{
    config::FetchConfig,
    error::{InlayError, Result},
};

/// HTTP(S) fetcher backed by a pooled `reqwest` client.
///
/// Transport concerns (TLS, timeouts, connection reuse) stay inside the
/// client; this type only maps responses onto the crate's error taxonomy.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("http_client", &self.client)
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .finish()
    }
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        // Avoid compressed, range-susceptible responses for binary assets.
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .no_deflate()
            .no_zstd()
            .no_brotli()
            .no_gzip()
            .build()
            .map_err(|err| {
                InlayError::Internal(format!(
                    "failed to build HTTP client: {err}"
                ))
            })?;

        let base_url = config
            .base_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|err| {
                InlayError::Config(format!("fetch.base_url: {err}"))
            })?;

        Ok(Self { client, base_url })
    }

    /// Absolute URL for `reference`, joined onto the base URL when the
    /// reference is relative.
    pub fn url_for(&self, reference: &ImageReference) -> Result<Url> {
        let parsed = if reference.is_absolute() {
            Url::parse(reference.as_str())
        } else {
            let Some(base) = &self.base_url else {
                return Err(InlayError::Network(format!(
                    "relative reference without a base URL: {reference}"
                )));
            };
            base.join(reference.as_str())
        };
        let url = parsed.map_err(|err| {
            InlayError::Network(format!("invalid image URL {reference}: {err}"))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(InlayError::Network(format!(
                "unsupported scheme {scheme:?} for {reference}"
            ))),
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, reference: &ImageReference) -> Result<Vec<u8>> {
        let url = self.url_for(reference)?;
        debug!(url = %url, "[http_fetch] requesting image");

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(InlayError::HttpStatus {
                status: response.status(),
                url: url.to_string(),
            });
        }

        let expected_len = response.content_length();
        let bytes = response.bytes().await?;

        if let Some(content_len) = expected_len
            && bytes.len() as u64 != content_len
        {
            return Err(InlayError::Network(format!(
                "image size mismatch for {url}: got {} bytes, expected {content_len}",
                bytes.len(),
            )));
        }

        debug!(url = %url, bytes = bytes.len(), "[http_fetch] received image");
        Ok(bytes.to_vec())
    }
}
