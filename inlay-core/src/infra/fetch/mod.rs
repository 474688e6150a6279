//! Network retrieval of raw image bytes.
//!
//! Fetchers never retry and never touch the disk cache; the resolver owns
//! both decisions.

pub mod http;

pub use http::HttpFetcher;

use async_trait::async_trait;
use inlay_model::ImageReference;
use tokio_util::sync::CancellationToken;

use crate::error::{InlayError, Result};

/// Trait for retrieving image bytes for a reference.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch the raw bytes exactly as the remote source serves them.
    async fn fetch(&self, reference: &ImageReference) -> Result<Vec<u8>>;
}

/// Run `fetcher` until it finishes or `cancel` fires.
///
/// On cancellation the in-flight fetch future is dropped, which aborts the
/// underlying request instead of leaving it running detached.
pub async fn fetch_cancellable(
    fetcher: &dyn ImageFetcher,
    reference: &ImageReference,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            Err(InlayError::Cancelled(reference.to_string()))
        }
        result = fetcher.fetch(reference) => result,
    }
}
