//! The off-thread half of a cache miss: fetch, decode, persist, then hand the
//! result back to the resolver over a channel.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use inlay_model::{CacheKey, Generation, ImageDimensions, ImageReference};
use tokio::sync::{Semaphore, mpsc::UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::probe;
use crate::{
    error::{InlayError, Result},
    infra::{
        cache::DiskStore,
        fetch::{ImageFetcher, fetch_cancellable},
    },
};

/// Bytes that arrived over the network and decoded cleanly.
pub(super) struct FetchedImage {
    pub bytes: Arc<[u8]>,
    pub intrinsic: ImageDimensions,
    /// False when the disk write failed; the image only lives in memory.
    pub persisted: bool,
}

/// Delivered back to the resolver for every spawned fetch, whatever happened.
pub(super) struct FetchOutcome {
    pub generation: Generation,
    pub key: CacheKey,
    pub reference: ImageReference,
    pub result: Result<FetchedImage>,
}

pub(super) struct FetchJob {
    pub generation: Generation,
    pub key: CacheKey,
    pub reference: ImageReference,
    pub fetcher: Arc<dyn ImageFetcher>,
    pub store: DiskStore,
    pub permits: Arc<Semaphore>,
    pub token: CancellationToken,
    pub outcomes: UnboundedSender<FetchOutcome>,
}

/// Always sends exactly one outcome, even when the fetcher panics, so the
/// key leaves the pending set and the batch can still complete.
pub(super) async fn run(job: FetchJob) {
    let result = match AssertUnwindSafe(fetch_decode_persist(&job))
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!(
                cache.key = %job.key,
                reference = %job.reference,
                "[resolver] fetch task panicked: {message}"
            );
            Err(InlayError::Internal(format!("fetch panicked: {message}")))
        }
    };
    let outcome = FetchOutcome {
        generation: job.generation,
        key: job.key,
        reference: job.reference,
        result,
    };
    if job.outcomes.send(outcome).is_err() {
        debug!("[resolver] resolver gone before fetch outcome was delivered");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}

async fn fetch_decode_persist(job: &FetchJob) -> Result<FetchedImage> {
    let _permit = tokio::select! {
        biased;
        _ = job.token.cancelled() => {
            return Err(InlayError::Cancelled(job.reference.to_string()));
        }
        permit = Arc::clone(&job.permits).acquire_owned() => permit.map_err(|_| {
            InlayError::Internal("fetch permits closed".into())
        })?,
    };

    let bytes: Arc<[u8]> =
        fetch_cancellable(job.fetcher.as_ref(), &job.reference, &job.token)
            .await?
            .into();

    // Undecodable bytes never reach the disk.
    let intrinsic = {
        let bytes = Arc::clone(&bytes);
        tokio::task::spawn_blocking(move || probe::decode_dimensions(&bytes))
            .await
            .map_err(|err| {
                InlayError::Internal(format!("decode task failed: {err}"))
            })??
    };

    let persisted = match job.store.write(&job.key, &bytes).await {
        Ok(_) => true,
        Err(err) => {
            warn!(
                cache.key = %job.key,
                reference = %job.reference,
                persisted = false,
                "[resolver] cache write failed, keeping image in memory: {err}"
            );
            false
        }
    };

    Ok(FetchedImage {
        bytes,
        intrinsic,
        persisted,
    })
}
