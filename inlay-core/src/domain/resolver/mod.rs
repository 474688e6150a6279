//! Turns image references into renderable handles.
//!
//! The [`Resolver`] is owned by the render thread and answers every
//! [`Resolver::resolve`] call synchronously: a cache hit comes back as a
//! ready image, anything else as a placeholder. Cache misses are fetched on
//! the runtime, and their outcomes are marshalled back over a channel so
//! that batch counting and the session's memory only ever change on the
//! thread that owns the resolver. [`Resolver::pump`] and
//! [`Resolver::wait_for_completion`] apply those outcomes.

pub mod handle;
pub mod probe;
mod task;

pub use handle::{ImageHandle, RenderPass, ResolvedImage};

use std::{collections::HashMap, fmt, sync::Arc};

use inlay_model::{
    BatchComplete, CacheKey, FailureKind, Generation, ImageReference,
    ImageSource, PlaceholderReason, Resolution, ResolverEvent,
};
use tokio::{
    runtime::Handle,
    sync::{Semaphore, broadcast, mpsc},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use self::task::{FetchJob, FetchOutcome};
use crate::{
    config::ResolverConfig,
    domain::batch::{BatchTracker, Report},
    error::{InlayError, Result},
    infra::{cache::DiskStore, fetch::ImageFetcher},
};

/// An outstanding fetch shared by every occurrence of one key in a pass.
struct PendingFetch {
    reference: ImageReference,
    /// Occurrences of the key waiting on this fetch; each reports once.
    waiters: usize,
    token: CancellationToken,
}

enum CacheLookup {
    Hit(Arc<ResolvedImage>),
    Miss,
    Corrupt,
}

/// Resolves the images of one document view.
///
/// Fetch failures are remembered for the life of the resolver, so a later
/// pass over the same view shows them as failed without refetching. Hosts
/// that reopen a document should build a fresh resolver for it (or call
/// [`Resolver::forget_failures`]) so every reference starts out requested
/// again.
pub struct Resolver {
    config: ResolverConfig,
    store: DiskStore,
    fetcher: Arc<dyn ImageFetcher>,
    runtime: Handle,
    permits: Arc<Semaphore>,
    tracker: BatchTracker,
    session: CancellationToken,
    pass: CancellationToken,
    pending: HashMap<CacheKey, PendingFetch>,
    /// Fetched this session but never persisted.
    fallback: HashMap<CacheKey, Arc<ResolvedImage>>,
    /// Fetch failures are not retried until [`Resolver::forget_failures`].
    failed: HashMap<CacheKey, FailureKind>,
    outcomes_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    events: broadcast::Sender<ResolverEvent>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("cache_dir", &self.store.root())
            .field("generation", &self.tracker.current())
            .field("progress", &self.tracker.progress())
            .field("pending", &self.pending.len())
            .field("fallback", &self.fallback.len())
            .field("failed", &self.failed.len())
            .finish()
    }
}

impl Resolver {
    /// Fetches are spawned onto `runtime`; the resolver itself may live on
    /// any thread.
    pub fn new(
        config: ResolverConfig,
        fetcher: Arc<dyn ImageFetcher>,
        runtime: Handle,
    ) -> Result<Self> {
        config.validate()?;

        let store = DiskStore::new(&config.cache_dir);
        // A broken cache directory degrades to fetch-only; it is not fatal.
        if let Err(err) = store.ensure_root() {
            warn!(
                cache_dir = %store.root().display(),
                "[resolver] cache directory unavailable: {err}"
            );
        }

        let session = CancellationToken::new();
        let pass = session.child_token();
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(config.event_capacity);

        Ok(Self {
            permits: Arc::new(Semaphore::new(config.fetch.max_concurrent)),
            config,
            store,
            fetcher,
            runtime,
            tracker: BatchTracker::new(),
            session,
            pass,
            pending: HashMap::new(),
            fallback: HashMap::new(),
            failed: HashMap::new(),
            outcomes_tx,
            outcomes_rx,
            events,
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn store(&self) -> &DiskStore {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResolverEvent> {
        self.events.subscribe()
    }

    pub fn current_generation(&self) -> Option<Generation> {
        self.tracker.current()
    }

    /// Number of distinct keys with a fetch in flight for the current pass.
    pub fn pending_fetches(&self) -> usize {
        self.pending.len()
    }

    /// Start a render pass over `expected_total` references. Outstanding
    /// fetches from the previous pass are cancelled and their outcomes
    /// will be discarded.
    pub fn begin_pass(&mut self, expected_total: usize) -> Generation {
        self.pass.cancel();
        self.pass = self.session.child_token();
        self.pending.clear();

        let generation = self.tracker.begin(expected_total);
        debug!(
            generation = %generation,
            expected = expected_total,
            "[resolver] pass started"
        );
        if let Some(done) = self.tracker.completion() {
            self.announce(done);
        }
        generation
    }

    /// Resolve one reference of the current pass.
    ///
    /// Never blocks on the network. Every failure on the image's own path
    /// becomes a placeholder; only a broken batch protocol is an error.
    pub fn resolve(&mut self, reference: &ImageReference) -> Result<ImageHandle> {
        let generation = self.tracker.claim()?;
        let key = CacheKey::derive(reference);

        if let Some(kind) = self.failed.get(&key).copied() {
            debug!(
                reference = %reference,
                kind = %kind,
                "[resolver] reusing failure from earlier pass"
            );
            self.settle_failure(generation, reference, kind, 1)?;
            return Ok(self.placeholder(PlaceholderReason::Failed(kind)));
        }

        if let Some(pending) = self.pending.get_mut(&key) {
            pending.waiters += 1;
            return Ok(self.placeholder(PlaceholderReason::Loading));
        }

        if let Some(image) = self.fallback.get(&key).cloned() {
            self.settle_ready(generation, &image, false, 1)?;
            return Ok(ImageHandle::Ready(image));
        }

        match self.lookup_cached(&key, reference) {
            CacheLookup::Hit(image) => {
                self.settle_ready(generation, &image, false, 1)?;
                return Ok(ImageHandle::Ready(image));
            }
            CacheLookup::Corrupt => {
                self.settle_failure(
                    generation,
                    reference,
                    FailureKind::Decode,
                    1,
                )?;
                return Ok(self.placeholder(PlaceholderReason::Failed(
                    FailureKind::Decode,
                )));
            }
            CacheLookup::Miss => {}
        }

        self.spawn_fetch(generation, key, reference.clone());
        Ok(self.placeholder(PlaceholderReason::Loading))
    }

    /// Begin a pass over `references` and resolve each of them in order.
    pub fn resolve_all(
        &mut self,
        references: &[ImageReference],
    ) -> Result<RenderPass> {
        let generation = self.begin_pass(references.len());
        let handles = references
            .iter()
            .map(|reference| self.resolve(reference))
            .collect::<Result<Vec<_>>>()?;

        Ok(RenderPass {
            generation,
            handles,
            completed: self.tracker.completion(),
        })
    }

    /// Apply every fetch outcome that has already arrived, without waiting.
    /// Returns the current batch's completion once it has fired.
    pub fn pump(&mut self) -> Result<Option<BatchComplete>> {
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            self.apply(outcome)?;
        }
        Ok(self.tracker.completion())
    }

    /// Apply fetch outcomes as they arrive until the current batch fires.
    pub async fn wait_for_completion(&mut self) -> Result<BatchComplete> {
        loop {
            if let Some(done) = self.pump()? {
                return Ok(done);
            }

            let Some((resolved, expected)) = self.tracker.progress() else {
                return Err(InlayError::BatchProtocol(
                    "waiting for completion with no active batch".into(),
                ));
            };
            if self.pending.is_empty() {
                return Err(InlayError::BatchProtocol(format!(
                    "batch stalled at {resolved} of {expected} with no fetch outstanding"
                )));
            }

            match self.outcomes_rx.recv().await {
                Some(outcome) => self.apply(outcome)?,
                None => {
                    return Err(InlayError::Internal(
                        "fetch outcome channel closed".into(),
                    ));
                }
            }
        }
    }

    /// Give up on one outstanding fetch. Every occurrence waiting on it
    /// reports as cancelled once the outcome is applied.
    pub fn abandon(&mut self, reference: &ImageReference) -> bool {
        let key = CacheKey::derive(reference);
        match self.pending.get(&key) {
            Some(pending) => {
                debug!(reference = %reference, "[resolver] abandoning fetch");
                pending.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Clear remembered fetch failures so the next pass tries them again.
    /// Use this when the same resolver is kept across a document being
    /// closed and reopened.
    pub fn forget_failures(&mut self) -> usize {
        let forgotten = self.failed.len();
        self.failed.clear();
        forgotten
    }

    /// Tear down the session. Outstanding fetches are cancelled; in-flight
    /// cache writes are left to finish.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.session.cancel();
        self.pending.clear();
        if let Some(generation) = self.tracker.current() {
            self.tracker.end(generation);
            debug!(generation = %generation, "[resolver] session closed");
        }
    }

    fn placeholder(&self, reason: PlaceholderReason) -> ImageHandle {
        ImageHandle::Placeholder(self.config.layout.placeholder(reason))
    }

    fn lookup_cached(
        &self,
        key: &CacheKey,
        reference: &ImageReference,
    ) -> CacheLookup {
        match self.store.has(key) {
            Ok(true) => {}
            Ok(false) => return CacheLookup::Miss,
            Err(err) => {
                warn!(
                    reference = %reference,
                    "[resolver] cache check failed, treating as miss: {err}"
                );
                return CacheLookup::Miss;
            }
        }

        let bytes = match self.store.read(key) {
            Ok(bytes) => bytes,
            Err(InlayError::NotFound(_)) => return CacheLookup::Miss,
            Err(err) => {
                warn!(
                    reference = %reference,
                    "[resolver] cache read failed, treating as miss: {err}"
                );
                return CacheLookup::Miss;
            }
        };

        match probe::decode_dimensions(&bytes) {
            Ok(intrinsic) => CacheLookup::Hit(Arc::new(ResolvedImage {
                reference: reference.clone(),
                key: key.clone(),
                bytes: bytes.into(),
                intrinsic,
                display: self.config.layout.display_size(intrinsic),
                source: ImageSource::Disk,
            })),
            Err(err) => {
                warn!(
                    cache.key = %key,
                    reference = %reference,
                    "[resolver] evicting undecodable cache entry: {err}"
                );
                if let Err(err) = self.store.remove(key) {
                    warn!(cache.key = %key, "[resolver] eviction failed: {err}");
                }
                CacheLookup::Corrupt
            }
        }
    }

    fn spawn_fetch(
        &mut self,
        generation: Generation,
        key: CacheKey,
        reference: ImageReference,
    ) {
        let token = self.pass.child_token();
        debug!(
            generation = %generation,
            reference = %reference,
            cache.key = %key,
            "[resolver] cache miss, fetching"
        );

        let job = FetchJob {
            generation,
            key: key.clone(),
            reference: reference.clone(),
            fetcher: Arc::clone(&self.fetcher),
            store: self.store.clone(),
            permits: Arc::clone(&self.permits),
            token: token.clone(),
            outcomes: self.outcomes_tx.clone(),
        };
        self.runtime.spawn(task::run(job));

        self.pending.insert(
            key,
            PendingFetch {
                reference,
                waiters: 1,
                token,
            },
        );
    }

    fn apply(&mut self, outcome: FetchOutcome) -> Result<()> {
        if self.tracker.current() != Some(outcome.generation) {
            debug!(
                generation = %outcome.generation,
                reference = %outcome.reference,
                "[resolver] discarding outcome from superseded pass"
            );
            return Ok(());
        }
        let Some(pending) = self.pending.remove(&outcome.key) else {
            debug!(
                reference = %outcome.reference,
                "[resolver] discarding outcome with no waiters"
            );
            return Ok(());
        };

        let result = if pending.token.is_cancelled() {
            Err(InlayError::Cancelled(pending.reference.to_string()))
        } else {
            outcome.result
        };

        match result {
            Ok(fetched) => {
                let source = if fetched.persisted {
                    ImageSource::Network
                } else {
                    ImageSource::Memory
                };
                let image = Arc::new(ResolvedImage {
                    reference: pending.reference,
                    key: outcome.key.clone(),
                    bytes: fetched.bytes,
                    intrinsic: fetched.intrinsic,
                    display: self.config.layout.display_size(fetched.intrinsic),
                    source,
                });
                if !fetched.persisted {
                    self.fallback.insert(outcome.key, Arc::clone(&image));
                }
                self.settle_ready(
                    outcome.generation,
                    &image,
                    true,
                    pending.waiters,
                )
            }
            Err(err) => {
                let kind = err.failure_kind();
                warn!(
                    generation = %outcome.generation,
                    reference = %pending.reference,
                    kind = %kind,
                    "[resolver] image failed: {err}"
                );
                if kind != FailureKind::Cancelled {
                    self.failed.insert(outcome.key, kind);
                }
                self.settle_failure(
                    outcome.generation,
                    &pending.reference,
                    kind,
                    pending.waiters,
                )
            }
        }
    }

    fn settle_ready(
        &mut self,
        generation: Generation,
        image: &ResolvedImage,
        fetched: bool,
        occurrences: usize,
    ) -> Result<()> {
        let _ = self.events.send(ResolverEvent::ImageReady {
            generation,
            reference: image.reference.clone(),
            key: image.key.clone(),
            source: image.source,
        });
        for _ in 0..occurrences {
            self.record(generation, Resolution::Succeeded { fetched })?;
        }
        Ok(())
    }

    fn settle_failure(
        &mut self,
        generation: Generation,
        reference: &ImageReference,
        kind: FailureKind,
        occurrences: usize,
    ) -> Result<()> {
        let _ = self.events.send(ResolverEvent::ImageFailed {
            generation,
            reference: reference.clone(),
            kind,
        });
        for _ in 0..occurrences {
            self.record(generation, Resolution::Failed(kind))?;
        }
        Ok(())
    }

    fn record(
        &mut self,
        generation: Generation,
        resolution: Resolution,
    ) -> Result<()> {
        if let Report::Completed(done) =
            self.tracker.report(generation, resolution)?
        {
            self.announce(done);
        }
        Ok(())
    }

    fn announce(&self, done: BatchComplete) {
        info!(
            generation = %done.generation,
            expected = done.expected,
            succeeded = done.succeeded,
            failed = done.failed,
            fetched = done.fetched,
            "[resolver] batch complete"
        );
        let _ = self.events.send(ResolverEvent::BatchComplete(done));
    }
}

impl Drop for Resolver {
    fn drop(&mut self) {
        self.shutdown();
    }
}
