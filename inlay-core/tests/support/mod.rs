#![allow(dead_code)]

use std::{
    collections::HashMap,
    io::Cursor,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use inlay_core::{
    InlayError, ResolverConfig, Result,
    model::ImageReference,
};
use tokio::sync::{Notify, Semaphore};

/// Encoded PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

pub fn reference(url: &str) -> ImageReference {
    ImageReference::from(url)
}

pub fn config(cache_dir: &Path) -> ResolverConfig {
    ResolverConfig::default()
        .with_cache_dir(cache_dir)
        .with_render_width(600)
}

#[derive(Clone)]
enum Response {
    Bytes(Vec<u8>),
    Fail,
}

/// In-memory stand-in for the network. Optionally gated so a test can hold
/// fetches in flight until it adds permits.
#[derive(Default)]
pub struct FakeFetcher {
    responses: Mutex<HashMap<String, Response>>,
    calls: Mutex<HashMap<String, usize>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(self, url: &str, bytes: Vec<u8>) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .insert(url.to_string(), Response::Bytes(bytes));
        self
    }

    pub fn fail(self, url: &str) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .insert(url.to_string(), Response::Fail);
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl inlay_core::ImageFetcher for FakeFetcher {
    async fn fetch(&self, reference: &ImageReference) -> Result<Vec<u8>> {
        *self
            .calls
            .lock()
            .expect("calls lock")
            .entry(reference.to_string())
            .or_default() += 1;

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.expect("gate open");
        }

        let response = self
            .responses
            .lock()
            .expect("responses lock")
            .get(reference.as_str())
            .cloned();
        match response {
            Some(Response::Bytes(bytes)) => Ok(bytes),
            Some(Response::Fail) => {
                Err(InlayError::Network(format!("connection reset: {reference}")))
            }
            None => Err(InlayError::HttpStatus {
                status: reqwest::StatusCode::NOT_FOUND,
                url: reference.to_string(),
            }),
        }
    }
}

/// Panics on every fetch.
pub struct PanickingFetcher;

#[async_trait]
impl inlay_core::ImageFetcher for PanickingFetcher {
    async fn fetch(&self, reference: &ImageReference) -> Result<Vec<u8>> {
        panic!("fetcher exploded on {reference}");
    }
}

/// Never completes. Flags when its in-flight future is dropped.
#[derive(Default)]
pub struct StalledFetcher {
    pub started: Arc<Notify>,
    pub dropped: Arc<AtomicBool>,
}

impl StalledFetcher {
    pub fn was_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl inlay_core::ImageFetcher for StalledFetcher {
    async fn fetch(&self, _reference: &ImageReference) -> Result<Vec<u8>> {
        let _flag = DropFlag(Arc::clone(&self.dropped));
        self.started.notify_one();
        std::future::pending().await
    }
}
