//! Inline image resolution for rich-text rendering.
//!
//! A document's renderer hands every image reference it finds to a
//! [`Resolver`] and gets an [`ImageHandle`] back immediately: the real image
//! when it is already in the [`DiskStore`], a sized placeholder otherwise.
//! Misses are fetched in the background through an [`ImageFetcher`]; when
//! every reference of the pass has resolved, one [`BatchComplete`] tells the
//! renderer it can redraw the document once with a warm cache.
//!
//! [`BatchComplete`]: inlay_model::BatchComplete

pub mod config;
pub mod domain;
pub mod error;
pub mod infra;

pub use config::{FetchConfig, ResolverConfig};
pub use domain::batch::{BatchTracker, Report};
pub use domain::resolver::{
    ImageHandle, RenderPass, ResolvedImage, Resolver, probe::decode_dimensions,
};
pub use error::{InlayError, Result};
pub use infra::cache::{CacheEntry, DiskStore, StoredBlob};
pub use infra::fetch::{HttpFetcher, ImageFetcher, fetch_cancellable};

pub use inlay_model as model;
