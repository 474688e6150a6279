//! On-disk cache infra.
//!
//! One file per image, named by [`inlay_model::CacheKey`], holding the raw
//! bytes exactly as the network delivered them. No index and no metadata
//! header, so external tooling can inspect the directory directly.

pub mod disk_store;

pub use disk_store::*;
