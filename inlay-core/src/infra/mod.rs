//! I/O-facing infrastructure: the on-disk image cache and network fetchers.

pub mod cache;
pub mod fetch;
