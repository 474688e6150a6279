//! Configuration for hosts embedding the inlay resolver.
//!
//! [`InlayConfig::load_from_env`] resolves a config file or inline JSON from
//! the environment, falls back to well-known file names, and finally to the
//! defaults. Individual environment variables override the result.

pub mod error;
pub mod loader;
pub mod models;

pub use error::ConfigLoadError;
pub use models::{ConfigSource, InlayConfig};
