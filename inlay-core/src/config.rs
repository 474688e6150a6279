//! Resolver configuration.
//!
//! Loading from files and the environment lives in `inlay-config`; this
//! module only defines the shape and the defaults so the core can be embedded
//! without pulling in any loader.

use std::{path::PathBuf, time::Duration};

use inlay_model::LayoutPolicy;
use serde::{Deserialize, Serialize};

use crate::error::{InlayError, Result};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Directory holding one raw file per cached image. Supplied by the host
    /// application; created on first use.
    pub cache_dir: PathBuf,
    /// Placeholder and scaling policy for the render area.
    pub layout: LayoutPolicy,
    pub fetch: FetchConfig,
    /// Capacity of the broadcast channel behind `Resolver::subscribe`. Slow
    /// subscribers lag rather than block resolution.
    pub event_capacity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache/images"),
            layout: LayoutPolicy::default(),
            fetch: FetchConfig::default(),
            event_capacity: 256,
        }
    }
}

impl ResolverConfig {
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn with_render_width(mut self, render_width: u32) -> Self {
        self.layout.render_width = render_width;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(InlayError::Config("cache_dir must not be empty".into()));
        }
        self.layout
            .validate()
            .map_err(|err| InlayError::Config(err.to_string()))?;
        self.fetch.validate()?;
        if self.event_capacity == 0 {
            return Err(InlayError::Config(
                "event_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Whole-request timeout handed to the HTTP client.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Upper bound on fetches in flight for one resolver.
    pub max_concurrent: usize,
    /// Base URL that relative references (`/img/a.png`, `//cdn/a.png`) are
    /// joined onto. Without one, relative references fail as network errors.
    pub base_url: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("inlay/", env!("CARGO_PKG_VERSION")).to_string(),
            max_concurrent: 8,
            base_url: None,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(InlayError::Config(
                "fetch.timeout_secs must be greater than zero".into(),
            ));
        }
        if self.max_concurrent == 0 {
            return Err(InlayError::Config(
                "fetch.max_concurrent must be greater than zero".into(),
            ));
        }
        if let Some(base) = self.base_url.as_deref() {
            url::Url::parse(base).map_err(|err| {
                InlayError::Config(format!("fetch.base_url {base:?}: {err}"))
            })?;
        }
        Ok(())
    }
}
