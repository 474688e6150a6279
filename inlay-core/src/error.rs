use inlay_model::{CacheKey, FailureKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InlayError {
    /// The cache directory could not be read or written. Distinct from
    /// [`InlayError::NotFound`] so callers can tell "not cached" from
    /// "cache broken".
    #[error("cache I/O error for {key}: {source}")]
    CacheIo {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cache entry not found: {0}")]
    NotFound(CacheKey),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("operation cancelled: {0}")]
    Cancelled(String),

    /// The caller broke the batch protocol, e.g. resolved more references
    /// than it announced. This is a bug in the caller, not a runtime
    /// condition.
    #[error("batch protocol violation: {0}")]
    BatchProtocol(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl InlayError {
    pub(crate) fn cache_io(key: impl ToString, source: std::io::Error) -> Self {
        InlayError::CacheIo {
            key: key.to_string(),
            source,
        }
    }

    /// Placeholder classification for an error on one image's resolution
    /// path. Cache I/O counts as a network-side failure because it only
    /// surfaces here after a fetch was already attempted.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            InlayError::Decode(_) => FailureKind::Decode,
            InlayError::Cancelled(_) => FailureKind::Cancelled,
            _ => FailureKind::Network,
        }
    }

    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, InlayError::BatchProtocol(_))
    }
}

pub type Result<T> = std::result::Result<T, InlayError>;
