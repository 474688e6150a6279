use crate::{BatchComplete, CacheKey, FailureKind, Generation, ImageReference};

/// Where the bytes behind a ready image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageSource {
    Disk,
    Network,
    /// Fetched earlier in this session but never persisted.
    Memory,
}

/// Notifications published by the resolver to any number of subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResolverEvent {
    ImageReady {
        generation: Generation,
        reference: ImageReference,
        key: CacheKey,
        source: ImageSource,
    },
    ImageFailed {
        generation: Generation,
        reference: ImageReference,
        kind: FailureKind,
    },
    BatchComplete(BatchComplete),
}
