use crate::{DisplaySize, FailureKind, Rgba};

/// A synchronously available stand-in for an image that is not ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placeholder {
    pub size: DisplaySize,
    pub color: Rgba,
    pub reason: PlaceholderReason,
}

impl Placeholder {
    pub fn is_loading(&self) -> bool {
        matches!(self.reason, PlaceholderReason::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.reason, PlaceholderReason::Failed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlaceholderReason {
    /// A fetch is outstanding; the real image should appear on a later pass.
    Loading,
    /// The reference will not resolve during this pass.
    Failed(FailureKind),
}
