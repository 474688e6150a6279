use std::{fmt, sync::Arc};

use inlay_model::{
    BatchComplete, CacheKey, DisplaySize, Generation, ImageDimensions,
    ImageReference, ImageSource, Placeholder,
};

/// A decoded image ready to be drawn.
#[derive(Clone)]
pub struct ResolvedImage {
    pub reference: ImageReference,
    pub key: CacheKey,
    /// Raw bytes exactly as cached; the renderer decodes them for drawing.
    pub bytes: Arc<[u8]>,
    pub intrinsic: ImageDimensions,
    pub display: DisplaySize,
    pub source: ImageSource,
}

impl fmt::Debug for ResolvedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedImage")
            .field("reference", &self.reference)
            .field("key", &self.key)
            .field("byte_len", &self.bytes.len())
            .field("intrinsic", &self.intrinsic)
            .field("display", &self.display)
            .field("source", &self.source)
            .finish()
    }
}

/// What the renderer gets back for one reference, always synchronously.
#[derive(Debug, Clone)]
pub enum ImageHandle {
    Ready(Arc<ResolvedImage>),
    Placeholder(Placeholder),
}

impl ImageHandle {
    pub fn is_ready(&self) -> bool {
        matches!(self, ImageHandle::Ready(_))
    }

    pub fn as_ready(&self) -> Option<&ResolvedImage> {
        match self {
            ImageHandle::Ready(image) => Some(image),
            ImageHandle::Placeholder(_) => None,
        }
    }

    pub fn as_placeholder(&self) -> Option<&Placeholder> {
        match self {
            ImageHandle::Ready(_) => None,
            ImageHandle::Placeholder(placeholder) => Some(placeholder),
        }
    }

    /// Box the renderer should reserve for this handle.
    pub fn display_size(&self) -> DisplaySize {
        match self {
            ImageHandle::Ready(image) => image.display,
            ImageHandle::Placeholder(placeholder) => placeholder.size,
        }
    }
}

/// Result of resolving a whole document in one call.
#[derive(Debug, Clone)]
pub struct RenderPass {
    pub generation: Generation,
    /// One handle per input reference, in input order.
    pub handles: Vec<ImageHandle>,
    /// Set when every reference resolved without waiting on the network.
    pub completed: Option<BatchComplete>,
}

impl RenderPass {
    pub fn ready_count(&self) -> usize {
        self.handles.iter().filter(|handle| handle.is_ready()).count()
    }

    pub fn placeholder_count(&self) -> usize {
        self.handles.len() - self.ready_count()
    }
}
