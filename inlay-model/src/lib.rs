//! Value types shared by the inlay resolver, its configuration, and tooling.
//!
//! Nothing in this crate performs I/O. The types describe *what* a document
//! asked for ([`ImageReference`]), *where* it lives on disk ([`CacheKey`]),
//! *how* it should be laid out ([`LayoutPolicy`]), and *when* a document's
//! batch of references is finished ([`BatchComplete`]).

pub mod batch;
pub mod error;
pub mod events;
pub mod image;
pub mod key;
pub mod layout;
pub mod reference;

pub use batch::{BatchComplete, FailureKind, Generation, Resolution};
pub use error::{ModelError, Result as ModelResult};
pub use events::{ImageSource, ResolverEvent};
pub use image::{
    DisplaySize, ImageDimensions, ImageDimensionsError, Placeholder,
    PlaceholderReason,
};
pub use key::CacheKey;
pub use layout::{AspectRatio, LayoutPolicy, Rgba};
pub use reference::ImageReference;
