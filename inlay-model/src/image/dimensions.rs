use std::num::NonZeroU32;

/// Non-zero pixel dimensions for decoded image bytes.
///
/// This is independent of [`DisplaySize`]: intrinsic dimensions are the
/// authoritative width/height of the bytes, while a display size is what the
/// layout policy decided to draw them at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageDimensions {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
}

/// Why a `(width, height)` pair could not become [`ImageDimensions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageDimensionsError {
    ZeroWidth,
    ZeroHeight,
}

impl ImageDimensions {
    pub const fn new(width: NonZeroU32, height: NonZeroU32) -> Self {
        Self { width, height }
    }

    pub const fn width_u32(self) -> u32 {
        self.width.get()
    }

    pub const fn height_u32(self) -> u32 {
        self.height.get()
    }

    pub const fn as_u32_tuple(self) -> (u32, u32) {
        (self.width.get(), self.height.get())
    }

    /// Height this image takes when drawn `target_width` pixels wide with its
    /// aspect ratio preserved. Truncates, but never below one pixel.
    pub fn height_at_width(self, target_width: u32) -> u32 {
        let scaled = u64::from(target_width) * u64::from(self.height.get())
            / u64::from(self.width.get());
        u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
    }
}

impl TryFrom<(u32, u32)> for ImageDimensions {
    type Error = ImageDimensionsError;

    fn try_from(value: (u32, u32)) -> Result<Self, Self::Error> {
        let (width, height) = value;
        let width =
            NonZeroU32::new(width).ok_or(ImageDimensionsError::ZeroWidth)?;
        let height =
            NonZeroU32::new(height).ok_or(ImageDimensionsError::ZeroHeight)?;
        Ok(Self { width, height })
    }
}

/// Size, in layout pixels, at which the renderer should draw an image or
/// placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

impl DisplaySize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}
