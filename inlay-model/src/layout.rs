//! Presentation policy supplied by the rendering collaborator.
//!
//! The resolver never invents sizes or colors on its own; it asks the
//! [`LayoutPolicy`] so that hosts can theme placeholders and pick a column
//! width without touching resolution logic.

use crate::{
    DisplaySize, ImageDimensions, ModelError, ModelResult, Placeholder,
    PlaceholderReason,
};

/// Width-to-height ratio, e.g. `3:1` for a placeholder a third as tall as it
/// is wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Height for a box `width` pixels wide. Truncating integer math, so a
    /// `3:1` ratio at width 100 yields 33.
    pub fn height_for(self, width: u32) -> u32 {
        if self.width == 0 {
            return 0;
        }
        let height =
            u64::from(width) * u64::from(self.height) / u64::from(self.width);
        u32::try_from(height).unwrap_or(u32::MAX)
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::new(3, 1)
    }
}

/// RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const WHITE: Rgba = Rgba([0xff, 0xff, 0xff, 0xff]);
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LayoutPolicy {
    /// Width of the render area in layout pixels.
    pub render_width: u32,
    /// Shape of the placeholder box drawn while an image is unavailable.
    pub placeholder_aspect: AspectRatio,
    pub placeholder_color: Rgba,
    /// Stretch images narrower than the render area to its full width.
    /// Images wider than the render area are always scaled down.
    pub upscale: bool,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            render_width: 720,
            placeholder_aspect: AspectRatio::default(),
            placeholder_color: Rgba::WHITE,
            upscale: true,
        }
    }
}

impl LayoutPolicy {
    pub fn with_render_width(mut self, render_width: u32) -> Self {
        self.render_width = render_width;
        self
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.render_width == 0 {
            return Err(ModelError::InvalidLayout(
                "render_width must be greater than zero".into(),
            ));
        }
        if self.placeholder_aspect.width == 0
            || self.placeholder_aspect.height == 0
        {
            return Err(ModelError::InvalidLayout(format!(
                "placeholder_aspect {}:{} must not contain zero",
                self.placeholder_aspect.width, self.placeholder_aspect.height
            )));
        }
        Ok(())
    }

    /// Placeholder box; costs nothing and never touches disk or network.
    pub fn placeholder(&self, reason: PlaceholderReason) -> Placeholder {
        Placeholder {
            size: DisplaySize::new(
                self.render_width,
                self.placeholder_aspect.height_for(self.render_width),
            ),
            color: self.placeholder_color,
            reason,
        }
    }

    /// Where a decoded image lands in the layout. Width is capped at the
    /// render area; height keeps the intrinsic aspect ratio.
    pub fn display_size(&self, intrinsic: ImageDimensions) -> DisplaySize {
        let width = if self.upscale {
            self.render_width
        } else {
            intrinsic.width_u32().min(self.render_width)
        };
        DisplaySize::new(width, intrinsic.height_at_width(width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(w: u32, h: u32) -> ImageDimensions {
        ImageDimensions::try_from((w, h)).unwrap()
    }

    #[test]
    fn placeholder_is_a_third_of_the_width_by_default() {
        let policy = LayoutPolicy::default().with_render_width(600);
        let placeholder = policy.placeholder(PlaceholderReason::Loading);
        assert_eq!(placeholder.size, DisplaySize::new(600, 200));
        assert_eq!(placeholder.color, Rgba::WHITE);
        assert!(placeholder.is_loading());
    }

    #[test]
    fn images_are_scaled_to_render_width() {
        let policy = LayoutPolicy::default().with_render_width(600);
        assert_eq!(
            policy.display_size(dims(1200, 800)),
            DisplaySize::new(600, 400)
        );
        assert_eq!(
            policy.display_size(dims(300, 150)),
            DisplaySize::new(600, 300)
        );
    }

    #[test]
    fn without_upscale_small_images_keep_their_width() {
        let policy = LayoutPolicy {
            upscale: false,
            ..LayoutPolicy::default().with_render_width(600)
        };
        assert_eq!(
            policy.display_size(dims(300, 150)),
            DisplaySize::new(300, 150)
        );
        assert_eq!(
            policy.display_size(dims(1200, 800)),
            DisplaySize::new(600, 400)
        );
    }

    #[test]
    fn validate_rejects_degenerate_policies() {
        assert!(LayoutPolicy::default().validate().is_ok());
        assert!(LayoutPolicy::default().with_render_width(0).validate().is_err());
        let flat = LayoutPolicy {
            placeholder_aspect: AspectRatio::new(3, 0),
            ..LayoutPolicy::default()
        };
        assert!(flat.validate().is_err());
    }
}
