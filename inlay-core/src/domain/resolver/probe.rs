use inlay_model::ImageDimensions;

use crate::error::{InlayError, Result};

/// Fully decode `bytes` and report their intrinsic dimensions.
///
/// Decoding the whole image (not just the header) is what catches truncated
/// downloads and half-written cache files. CPU bound; async callers should
/// run it on the blocking pool.
pub fn decode_dimensions(bytes: &[u8]) -> Result<ImageDimensions> {
    let image = image::load_from_memory(bytes)
        .map_err(|err| InlayError::Decode(err.to_string()))?;
    ImageDimensions::try_from((image.width(), image.height())).map_err(|err| {
        InlayError::Decode(format!("degenerate image dimensions: {err:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, image::ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    #[test]
    fn reports_intrinsic_dimensions() {
        let dims = decode_dimensions(&png(40, 30)).expect("decode");
        assert_eq!(dims.as_u32_tuple(), (40, 30));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            decode_dimensions(b"<html>not an image</html>"),
            Err(InlayError::Decode(_))
        ));
    }

    #[test]
    fn truncated_png_is_a_decode_error() {
        let bytes = png(64, 64);
        assert!(matches!(
            decode_dimensions(&bytes[..bytes.len() / 2]),
            Err(InlayError::Decode(_))
        ));
    }
}
