use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, ImageResult, Limits, RgbImage};
use std::io::Cursor;

/// Decodes a raw array of bytes in any supported format into pixel data.
pub fn image(bytes: &[u8]) -> ImageResult<DynamicImage> {
    let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    reader.limits(image_reader_limits());
    reader.decode()
}

/// Decodes `bytes` into an RGB image of exactly `width` x `height` pixels,
/// resizing if the source has other dimensions.
pub fn rgb_image_with_size(bytes: &[u8], width: u32, height: u32) -> ImageResult<RgbImage> {
    let rgb_image = image(bytes)?.into_rgb8();
    if rgb_image.dimensions() == (width, height) {
        Ok(rgb_image)
    } else {
        Ok(image::imageops::resize(&rgb_image, width, height, FilterType::Lanczos3))
    }
}

fn image_reader_limits() -> Limits {
    const MB: u64 = 1024_u64.pow(2);

    let mut limits = Limits::default();
    limits.max_image_width = Some(8192);
    limits.max_image_height = Some(8192);
    limits.max_alloc = Some(512 * MB);
    limits
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::noise_png;

    #[test]
    fn decode_and_resize() {
        let bytes = noise_png(48, 32);
        let original = rgb_image_with_size(&bytes, 48, 32).unwrap();
        assert_eq!(original.dimensions(), (48, 32));

        let resized = rgb_image_with_size(&bytes, 64, 80).unwrap();
        assert_eq!(resized.dimensions(), (64, 80));
    }

    #[test]
    fn reject_non_images() {
        let html = b"<html><body>Service temporarily unavailable</body></html>".repeat(40);
        assert!(image(&html).is_err());
        assert!(image(&[]).is_err());
    }
}
