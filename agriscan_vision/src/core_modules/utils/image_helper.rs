// Image codec helpers: the decoder in front of the scorer and a PNG writer for
// per-pixel index heatmaps.

pub mod image_helper {
    use crate::core_modules::pixel_image::pixel_image::PixelImage;
    use crate::core_modules::vegetation_index::{INDEX_MAX, INDEX_MIN};
    use crate::error::{DecodeError, InvalidImageError};
    use image::ImageEncoder;
    use std::path::Path;

    /// True for any `image/*` MIME type, ignoring case and surrounding whitespace.
    pub fn is_image_content_type(content_type: &str) -> bool {
        content_type.trim().to_ascii_lowercase().starts_with("image/")
    }

    /// Decodes uploaded bytes into an RGB `PixelImage`.
    ///
    /// - `content_type` is the declared MIME type; anything outside `image/*` is
    ///   rejected before the bytes are looked at.
    /// - Grayscale and gray+alpha images are rejected. RGBA is accepted with the
    ///   alpha channel dropped.
    pub fn decode(bytes: &[u8], content_type: &str) -> Result<PixelImage, DecodeError> {
        if !is_image_content_type(content_type) {
            return Err(DecodeError::UnsupportedMediaType(content_type.to_string()));
        }

        let decoded = image::load_from_memory(bytes)?;
        let color = decoded.color();
        if !color.has_color() {
            tracing::warn!(?color, "rejecting image without colour channels");
            return Err(InvalidImageError::UnsupportedChannels(color.channel_count()).into());
        }

        Ok(PixelImage::try_from(decoded.to_rgb8())?)
    }

    /// MIME type for a file path, from its extension.
    pub fn mime_for_path(path: &Path) -> Option<&'static str> {
        image::ImageFormat::from_path(path).ok().map(|f| f.to_mime_type())
    }

    /// Colour for one index value: red at -1, yellow at 0, green at +1.
    pub fn heat_color(value: f64) -> [u8; 3] {
        let v = if value.is_finite() { value.clamp(INDEX_MIN, INDEX_MAX) } else { 0.0 };
        if v <= 0.0 {
            // Red to yellow
            let ratio = v + 1.0;
            [255, (255.0 * ratio).round() as u8, 0]
        } else {
            // Yellow to green
            [(255.0 * (1.0 - v)).round() as u8, 255, 0]
        }
    }

    /// Renders per-pixel index values as an RGB PNG.
    pub fn save_index_heatmap(
        path: &Path,
        width: u32,
        height: u32,
        values: &[f64],
    ) -> Result<(), image::error::ImageError> {
        let mut buffer = Vec::with_capacity(values.len() * 3);
        for v in values {
            buffer.extend_from_slice(&heat_color(*v));
        }

        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);
        encoder.write_image(&buffer, width, height, image::ExtendedColorType::Rgb8)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::image_helper::*;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::error::{DecodeError, InvalidImageError};
    use std::io::Cursor;

    fn encode_png(img: image::DynamicImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).expect("Error encoding PNG.");
        bytes.into_inner()
    }

    #[test]
    fn decodes_rgb_png() {
        let png = encode_png(image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            4,
            3,
            image::Rgb([10, 200, 30]),
        )));
        let img = decode(&png, "image/png").expect("Error decoding.");
        assert_eq!((img.width(), img.height()), (4, 3));
        assert!(img.pixels().all(|p| p == Pixel::new(10, 200, 30)));
    }

    #[test]
    fn drops_alpha_from_rgba() {
        let png = encode_png(image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            2,
            2,
            image::Rgba([1, 2, 3, 4]),
        )));
        let img = decode(&png, "image/png").expect("Error decoding.");
        assert_eq!(img.pixels().next(), Some(Pixel::new(1, 2, 3)));
    }

    #[test]
    fn rejects_grayscale() {
        let png = encode_png(image::DynamicImage::ImageLuma8(image::GrayImage::from_pixel(
            2,
            2,
            image::Luma([7]),
        )));
        match decode(&png, "image/png") {
            Err(DecodeError::Invalid(InvalidImageError::UnsupportedChannels(1))) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_image_content_type() {
        assert!(matches!(
            decode(b"hello", "text/plain"),
            Err(DecodeError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn image_content_types_ignore_case() {
        assert!(is_image_content_type("image/png"));
        assert!(is_image_content_type(" Image/PNG "));
        assert!(!is_image_content_type("text/plain"));
        assert!(!is_image_content_type("application/image"));
    }

    #[test]
    fn rejects_garbage_bytes() {
        assert!(matches!(decode(b"definitely not a png", "image/png"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn heat_colors_span_red_to_green() {
        assert_eq!(heat_color(-1.0), [255, 0, 0]);
        assert_eq!(heat_color(0.0), [255, 255, 0]);
        assert_eq!(heat_color(1.0), [0, 255, 0]);
        assert_eq!(heat_color(40.0), [0, 255, 0]);
        assert_eq!(heat_color(f64::NAN), [255, 255, 0]);
    }

    #[test]
    fn save_heatmap_file() {
        let path = std::env::temp_dir().join(format!("agriscan_heatmap_{}.png", std::process::id()));
        let values: Vec<f64> = (0..100).map(|i| i as f64 / 50.0 - 1.0).collect();

        save_index_heatmap(&path, 10, 10, &values).expect("Error Saving File.");

        let reread = image::open(&path).expect("Error reading back.").to_rgb8();
        assert_eq!(reread.dimensions(), (10, 10));
        assert_eq!(reread.get_pixel(0, 0).0, [255, 0, 0]);
        let _ = std::fs::remove_file(path);
    }
}
