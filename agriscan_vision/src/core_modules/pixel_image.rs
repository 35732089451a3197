// THEORY:
// `PixelImage` is the validated input of the scorer: a decoded, non-empty,
// three-channel, 8-bit image stored as interleaved RGB. Validation happens once,
// at construction, so everything downstream can assume a well-formed buffer and
// stay total. Grayscale or alpha-only inputs are rejected, never padded.

pub mod pixel_image {
    use crate::core_modules::pixel::pixel::{Byte, CHANNELS, ChannelOrder, Pixel};
    use crate::error::InvalidImageError;

    /// A decoded RGB image, height x width x 3, row-major.
    #[derive(Debug, Clone, PartialEq)]
    pub struct PixelImage {
        width: u32,
        height: u32,
        /// Interleaved R, G, B bytes.
        data: Vec<Byte>,
    }

    impl PixelImage {
        /// Validates a raw interleaved buffer that is already in RGB order.
        pub fn new(width: u32, height: u32, channels: u8, data: Vec<Byte>) -> Result<Self, InvalidImageError> {
            Self::from_interleaved(width, height, channels, ChannelOrder::Rgb, data)
        }

        /// Validates a raw interleaved buffer laid out in `order`, converting it to RGB.
        pub fn from_interleaved(
            width: u32,
            height: u32,
            channels: u8,
            order: ChannelOrder,
            mut data: Vec<Byte>,
        ) -> Result<Self, InvalidImageError> {
            if width == 0 || height == 0 {
                return Err(InvalidImageError::EmptyImage { width, height });
            }
            if channels as usize != CHANNELS {
                return Err(InvalidImageError::UnsupportedChannels(channels));
            }
            let expected = width as usize * height as usize * CHANNELS;
            if data.len() != expected {
                return Err(InvalidImageError::BufferSizeMismatch {
                    expected,
                    actual: data.len(),
                });
            }
            if order == ChannelOrder::Bgr {
                for px in data.chunks_exact_mut(CHANNELS) {
                    px.swap(0, 2);
                }
            }
            Ok(Self { width, height, data })
        }

        /// Builds a solid image, mostly useful for fixtures.
        pub fn filled(width: u32, height: u32, pixel: Pixel) -> Result<Self, InvalidImageError> {
            let count = width as usize * height as usize;
            let mut data = Vec::with_capacity(count * CHANNELS);
            for _ in 0..count {
                data.extend_from_slice(&[pixel.red, pixel.green, pixel.blue]);
            }
            Self::new(width, height, CHANNELS as u8, data)
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        pub fn pixel_count(&self) -> usize {
            self.width as usize * self.height as usize
        }

        /// Pixels in row-major order.
        pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
            self.data
                .chunks_exact(CHANNELS)
                .map(|px| Pixel::new(px[0], px[1], px[2]))
        }
    }

    impl TryFrom<image::RgbImage> for PixelImage {
        type Error = InvalidImageError;

        fn try_from(img: image::RgbImage) -> Result<Self, Self::Error> {
            let (width, height) = img.dimensions();
            Self::new(width, height, CHANNELS as u8, img.into_raw())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel_image::*;
    use crate::core_modules::pixel::pixel::{ChannelOrder, Pixel};
    use crate::error::InvalidImageError;

    #[test]
    fn rejects_zero_sized_images() {
        let err = PixelImage::new(0, 10, 3, Vec::new()).unwrap_err();
        assert_eq!(err, InvalidImageError::EmptyImage { width: 0, height: 10 });
        let err = PixelImage::new(10, 0, 3, Vec::new()).unwrap_err();
        assert_eq!(err, InvalidImageError::EmptyImage { width: 10, height: 0 });
    }

    #[test]
    fn rejects_single_channel_images() {
        let err = PixelImage::new(2, 2, 1, vec![0; 4]).unwrap_err();
        assert_eq!(err, InvalidImageError::UnsupportedChannels(1));
    }

    #[test]
    fn rejects_alpha_buffers() {
        let err = PixelImage::new(2, 2, 4, vec![0; 16]).unwrap_err();
        assert_eq!(err, InvalidImageError::UnsupportedChannels(4));
    }

    #[test]
    fn rejects_short_buffers() {
        let err = PixelImage::new(2, 2, 3, vec![0; 11]).unwrap_err();
        assert_eq!(err, InvalidImageError::BufferSizeMismatch { expected: 12, actual: 11 });
    }

    #[test]
    fn bgr_input_is_stored_as_rgb() {
        let img = PixelImage::from_interleaved(2, 1, 3, ChannelOrder::Bgr, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let pixels: Vec<Pixel> = img.pixels().collect();
        assert_eq!(pixels, vec![Pixel::new(3, 2, 1), Pixel::new(6, 5, 4)]);
    }

    #[test]
    fn filled_image_has_uniform_pixels() {
        let img = PixelImage::filled(10, 10, Pixel::new(1, 2, 3)).unwrap();
        assert_eq!(img.pixel_count(), 100);
        assert!(img.pixels().all(|p| p == Pixel::new(1, 2, 3)));
    }

    #[test]
    fn converts_from_rgb_image() {
        let rgb = image::RgbImage::from_pixel(3, 2, image::Rgb([9, 8, 7]));
        let img = PixelImage::try_from(rgb).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
        assert_eq!(img.pixels().next(), Some(Pixel::new(9, 8, 7)));
    }
}
