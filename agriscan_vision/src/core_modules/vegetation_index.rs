// THEORY:
// The vegetation index layer reduces a whole image to one scalar. Each pixel
// contributes its own VARI value (see `Pixel::vari`) and the image score is the
// arithmetic mean of those values. Nothing is clipped per pixel; a clamp, when
// wanted, is applied to the final mean only, so a handful of extreme pixels is
// averaged in rather than silently flattened.
//
// The sum runs in row-major order in f64, so the same image always produces the
// same bits regardless of how often it is scored.

use crate::core_modules::pixel_image::pixel_image::PixelImage;

/// Lower bound of the nominal VARI range.
pub const INDEX_MIN: f64 = -1.0;
/// Upper bound of the nominal VARI range.
pub const INDEX_MAX: f64 = 1.0;
/// Replacement for an exact-zero denominator, in normalized channel units.
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// Result of reducing an image to a single vegetation index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexReduction {
    /// Unclipped mean of the per-pixel values.
    pub raw_mean: f64,
    /// The value used for classification: `raw_mean`, clamped when requested.
    pub index: f64,
    /// Number of pixels whose denominator was exactly zero.
    pub epsilon_pixels: usize,
}

impl IndexReduction {
    pub fn was_clipped(&self) -> bool {
        self.index != self.raw_mean
    }
}

/// Mean VARI over every pixel of `image`.
pub fn reduce(image: &PixelImage, epsilon: f64, clip: bool) -> IndexReduction {
    let mut sum = 0.0f64;
    let mut epsilon_pixels = 0usize;
    for px in image.pixels() {
        if px.vari_denominator() == 0 {
            epsilon_pixels += 1;
        }
        sum += px.vari(epsilon);
    }
    // PixelImage guarantees at least one pixel.
    let raw_mean = sum / image.pixel_count() as f64;
    let index = if clip { raw_mean.clamp(INDEX_MIN, INDEX_MAX) } else { raw_mean };
    IndexReduction {
        raw_mean,
        index,
        epsilon_pixels,
    }
}

/// Per-pixel VARI values in row-major order, unclipped.
pub fn index_map(image: &PixelImage, epsilon: f64) -> Vec<f64> {
    image.pixels().map(|px| px.vari(epsilon)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;

    fn solid(r: u8, g: u8, b: u8) -> PixelImage {
        PixelImage::filled(4, 4, Pixel::new(r, g, b)).unwrap()
    }

    #[test]
    fn equal_red_green_reduces_to_zero() {
        for b in [0u8, 64, 128, 190] {
            let r = reduce(&solid(120, 120, b), DEFAULT_EPSILON, false);
            assert_eq!(r.raw_mean, 0.0);
        }
    }

    #[test]
    fn pure_green_reduces_to_one() {
        let r = reduce(&solid(0, 255, 0), DEFAULT_EPSILON, true);
        assert_eq!(r.index, 1.0);
        assert_eq!(r.epsilon_pixels, 0);
    }

    #[test]
    fn pure_red_reduces_to_minus_one() {
        let r = reduce(&solid(255, 0, 0), DEFAULT_EPSILON, true);
        assert_eq!(r.index, -1.0);
    }

    #[test]
    fn zero_denominator_everywhere_stays_finite() {
        // G + R - B = 0 for every pixel, with G != R so the epsilon branch matters.
        let img = solid(20, 60, 80);
        let r = reduce(&img, DEFAULT_EPSILON, false);
        assert!(r.raw_mean.is_finite());
        assert_eq!(r.epsilon_pixels, img.pixel_count());
    }

    #[test]
    fn clipping_only_touches_the_final_scalar() {
        let img = solid(20, 60, 80);
        let unclipped = reduce(&img, DEFAULT_EPSILON, false);
        let clipped = reduce(&img, DEFAULT_EPSILON, true);
        assert!(unclipped.raw_mean > INDEX_MAX);
        assert_eq!(clipped.raw_mean, unclipped.raw_mean);
        assert_eq!(clipped.index, INDEX_MAX);
        assert!(clipped.was_clipped());
        assert!(!unclipped.was_clipped());
    }

    #[test]
    fn mean_is_not_distorted_by_per_pixel_clamping() {
        // One extreme pixel and three neutral ones: the extreme value is averaged in.
        let mut data = vec![20, 60, 80];
        data.extend_from_slice(&[100, 100, 0, 100, 100, 0, 100, 100, 0]);
        let img = PixelImage::new(2, 2, 3, data).unwrap();
        let r = reduce(&img, DEFAULT_EPSILON, false);
        let extreme = Pixel::new(20, 60, 80).vari(DEFAULT_EPSILON);
        assert!((r.raw_mean - extreme / 4.0).abs() < 1e-9);
    }

    #[test]
    fn raising_green_does_not_lower_the_index() {
        // Holds whenever 2R >= B and the denominator stays positive.
        let mut previous = f64::NEG_INFINITY;
        for g in (40u8..=240).step_by(20) {
            let r = reduce(&solid(60, g, 90), DEFAULT_EPSILON, false);
            assert!(r.raw_mean >= previous, "g = {g}");
            previous = r.raw_mean;
        }
    }

    #[test]
    fn reduction_is_bitwise_repeatable() {
        let data: Vec<u8> = (0..300u32).map(|i| (i * 37 % 256) as u8).collect();
        let img = PixelImage::new(10, 10, 3, data).unwrap();
        let first = reduce(&img, DEFAULT_EPSILON, false);
        for _ in 0..5 {
            assert_eq!(reduce(&img, DEFAULT_EPSILON, false).raw_mean.to_bits(), first.raw_mean.to_bits());
        }
    }

    #[test]
    fn index_map_matches_pixel_values() {
        let img = PixelImage::new(2, 1, 3, vec![0, 255, 0, 255, 0, 0]).unwrap();
        assert_eq!(index_map(&img, DEFAULT_EPSILON), vec![1.0, -1.0]);
    }
}
