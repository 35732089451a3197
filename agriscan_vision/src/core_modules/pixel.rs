// THEORY (single-pixel heuristics):
// `Pixel` is the smallest unit of the scorer. It is a "dumb" container for one
// RGB sample plus the metrics that can be computed from that sample alone. It
// knows nothing about neighbours or the rest of the image; reductions over many
// pixels live in `vegetation_index`.
//
// Channel order is fixed to R, G, B. Producers that hold BGR data (OpenCV-style
// buffers) must say so through `ChannelOrder::Bgr` when building a pixel; the
// order is never guessed from where the bytes came from.
//
// Channel forms kept here:
// - raw bytes (0..255)
// - normalized (0..1), still gamma-encoded, which is what VARI is defined on
//
// VARI (Visible Atmospherically Resistant Index) = (G - R) / (G + R - B).
// Numerator and denominator are formed from the integer channels so an exact
// zero denominator is detected exactly. Normalization by 255 cancels in the
// ratio, so only the zero-denominator branch ever sees the normalized scale.

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type NormalizedChannel = f64;
    pub type IndexValue = f64;

    pub const CHANNELS: usize = 3;
    const CHANNEL_MAX: f64 = 255.0;

    /// Byte order of an interleaved three-channel buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum ChannelOrder {
        #[default]
        Rgb,
        Bgr,
    }

    /// A single RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// Builds a pixel from three bytes laid out in `order`.
        pub fn from_ordered(bytes: [Byte; CHANNELS], order: ChannelOrder) -> Self {
            match order {
                ChannelOrder::Rgb => Pixel::new(bytes[0], bytes[1], bytes[2]),
                ChannelOrder::Bgr => Pixel::new(bytes[2], bytes[1], bytes[0]),
            }
        }

        pub fn red_normalized(&self) -> NormalizedChannel {
            self.red as NormalizedChannel / CHANNEL_MAX
        }

        pub fn green_normalized(&self) -> NormalizedChannel {
            self.green as NormalizedChannel / CHANNEL_MAX
        }

        pub fn blue_normalized(&self) -> NormalizedChannel {
            self.blue as NormalizedChannel / CHANNEL_MAX
        }

        /// =================================Heuristics==================================

        /// `G - R` on the raw channel scale.
        #[inline]
        pub fn vari_numerator(&self) -> i32 {
            self.green as i32 - self.red as i32
        }

        /// `G + R - B` on the raw channel scale. Zero exactly when the
        /// normalized denominator is zero.
        #[inline]
        pub fn vari_denominator(&self) -> i32 {
            self.green as i32 + self.red as i32 - self.blue as i32
        }

        /// Per-pixel VARI.
        ///
        /// - A zero denominator is replaced by `epsilon` (normalized units), so the
        ///   result is always finite for a finite, non-zero `epsilon`.
        /// - Not clipped. A near-zero denominator can yield values far outside
        ///   [-1, 1]; any clipping belongs to the reduced scalar.
        #[inline]
        pub fn vari(&self, epsilon: f64) -> IndexValue {
            let numerator = self.vari_numerator();
            let denominator = self.vari_denominator();
            if denominator == 0 {
                (numerator as f64 / CHANNEL_MAX) / epsilon
            } else {
                numerator as f64 / denominator as f64
            }
        }
    }

    impl From<[Byte; CHANNELS]> for Pixel {
        fn from(bytes: [Byte; CHANNELS]) -> Self {
            Pixel::from_ordered(bytes, ChannelOrder::Rgb)
        }
    }

    impl From<image::Rgb<u8>> for Pixel {
        fn from(rgb: image::Rgb<u8>) -> Self {
            Pixel::from(rgb.0)
        }
    }
}
