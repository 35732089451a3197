// THEORY:
// Errors are split by the layer that raises them. The scorer itself can only
// reject its input (`InvalidImageError`); everything arithmetic is total. The
// decoder wraps codec failures and MIME rejections, and the queue reports
// transport failures between the caller and its workers. A scorer policy that
// could break those guarantees is refused up front with `ConfigError`. None of
// these are retried: the same bytes will fail the same way.

use thiserror::Error;

/// The input could not be used as a three-channel image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidImageError {
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("image has {0} channel(s); exactly 3 colour channels are required")]
    UnsupportedChannels(u8),
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("content type '{0}' is not an image type")]
    UnsupportedMediaType(String),
    #[error("could not decode image: {0}")]
    Malformed(#[from] image::ImageError),
    #[error(transparent)]
    Invalid(#[from] InvalidImageError),
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("analysis queue is shut down")]
    Closed,
    #[error("worker dropped the job before replying")]
    WorkerGone,
    #[error("analysis failed: {0}")]
    Failed(String),
}

/// A scorer policy that would let the arithmetic or the zone rules misbehave.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be finite (got {value})")]
    NotFinite { field: &'static str, value: f64 },
    #[error("{field} must be finite and greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must lie in [{min}, {max}] (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("critical_threshold ({critical}) must not exceed moderate_threshold ({moderate})")]
    ThresholdOrder { critical: f64, moderate: f64 },
    #[error("zone list is empty")]
    NoZones,
    #[error("max_affected_zones must be at least 1")]
    NoAffectedZones,
}
