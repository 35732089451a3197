// THEORY:
// This file is the main entry point for the `agriscan_vision` library crate.
// It exposes the analysis engine to its consumers (the `field_tester` runner and
// the `agriscan_server` service) and keeps the stage internals in
// `core_modules`.
//
// The public surface:
// - `VegetationHealthScorer` and its `ScorerConfig`, the numerical core that
//   turns an RGB image into a `HealthAssessment`.
// - `AnalysisPipeline`, which chains decoding, pest detection, scoring, yield
//   prediction and the field-zone grid into one `AnalysisReport`.
// - `AnalysisQueue`, the background worker pool that runs pipelines off the
//   caller's task and tracks job status.

pub mod analysis_queue;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use analysis_queue::{AnalysisQueue, ImageUpload, JobStatus, QueueConfig};
pub use core_modules::fifo_cache::FifoCache;
pub use core_modules::health_scorer::{HealthAssessment, ScorerConfig, VegetationHealthScorer};
pub use core_modules::pixel::pixel::{ChannelOrder, Pixel};
pub use core_modules::pixel_image::pixel_image::PixelImage;
pub use core_modules::utils::image_helper::image_helper::decode;
pub use error::{ConfigError, DecodeError, InvalidImageError, QueueError};
pub use pipeline::{AnalysisPipeline, AnalysisReport, PipelineConfig};
