// THEORY:
// Pest detection is a contract, not a model. The `PestDetector` trait is the seam
// a real detector would plug into; the only implementation shipped here is
// `MockPestDetector`, which draws a handful of plausible detections from the
// caller's RNG. The alert level and its recommendation depend only on the
// detection count, so they stay consistent whatever produced the boxes.

use crate::core_modules::pixel_image::pixel_image::PixelImage;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const PEST_CLASSES: [&str; 6] = ["Aphid", "Caterpillar", "Whitefly", "Thrips", "Spider Mite", "Leaf Miner"];
pub const MAX_MOCK_DETECTIONS: usize = 5;
/// More detections than this raises the alert to High Alert.
pub const MODERATE_ALERT_MAX: usize = 2;
const MIN_CONFIDENCE: f64 = 0.75;
const MAX_CONFIDENCE: f64 = 0.98;
const MIN_BOX_SIDE: u32 = 40;
const MAX_BOX_SIDE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertLevel {
    #[serde(rename = "Safe")]
    Safe,
    #[serde(rename = "Moderate")]
    Moderate,
    #[serde(rename = "High Alert")]
    HighAlert,
}

impl AlertLevel {
    pub fn from_count(total: usize) -> Self {
        match total {
            0 => AlertLevel::Safe,
            n if n <= MODERATE_ALERT_MAX => AlertLevel::Moderate,
            _ => AlertLevel::HighAlert,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            AlertLevel::Safe => "No immediate action required. Continue routine monitoring.",
            AlertLevel::Moderate => "Apply targeted organic pesticide in affected zones within 48 hours.",
            AlertLevel::HighAlert => "Urgent: Apply broad-spectrum treatment immediately. Consider drone spraying.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PestDetection {
    pub label: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PestReport {
    pub status: String,
    pub alert_level: AlertLevel,
    pub pests_detected: Vec<PestDetection>,
    pub total_pests: usize,
    pub recommendation: String,
}

impl PestReport {
    /// Builds a completed report, deriving the alert level from the detections.
    pub fn from_detections(pests_detected: Vec<PestDetection>) -> Self {
        let total_pests = pests_detected.len();
        let alert_level = AlertLevel::from_count(total_pests);
        Self {
            status: "completed".to_string(),
            alert_level,
            pests_detected,
            total_pests,
            recommendation: alert_level.recommendation().to_string(),
        }
    }
}

/// Anything that can find pests in an image.
pub trait PestDetector: Send + Sync {
    fn detect(&self, image: &PixelImage, rng: &mut dyn rand::RngCore) -> PestReport;
}

/// Random detections standing in for a trained detector.
#[derive(Debug, Clone, Default)]
pub struct MockPestDetector;

impl PestDetector for MockPestDetector {
    fn detect(&self, image: &PixelImage, rng: &mut dyn rand::RngCore) -> PestReport {
        let count = rng.random_range(0..=MAX_MOCK_DETECTIONS);
        let detections = (0..count).map(|_| mock_detection(image, &mut *rng)).collect();
        PestReport::from_detections(detections)
    }
}

fn mock_detection(image: &PixelImage, rng: &mut dyn rand::RngCore) -> PestDetection {
    let label = PEST_CLASSES[rng.random_range(0..PEST_CLASSES.len())].to_string();
    let confidence = (rng.random_range(MIN_CONFIDENCE..=MAX_CONFIDENCE) * 100.0).round() / 100.0;

    // Boxes never extend past the image, even for images smaller than MIN_BOX_SIDE.
    let width = rng.random_range(MIN_BOX_SIDE..=MAX_BOX_SIDE).min(image.width());
    let height = rng.random_range(MIN_BOX_SIDE..=MAX_BOX_SIDE).min(image.height());
    let x = rng.random_range(0..=image.width() - width);
    let y = rng.random_range(0..=image.height() - height);

    PestDetection {
        label,
        confidence,
        bbox: BoundingBox { x, y, width, height },
    }
}
