// THEORY:
// The `pipeline` module is the top-level API of the analysis engine. It takes one
// uploaded image through every stage and assembles the combined report:
//
//   decode -> pest detection -> vegetation health -> yield -> field zones
//
// Only the decode step can reject a request. A stage that fails after decoding
// is reported in-band (`NutrientOutcome::Error`) so the caller still gets the
// other stages' results. All randomness for one report comes from a single RNG
// seeded by the caller, which makes a report reproducible from its seed.

use crate::core_modules::field_zones::{self, FieldZone};
use crate::core_modules::health_scorer::{HealthAssessment, ScorerConfig, VegetationHealthScorer};
use crate::core_modules::pest_detection::{MockPestDetector, PestDetector, PestReport};
use crate::core_modules::pixel_image::pixel_image::PixelImage;
use crate::core_modules::utils::image_helper::image_helper;
use crate::core_modules::yield_prediction::{YieldPrediction, YieldPredictor};
use crate::error::{ConfigError, DecodeError};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export key data structures for the public API.
pub use crate::core_modules::health_scorer::{Deficiencies, HealthTier, Nutrient};
pub use crate::core_modules::pest_detection::AlertLevel;

pub const FOLLOW_UP_RECOMMENDATION: &str = "Monitor field for next 7 days";

/// Configuration for the AnalysisPipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub scorer: ScorerConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scorer.validate()
    }
}

/// Outcome of the nutrient stage as it appears in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NutrientOutcome {
    Completed(HealthAssessment),
    Error { message: String },
}

impl NutrientOutcome {
    pub fn assessment(&self) -> Option<&HealthAssessment> {
        match self {
            NutrientOutcome::Completed(a) => Some(a),
            NutrientOutcome::Error { .. } => None,
        }
    }
}

/// The combined result of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub image_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub pest_detection: PestReport,
    pub nutrient_analysis: NutrientOutcome,
    pub yield_prediction: YieldPrediction,
    pub field_zones: Vec<FieldZone>,
    pub recommendations: Vec<String>,
}

/// The main, top-level struct for the analysis engine.
pub struct AnalysisPipeline {
    scorer: VegetationHealthScorer,
    pest_detector: Box<dyn PestDetector>,
    yield_predictor: YieldPredictor,
}

impl AnalysisPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        Self::with_pest_detector(config, Box::new(MockPestDetector))
    }

    pub fn with_pest_detector(
        config: PipelineConfig,
        pest_detector: Box<dyn PestDetector>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            scorer: VegetationHealthScorer::new(config.scorer)?,
            pest_detector,
            yield_predictor: YieldPredictor,
        })
    }

    pub fn scorer(&self) -> &VegetationHealthScorer {
        &self.scorer
    }

    /// Decodes `bytes` and runs every stage. Fails only if the bytes are not a usable image.
    pub fn analyze_bytes(
        &self,
        image_id: Uuid,
        bytes: &[u8],
        content_type: &str,
        seed: u64,
    ) -> Result<AnalysisReport, DecodeError> {
        let image = image_helper::decode(bytes, content_type)?;
        Ok(self.analyze_image(image_id, &image, seed))
    }

    /// Pest stage only.
    pub fn detect_pests(&self, image: &PixelImage, seed: u64) -> PestReport {
        let mut rng = StdRng::seed_from_u64(seed);
        self.pest_detector.detect(image, &mut rng)
    }

    /// Nutrient stage only.
    pub fn assess_nutrients(&self, image_id: Uuid, image: &PixelImage, seed: u64) -> NutrientOutcome {
        let mut rng = StdRng::seed_from_u64(seed);
        self.nutrient_outcome(image_id, image, &mut rng)
    }

    /// Yield stage, fed by fresh pest and nutrient stages on the same seed.
    pub fn predict_yield(&self, image_id: Uuid, image: &PixelImage, seed: u64) -> YieldPrediction {
        let mut rng = StdRng::seed_from_u64(seed);
        let pests = self.pest_detector.detect(image, &mut rng);
        let nutrients = self.nutrient_outcome(image_id, image, &mut rng);
        let tier = nutrients.assessment().map(|a| a.overall_health);
        self.yield_predictor.predict(pests.alert_level, tier, &mut rng)
    }

    fn nutrient_outcome(&self, image_id: Uuid, image: &PixelImage, rng: &mut StdRng) -> NutrientOutcome {
        match self.scorer.score(image, rng) {
            Ok(assessment) => NutrientOutcome::Completed(assessment),
            Err(e) => {
                tracing::warn!(%image_id, error = %e, "nutrient stage failed");
                NutrientOutcome::Error { message: e.to_string() }
            }
        }
    }

    pub fn analyze_image(&self, image_id: Uuid, image: &PixelImage, seed: u64) -> AnalysisReport {
        let mut rng = StdRng::seed_from_u64(seed);

        // Stage 1: Pest detection
        let pest_detection = self.pest_detector.detect(image, &mut rng);

        // Stage 2: Vegetation health
        let nutrient_analysis = self.nutrient_outcome(image_id, image, &mut rng);

        // Stage 3: Yield, driven by the two stages above
        let tier = nutrient_analysis.assessment().map(|a| a.overall_health);
        let yield_prediction = self.yield_predictor.predict(pest_detection.alert_level, tier, &mut rng);

        // Stage 4: Zone grid for the map view
        let field_zones = match nutrient_analysis.assessment() {
            Some(a) => field_zones::generate(
                &self.scorer.config().zones,
                &a.affected_zones,
                pest_detection.alert_level,
                &mut rng,
            ),
            None => field_zones::static_grid(),
        };

        let nutrient_recommendation = match &nutrient_analysis {
            NutrientOutcome::Completed(a) => a.recommendation.clone(),
            NutrientOutcome::Error { .. } => String::new(),
        };
        let recommendations = vec![
            pest_detection.recommendation.clone(),
            nutrient_recommendation,
            FOLLOW_UP_RECOMMENDATION.to_string(),
        ];

        tracing::info!(
            %image_id,
            alert = ?pest_detection.alert_level,
            health = ?tier,
            predicted_yield = yield_prediction.predicted_yield,
            "analysis complete"
        );

        AnalysisReport {
            image_id,
            timestamp: Utc::now(),
            pest_detection,
            nutrient_analysis,
            yield_prediction,
            field_zones,
            recommendations,
        }
    }
}

impl Default for AnalysisPipeline {
    fn default() -> Self {
        Self {
            scorer: VegetationHealthScorer::default(),
            pest_detector: Box::new(MockPestDetector),
            yield_predictor: YieldPredictor,
        }
    }
}
