// THEORY:
// The `VegetationHealthScorer` turns one decoded image into a `HealthAssessment`.
// It is the only stage of the pipeline with real numerical content:
//
// 1.  **Reduction**: the image is reduced to a mean VARI value
//     (`vegetation_index::reduce`), optionally clamped to [-1, 1].
// 2.  **Classification**: two fixed thresholds split the scalar into three
//     tiers. A value sitting exactly on a threshold belongs to the healthier
//     tier, so `index == 0.0` is Moderate and `index == 0.2` is Optimal.
// 3.  **Heuristics**: a 0-100 health score, N/P/K deficiency estimates, the
//     affected zones and the recommendation are all derived from that one
//     scalar. RGB carries no band that separates nitrogen from potassium, so
//     the three deficiencies are shaped by fixed weights plus bounded noise.
//     They are estimates for presentation, not measurements.
//
// The scorer holds no mutable state. Randomness comes from the caller's RNG,
// so a fixed seed gives a fixed assessment and concurrent callers never share
// anything.

use crate::core_modules::pixel_image::pixel_image::PixelImage;
use crate::core_modules::vegetation_index::{self, DEFAULT_EPSILON};
use crate::error::{ConfigError, InvalidImageError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Mean index below this is Critical Deficiency.
pub const CRITICAL_THRESHOLD: f64 = 0.0;
/// Mean index below this (and at or above `CRITICAL_THRESHOLD`) is Moderate Deficiency.
pub const MODERATE_THRESHOLD: f64 = 0.2;
/// Index mapped to a health score of 0.
pub const HEALTH_SCORE_FLOOR: f64 = -0.2;
/// Index span mapped onto the 0-100 health score.
pub const HEALTH_SCORE_SPAN: f64 = 0.7;
/// Upper bound of every deficiency estimate, in percent.
pub const DEFICIENCY_CEILING: f64 = 50.0;
pub const NITROGEN_WEIGHT: f64 = 1.0;
pub const PHOSPHORUS_WEIGHT: f64 = 0.7;
pub const POTASSIUM_WEIGHT: f64 = 0.8;
pub const DEFAULT_NOISE_AMPLITUDE: f64 = 2.5;
pub const MAX_AFFECTED_ZONES: usize = 3;
pub const DEFAULT_ZONES: [&str; 9] = ["A1", "A2", "A3", "B1", "B2", "B3", "C1", "C2", "C3"];
pub const MAINTENANCE_MESSAGE: &str = "Maintain current fertilization schedule.";
/// Accepted epsilon range. The floor keeps `pixels / epsilon` far from overflow.
pub const MIN_EPSILON: f64 = 1e-12;
pub const MAX_EPSILON: f64 = 1.0;

/// Tunable policy of the scorer. Every number the scorer uses lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub epsilon: f64,
    /// Clamp the final mean to [-1, 1]. The raw mean is reported either way.
    pub clip_index: bool,
    pub critical_threshold: f64,
    pub moderate_threshold: f64,
    pub health_score_floor: f64,
    pub health_score_span: f64,
    pub nitrogen_weight: f64,
    pub phosphorus_weight: f64,
    pub potassium_weight: f64,
    /// Half-width of the uniform noise added to each deficiency. 0 disables it.
    pub noise_amplitude: f64,
    pub zones: Vec<String>,
    pub max_affected_zones: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            clip_index: true,
            critical_threshold: CRITICAL_THRESHOLD,
            moderate_threshold: MODERATE_THRESHOLD,
            health_score_floor: HEALTH_SCORE_FLOOR,
            health_score_span: HEALTH_SCORE_SPAN,
            nitrogen_weight: NITROGEN_WEIGHT,
            phosphorus_weight: PHOSPHORUS_WEIGHT,
            potassium_weight: POTASSIUM_WEIGHT,
            noise_amplitude: DEFAULT_NOISE_AMPLITUDE,
            zones: DEFAULT_ZONES.iter().map(|z| z.to_string()).collect(),
            max_affected_zones: MAX_AFFECTED_ZONES,
        }
    }
}

impl ScorerConfig {
    /// Checks every policy value the scorer relies on.
    ///
    /// A valid config keeps the index finite, keeps the noise range finite and
    /// guarantees at least one affected zone for a non-Optimal tier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        in_range("epsilon", self.epsilon, MIN_EPSILON, MAX_EPSILON)?;
        finite("critical_threshold", self.critical_threshold)?;
        finite("moderate_threshold", self.moderate_threshold)?;
        if self.critical_threshold > self.moderate_threshold {
            return Err(ConfigError::ThresholdOrder {
                critical: self.critical_threshold,
                moderate: self.moderate_threshold,
            });
        }
        finite("health_score_floor", self.health_score_floor)?;
        if !(self.health_score_span.is_finite() && self.health_score_span > 0.0) {
            return Err(ConfigError::NotPositive {
                field: "health_score_span",
                value: self.health_score_span,
            });
        }
        in_range("nitrogen_weight", self.nitrogen_weight, 0.0, 1.0)?;
        in_range("phosphorus_weight", self.phosphorus_weight, 0.0, 1.0)?;
        in_range("potassium_weight", self.potassium_weight, 0.0, 1.0)?;
        in_range("noise_amplitude", self.noise_amplitude, 0.0, DEFICIENCY_CEILING)?;
        if self.zones.is_empty() {
            return Err(ConfigError::NoZones);
        }
        if self.max_affected_zones == 0 {
            return Err(ConfigError::NoAffectedZones);
        }
        Ok(())
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

// NaN fails the range check as well.
fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, min, max })
    }
}

/// Categorical health of the imaged crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthTier {
    #[serde(rename = "Optimal")]
    Optimal,
    #[serde(rename = "Moderate Deficiency")]
    ModerateDeficiency,
    #[serde(rename = "Critical Deficiency")]
    CriticalDeficiency,
}

impl HealthTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthTier::Optimal => "Optimal",
            HealthTier::ModerateDeficiency => "Moderate Deficiency",
            HealthTier::CriticalDeficiency => "Critical Deficiency",
        }
    }
}

impl std::fmt::Display for HealthTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Nitrogen,
    Phosphorus,
    Potassium,
}

/// Estimated deficiency per nutrient, in percent, each within [0, 50].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deficiencies {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

impl Deficiencies {
    /// The nutrient with the largest estimate. Ties resolve N, then P, then K.
    pub fn most_deficient(&self) -> Nutrient {
        let mut best = (Nutrient::Nitrogen, self.nitrogen);
        for candidate in [(Nutrient::Phosphorus, self.phosphorus), (Nutrient::Potassium, self.potassium)] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best.0
    }
}

/// Everything the scorer says about one image. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub overall_health: HealthTier,
    /// Nutrient with the largest estimate; absent when the crop is Optimal.
    pub primary_deficiency: Option<Nutrient>,
    /// Mean VARI used for classification.
    pub avg_vari_index: f64,
    /// Mean VARI before any clamp.
    pub raw_vari_index: f64,
    /// 0-100, derived from the index.
    pub health_score: f64,
    pub deficiencies: Deficiencies,
    pub affected_zones: Vec<String>,
    pub recommendation: String,
}

/// Scores RGB imagery with the VARI vegetation index.
#[derive(Debug, Clone, Default)]
pub struct VegetationHealthScorer {
    config: ScorerConfig,
}

impl VegetationHealthScorer {
    /// Builds a scorer over a validated policy.
    pub fn new(config: ScorerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Scores `image`, drawing deficiency noise and zone choices from `rng`.
    pub fn score<R: Rng + ?Sized>(&self, image: &PixelImage, rng: &mut R) -> Result<HealthAssessment, InvalidImageError> {
        if image.pixel_count() == 0 {
            return Err(InvalidImageError::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }

        let reduction = vegetation_index::reduce(image, self.config.epsilon, self.config.clip_index);
        let index = reduction.index;
        let overall_health = self.classify(index);
        let health_score = self.health_score(index);
        let deficiencies = self.deficiencies(health_score, rng);
        let affected_zones = self.affected_zones(overall_health, health_score, rng);
        let recommendation = recommendation(&affected_zones);
        let primary_deficiency = match overall_health {
            HealthTier::Optimal => None,
            _ => Some(deficiencies.most_deficient()),
        };

        tracing::debug!(
            width = image.width(),
            height = image.height(),
            raw_index = reduction.raw_mean,
            index,
            epsilon_pixels = reduction.epsilon_pixels,
            tier = %overall_health,
            "scored image"
        );

        Ok(HealthAssessment {
            overall_health,
            primary_deficiency,
            avg_vari_index: index,
            raw_vari_index: reduction.raw_mean,
            health_score,
            deficiencies,
            affected_zones,
            recommendation,
        })
    }

    /// Scores `image` with a dedicated RNG seeded from `seed`.
    pub fn score_seeded(&self, image: &PixelImage, seed: u64) -> Result<HealthAssessment, InvalidImageError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.score(image, &mut rng)
    }

    /// Maps a mean index onto a tier. Thresholds are inclusive toward the healthier tier.
    pub fn classify(&self, index: f64) -> HealthTier {
        if index < self.config.critical_threshold {
            HealthTier::CriticalDeficiency
        } else if index < self.config.moderate_threshold {
            HealthTier::ModerateDeficiency
        } else {
            HealthTier::Optimal
        }
    }

    /// 0-100 score, linear in the index between the configured floor and floor + span.
    pub fn health_score(&self, index: f64) -> f64 {
        ((index - self.config.health_score_floor) / self.config.health_score_span * 100.0).clamp(0.0, 100.0)
    }

    fn deficiencies<R: Rng + ?Sized>(&self, health_score: f64, rng: &mut R) -> Deficiencies {
        let shortfall = (100.0 - health_score) / 100.0;
        let mut estimate = |weight: f64| {
            let base = shortfall * DEFICIENCY_CEILING * weight;
            let noise = if self.config.noise_amplitude > 0.0 {
                let amp = self.config.noise_amplitude;
                rng.random_range(-amp..=amp)
            } else {
                0.0
            };
            round_to_tenth((base + noise).clamp(0.0, DEFICIENCY_CEILING))
        };
        Deficiencies {
            nitrogen: estimate(self.config.nitrogen_weight),
            phosphorus: estimate(self.config.phosphorus_weight),
            potassium: estimate(self.config.potassium_weight),
        }
    }

    /// How many zones a non-Optimal assessment flags: at least one, more for lower scores.
    pub fn affected_zone_count(&self, tier: HealthTier, health_score: f64) -> usize {
        let cap = self.config.max_affected_zones.min(self.config.zones.len());
        if tier == HealthTier::Optimal || cap == 0 {
            return 0;
        }
        let scaled = ((100.0 - health_score) / 100.0 * cap as f64).ceil() as usize;
        scaled.clamp(1, cap)
    }

    fn affected_zones<R: Rng + ?Sized>(&self, tier: HealthTier, health_score: f64, rng: &mut R) -> Vec<String> {
        let count = self.affected_zone_count(tier, health_score);
        if count == 0 {
            return Vec::new();
        }
        let mut picked = rand::seq::index::sample(rng, self.config.zones.len(), count).into_vec();
        picked.sort_unstable();
        picked.into_iter().map(|i| self.config.zones[i].clone()).collect()
    }
}

/// Recommendation text for a set of affected zones.
pub fn recommendation(affected_zones: &[String]) -> String {
    if affected_zones.is_empty() {
        MAINTENANCE_MESSAGE.to_string()
    } else {
        format!("Apply balanced fertilizer in zones {}", affected_zones.join(", "))
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;

    fn solid(r: u8, g: u8, b: u8) -> PixelImage {
        PixelImage::filled(10, 10, Pixel::new(r, g, b)).unwrap()
    }

    fn quiet_scorer() -> VegetationHealthScorer {
        VegetationHealthScorer::new(ScorerConfig {
            noise_amplitude: 0.0,
            ..ScorerConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn pure_green_is_optimal_with_no_zones() {
        let a = VegetationHealthScorer::default().score_seeded(&solid(0, 255, 0), 7).unwrap();
        assert_eq!(a.overall_health, HealthTier::Optimal);
        assert_eq!(a.avg_vari_index, 1.0);
        assert_eq!(a.health_score, 100.0);
        assert!(a.affected_zones.is_empty());
        assert_eq!(a.primary_deficiency, None);
        assert_eq!(a.recommendation, MAINTENANCE_MESSAGE);
    }

    #[test]
    fn pure_red_is_critical() {
        let a = VegetationHealthScorer::default().score_seeded(&solid(255, 0, 0), 7).unwrap();
        assert_eq!(a.avg_vari_index, -1.0);
        assert_eq!(a.overall_health, HealthTier::CriticalDeficiency);
        assert!(!a.affected_zones.is_empty());
        assert!(a.primary_deficiency.is_some());
    }

    #[test]
    fn all_black_image_scores_zero_and_is_moderate() {
        let a = VegetationHealthScorer::default().score_seeded(&solid(0, 0, 0), 1).unwrap();
        assert_eq!(a.avg_vari_index, 0.0);
        assert_eq!(a.raw_vari_index, 0.0);
        assert_eq!(a.overall_health, HealthTier::ModerateDeficiency);
        assert!(!a.affected_zones.is_empty());
    }

    #[test]
    fn thresholds_are_inclusive_toward_the_healthier_tier() {
        let scorer = VegetationHealthScorer::default();
        assert_eq!(scorer.classify(CRITICAL_THRESHOLD), HealthTier::ModerateDeficiency);
        assert_eq!(scorer.classify(MODERATE_THRESHOLD), HealthTier::Optimal);
        assert_eq!(scorer.classify(-1e-12), HealthTier::CriticalDeficiency);
        assert_eq!(scorer.classify(MODERATE_THRESHOLD - 1e-12), HealthTier::ModerateDeficiency);
    }

    #[test]
    fn image_on_the_optimal_boundary_classifies_consistently() {
        // (60 - 40) / (60 + 40 - 0) = 0.2 exactly.
        let img = PixelImage::filled(1, 1, Pixel::new(40, 60, 0)).unwrap();
        let scorer = VegetationHealthScorer::default();
        for seed in 0..20 {
            let a = scorer.score_seeded(&img, seed).unwrap();
            assert_eq!(a.avg_vari_index, MODERATE_THRESHOLD);
            assert_eq!(a.overall_health, HealthTier::Optimal);
        }
    }

    #[test]
    fn image_on_the_critical_boundary_classifies_consistently() {
        let img = solid(90, 90, 30);
        let scorer = VegetationHealthScorer::default();
        for seed in 0..20 {
            let a = scorer.score_seeded(&img, seed).unwrap();
            assert_eq!(a.avg_vari_index, CRITICAL_THRESHOLD);
            assert_eq!(a.overall_health, HealthTier::ModerateDeficiency);
        }
    }

    #[test]
    fn zones_empty_iff_optimal() {
        let scorer = VegetationHealthScorer::default();
        let samples = [(0, 255, 0), (255, 0, 0), (0, 0, 0), (100, 110, 40), (100, 160, 20), (200, 50, 10)];
        for (seed, (r, g, b)) in samples.into_iter().enumerate() {
            let a = scorer.score_seeded(&solid(r, g, b), seed as u64).unwrap();
            let optimal = a.overall_health == HealthTier::Optimal;
            assert_eq!(a.affected_zones.is_empty(), optimal, "pixel ({r},{g},{b})");
            assert!(a.affected_zones.len() <= MAX_AFFECTED_ZONES);
        }
    }

    #[test]
    fn lower_scores_flag_at_least_as_many_zones() {
        let scorer = VegetationHealthScorer::default();
        let mild = scorer.affected_zone_count(HealthTier::ModerateDeficiency, 60.0);
        let severe = scorer.affected_zone_count(HealthTier::CriticalDeficiency, 0.0);
        assert_eq!(mild, 2);
        assert_eq!(severe, MAX_AFFECTED_ZONES);
        assert_eq!(scorer.affected_zone_count(HealthTier::ModerateDeficiency, 99.0), 1);
        assert_eq!(scorer.affected_zone_count(HealthTier::Optimal, 0.0), 0);
    }

    #[test]
    fn zones_are_distinct_and_in_grid_order() {
        let a = VegetationHealthScorer::default().score_seeded(&solid(255, 0, 0), 3).unwrap();
        let positions: Vec<usize> = a
            .affected_zones
            .iter()
            .map(|z| DEFAULT_ZONES.iter().position(|d| d == z).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(positions, sorted);
        assert_eq!(
            a.recommendation,
            format!("Apply balanced fertilizer in zones {}", a.affected_zones.join(", "))
        );
    }

    #[test]
    fn same_seed_same_assessment() {
        let img = solid(120, 100, 60);
        let scorer = VegetationHealthScorer::default();
        assert_eq!(scorer.score_seeded(&img, 99).unwrap(), scorer.score_seeded(&img, 99).unwrap());
    }

    #[test]
    fn deficiencies_stay_within_bounds_under_noise() {
        let scorer = VegetationHealthScorer::new(ScorerConfig {
            noise_amplitude: 10.0,
            ..ScorerConfig::default()
        })
        .unwrap();
        for seed in 0..50 {
            for px in [(255, 0, 0), (0, 255, 0), (0, 0, 0)] {
                let a = scorer.score_seeded(&solid(px.0, px.1, px.2), seed).unwrap();
                for v in [a.deficiencies.nitrogen, a.deficiencies.phosphorus, a.deficiencies.potassium] {
                    assert!((0.0..=DEFICIENCY_CEILING).contains(&v), "{v}");
                }
            }
        }
    }

    #[test]
    fn deficiencies_rise_as_the_index_falls() {
        let scorer = quiet_scorer();
        let mut previous: Option<Deficiencies> = None;
        // Index falls as red rises with green and blue fixed (2R >= B holds).
        for r in (0u8..=200).step_by(25) {
            let a = scorer.score_seeded(&solid(r, 150, 40), 0).unwrap();
            if let Some(p) = previous {
                assert!(a.deficiencies.nitrogen >= p.nitrogen);
                assert!(a.deficiencies.phosphorus >= p.phosphorus);
                assert!(a.deficiencies.potassium >= p.potassium);
            }
            previous = Some(a.deficiencies);
        }
    }

    #[test]
    fn noiseless_critical_assessment_names_nitrogen() {
        let a = quiet_scorer().score_seeded(&solid(255, 0, 0), 0).unwrap();
        assert_eq!(a.health_score, 0.0);
        assert_eq!(a.deficiencies.nitrogen, 50.0);
        assert_eq!(a.deficiencies.phosphorus, 35.0);
        assert_eq!(a.deficiencies.potassium, 40.0);
        assert_eq!(a.primary_deficiency, Some(Nutrient::Nitrogen));
    }

    #[test]
    fn clip_can_be_disabled() {
        // Zero denominator with G != R: raw mean far above 1.
        let img = solid(20, 60, 80);
        let clipped = VegetationHealthScorer::default().score_seeded(&img, 0).unwrap();
        let raw = VegetationHealthScorer::new(ScorerConfig {
            clip_index: false,
            ..ScorerConfig::default()
        })
        .unwrap()
        .score_seeded(&img, 0)
        .unwrap();
        assert_eq!(clipped.avg_vari_index, 1.0);
        assert!(raw.avg_vari_index > 1.0);
        assert_eq!(clipped.raw_vari_index, raw.raw_vari_index);
        assert_eq!(clipped.overall_health, raw.overall_health);
    }

    #[test]
    fn config_overrides_deserialize_over_defaults() {
        let cfg: ScorerConfig = serde_json::from_str(r#"{ "moderate_threshold": 0.3, "noise_amplitude": 0 }"#).unwrap();
        assert_eq!(cfg.moderate_threshold, 0.3);
        assert_eq!(cfg.noise_amplitude, 0.0);
        assert_eq!(cfg.critical_threshold, CRITICAL_THRESHOLD);
        assert_eq!(cfg.zones.len(), DEFAULT_ZONES.len());
    }

    #[test]
    fn tiers_serialize_with_display_names() {
        let json = serde_json::to_string(&HealthTier::ModerateDeficiency).unwrap();
        assert_eq!(json, "\"Moderate Deficiency\"");
    }

    fn rejected(json: &str) -> ConfigError {
        let cfg: ScorerConfig = serde_json::from_str(json).unwrap();
        VegetationHealthScorer::new(cfg).unwrap_err()
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ScorerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_epsilon_is_rejected() {
        assert!(matches!(rejected(r#"{ "epsilon": 0 }"#), ConfigError::OutOfRange { field: "epsilon", .. }));
        assert!(matches!(rejected(r#"{ "epsilon": -1e-5 }"#), ConfigError::OutOfRange { field: "epsilon", .. }));
        assert!(matches!(rejected(r#"{ "epsilon": 1e-300 }"#), ConfigError::OutOfRange { field: "epsilon", .. }));
    }

    #[test]
    fn non_finite_epsilon_is_rejected() {
        let cfg = ScorerConfig {
            epsilon: f64::NAN,
            ..ScorerConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::OutOfRange { field: "epsilon", .. })));
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        assert_eq!(
            rejected(r#"{ "critical_threshold": 0.3, "moderate_threshold": 0.2 }"#),
            ConfigError::ThresholdOrder { critical: 0.3, moderate: 0.2 }
        );
    }

    #[test]
    fn non_finite_thresholds_are_rejected() {
        let cfg = ScorerConfig {
            moderate_threshold: f64::INFINITY,
            ..ScorerConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::NotFinite { field: "moderate_threshold", .. })));
    }

    #[test]
    fn non_positive_span_is_rejected() {
        assert!(matches!(
            rejected(r#"{ "health_score_span": 0 }"#),
            ConfigError::NotPositive { field: "health_score_span", .. }
        ));
    }

    #[test]
    fn weights_outside_unit_range_are_rejected() {
        assert!(matches!(
            rejected(r#"{ "potassium_weight": -0.1 }"#),
            ConfigError::OutOfRange { field: "potassium_weight", .. }
        ));
    }

    #[test]
    fn oversized_noise_is_rejected() {
        assert!(matches!(
            rejected(r#"{ "noise_amplitude": 1e308 }"#),
            ConfigError::OutOfRange { field: "noise_amplitude", .. }
        ));
        assert!(matches!(
            rejected(r#"{ "noise_amplitude": -1 }"#),
            ConfigError::OutOfRange { field: "noise_amplitude", .. }
        ));
        let at_ceiling = ScorerConfig {
            noise_amplitude: DEFICIENCY_CEILING,
            ..ScorerConfig::default()
        };
        assert_eq!(at_ceiling.validate(), Ok(()));
    }

    #[test]
    fn empty_zone_policies_are_rejected() {
        assert_eq!(rejected(r#"{ "zones": [] }"#), ConfigError::NoZones);
        assert_eq!(rejected(r#"{ "max_affected_zones": 0 }"#), ConfigError::NoAffectedZones);
    }

    #[test]
    fn smallest_valid_epsilon_keeps_black_and_degenerate_images_finite() {
        let scorer = VegetationHealthScorer::new(ScorerConfig {
            epsilon: MIN_EPSILON,
            clip_index: false,
            ..ScorerConfig::default()
        })
        .unwrap();
        let black = scorer.score_seeded(&solid(0, 0, 0), 0).unwrap();
        assert_eq!(black.avg_vari_index, 0.0);
        let degenerate = scorer.score_seeded(&solid(20, 60, 80), 0).unwrap();
        assert!(degenerate.avg_vari_index.is_finite());
        assert_eq!(degenerate.overall_health, HealthTier::Optimal);
    }
}
