// THEORY:
// Yield is predicted from the other two stages, not from pixels. A healthy,
// pest-free field is assumed to produce `BASE_YIELD`; pest pressure and nutrient
// stress each remove a fixed fraction, multiplicatively. A small bounded noise
// term stands in for model uncertainty and comes from the caller's RNG.

use crate::core_modules::health_scorer::HealthTier;
use crate::core_modules::pest_detection::AlertLevel;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tons per hectare for an unstressed crop.
pub const BASE_YIELD: f64 = 5.0;
pub const HIGH_ALERT_PENALTY: f64 = 0.4;
pub const MODERATE_ALERT_PENALTY: f64 = 0.1;
pub const CRITICAL_NUTRIENT_PENALTY: f64 = 0.3;
pub const MODERATE_NUTRIENT_PENALTY: f64 = 0.15;
pub const YIELD_NOISE: f64 = 0.1;
pub const BASE_CONFIDENCE: f64 = 0.95;
pub const HARVEST_READY_IN_DAYS: u32 = 30;
/// Below this the comparison against last season reads as a loss.
pub const LAST_SEASON_PIVOT: f64 = 4.5;
pub const YIELD_UNIT: &str = "tons/ha";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldPrediction {
    pub status: String,
    pub predicted_yield: f64,
    pub unit: String,
    pub harvest_ready_in: u32,
    pub confidence: f64,
    pub comparison: String,
}

/// Nutrient input to the predictor. `None` means the nutrient stage failed.
pub type NutrientSignal = Option<HealthTier>;

#[derive(Debug, Clone, Default)]
pub struct YieldPredictor;

impl YieldPredictor {
    pub fn predict<R: Rng + ?Sized>(&self, alert: AlertLevel, nutrient: NutrientSignal, rng: &mut R) -> YieldPrediction {
        let pest_penalty = pest_penalty(alert);
        let nutrient_penalty = nutrient_penalty(nutrient);

        let noise = rng.random_range(-YIELD_NOISE..=YIELD_NOISE);
        let predicted = (BASE_YIELD * (1.0 - pest_penalty) * (1.0 - nutrient_penalty) + noise).max(0.0);
        let confidence = BASE_CONFIDENCE - (pest_penalty + nutrient_penalty);

        YieldPrediction {
            status: "completed".to_string(),
            predicted_yield: round_to(predicted, 2),
            unit: YIELD_UNIT.to_string(),
            harvest_ready_in: HARVEST_READY_IN_DAYS,
            confidence: round_to(confidence, 2),
            comparison: if predicted < LAST_SEASON_PIVOT {
                "-5% vs last season".to_string()
            } else {
                "+2% vs last season".to_string()
            },
        }
    }
}

pub fn pest_penalty(alert: AlertLevel) -> f64 {
    match alert {
        AlertLevel::HighAlert => HIGH_ALERT_PENALTY,
        AlertLevel::Moderate => MODERATE_ALERT_PENALTY,
        AlertLevel::Safe => 0.0,
    }
}

pub fn nutrient_penalty(nutrient: NutrientSignal) -> f64 {
    match nutrient {
        Some(HealthTier::CriticalDeficiency) => CRITICAL_NUTRIENT_PENALTY,
        Some(HealthTier::ModerateDeficiency) | None => MODERATE_NUTRIENT_PENALTY,
        Some(HealthTier::Optimal) => 0.0,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
