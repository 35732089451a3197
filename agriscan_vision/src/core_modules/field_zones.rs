// THEORY:
// The field-zone grid is what the map view draws: one tile per named zone with a
// coarse status and a 0-100 score. It is assembled from the other stages'
// outputs, not measured. Zones the nutrient stage flagged become warnings;
// pest pressure randomly escalates tiles. When no zone detail exists at all
// (the nutrient stage failed) a fixed demonstration grid is returned instead.

use crate::core_modules::pest_detection::AlertLevel;
use rand::Rng;
use serde::{Deserialize, Serialize};

const HEALTHY_SCORES: (u8, u8) = (85, 98);
const WARNING_SCORES: (u8, u8) = (55, 75);
const CRITICAL_SCORES: (u8, u8) = (30, 50);
const PEST_WARNING_SCORES: (u8, u8) = (60, 70);
/// Chance that a tile turns critical under a High Alert.
const HIGH_ALERT_CRITICAL_CHANCE: f64 = 0.3;
/// Chance that a tile turns to warning under a Moderate alert.
const MODERATE_ALERT_WARNING_CHANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneStatus {
    Healthy,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldZone {
    pub id: String,
    pub status: ZoneStatus,
    pub score: u8,
}

impl FieldZone {
    fn new(id: &str, status: ZoneStatus, score: u8) -> Self {
        Self {
            id: id.to_string(),
            status,
            score,
        }
    }
}

/// Builds the zone grid for `zones` from the nutrient-affected set and the pest alert.
pub fn generate<R: Rng + ?Sized>(zones: &[String], affected: &[String], alert: AlertLevel, rng: &mut R) -> Vec<FieldZone> {
    zones
        .iter()
        .map(|id| {
            let (mut status, mut range) = if affected.contains(id) {
                (ZoneStatus::Warning, WARNING_SCORES)
            } else {
                (ZoneStatus::Healthy, HEALTHY_SCORES)
            };

            match alert {
                AlertLevel::HighAlert if rng.random_bool(HIGH_ALERT_CRITICAL_CHANCE) => {
                    status = ZoneStatus::Critical;
                    range = CRITICAL_SCORES;
                }
                AlertLevel::Moderate if rng.random_bool(MODERATE_ALERT_WARNING_CHANCE) => {
                    status = ZoneStatus::Warning;
                    range = PEST_WARNING_SCORES;
                }
                _ => {}
            }

            FieldZone::new(id, status, rng.random_range(range.0..=range.1))
        })
        .collect()
}

/// Fixed grid shown when no zone detail is available.
pub fn static_grid() -> Vec<FieldZone> {
    vec![
        FieldZone::new("A1", ZoneStatus::Healthy, 92),
        FieldZone::new("A2", ZoneStatus::Healthy, 88),
        FieldZone::new("A3", ZoneStatus::Warning, 65),
        FieldZone::new("B1", ZoneStatus::Healthy, 90),
        FieldZone::new("B2", ZoneStatus::Critical, 35),
        FieldZone::new("B3", ZoneStatus::Warning, 58),
        FieldZone::new("C1", ZoneStatus::Warning, 62),
        FieldZone::new("C2", ZoneStatus::Healthy, 89),
        FieldZone::new("C3", ZoneStatus::Critical, 42),
    ]
}
