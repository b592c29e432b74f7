use crate::geometry::{distance, Point};
use serde::{Deserialize, Serialize};

/// Display class of a fitted stroke, named after the color it is drawn in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum QualityClass {
    #[strum(serialize = "green")]
    High,
    #[strum(serialize = "orange")]
    Medium,
    #[strum(serialize = "red")]
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            high: 95.0,
            medium: 90.0,
        }
    }
}

impl QualityThresholds {
    pub fn classify(&self, percent: f64) -> QualityClass {
        if percent >= self.high {
            QualityClass::High
        } else if percent >= self.medium {
            QualityClass::Medium
        } else {
            QualityClass::Low
        }
    }
}

/// Classify with the default 95/90 boundaries.
pub fn classify(percent: f64) -> QualityClass {
    QualityThresholds::default().classify(percent)
}

/// How closely the stroke hugs the fitted circle, as a raw percentage.
///
/// Each point contributes its absolute radial deviation; the mean deviation
/// is scaled by 100 and subtracted from 100. The result is never above 100
/// but is unbounded below, and is `None` for an empty stroke.
pub fn radial_deviation_percent(points: &[Point], center: Point, radius: f64) -> Option<f64> {
    if points.is_empty() {
        return None;
    }

    let diff: f64 = points
        .iter()
        .map(|&p| (distance(p, center) - radius).abs())
        .sum();

    Some(100.0 - (diff / points.len() as f64) * 100.0)
}
