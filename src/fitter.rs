//! Diameter-based circle fitting.
//!
//! The candidate circle is the one whose diameter is the farthest-apart pair
//! of points in the stroke. Interior points never move the center; they only
//! feed the containment check and the polygon penalty that decides whether
//! the fit is shown.
//!
//! The penalty measures how far the stroke's closed polygon stays from the
//! center. A closed lap keeps its edges near the rim, so its quality lands
//! close to zero and it is shown. A stroke that never leaves the diameter
//! circle (an arc, a sliver, an exact inscribed polygon) scores 100 and is
//! held back.

use crate::geometry::{distance, distance_to_segment, midpoint, Point};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fits whose containment quality falls below this are flagged.
pub const POOR_FIT_QUALITY: f64 = 50.0;

/// Relative tolerance used to decide that a stroke is a straight line.
const COLLINEAR_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Containment {
    /// Every point lies within or on the circle
    Full,
    /// At least one point lies outside; the polygon penalty was applied
    Partial { segment_distance: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fit {
    pub center: Point,
    pub radius: f64,
    pub quality: f64,
    pub containment: Containment,
    pub is_poor_fit: bool,
}

impl Fit {
    /// Whether the fit should be displayed. Only flagged fits are, which
    /// makes closed laps drawable and keeps fully contained strokes hidden.
    pub fn is_usable(&self) -> bool {
        self.is_poor_fit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FitError {
    #[error("need at least 2 points to fit a circle, found {found}")]
    TooFewPoints { found: usize },
    #[error("stroke is degenerate, no circle can be fitted yet")]
    Degenerate,
}

/// Fit a circle to an ordered stroke.
pub fn fit(points: &[Point]) -> Result<Fit, FitError> {
    if points.len() < 2 {
        return Err(FitError::TooFewPoints {
            found: points.len(),
        });
    }

    let (p1, p2) = farthest_pair(points).ok_or(FitError::Degenerate)?;
    let center = midpoint(p1, p2);
    let radius = distance(p1, p2) / 2.0;

    if !(radius > 0.0 && radius.is_finite()) {
        return Err(FitError::Degenerate);
    }
    if points.len() >= 3 && is_collinear(points, p1, p2) {
        return Err(FitError::Degenerate);
    }

    let all_in_circle = points.iter().all(|&p| distance(p, center) <= radius);

    let (quality, containment) = if all_in_circle {
        (100.0, Containment::Full)
    } else {
        let segment_distance: f64 = points
            .iter()
            .circular_tuple_windows::<(_, _)>()
            .map(|(&v, &w)| distance_to_segment(center, v, w))
            .sum();
        let quality = (1.0 - segment_distance / radius / points.len() as f64) * 100.0;
        (quality, Containment::Partial { segment_distance })
    };

    if !quality.is_finite() {
        return Err(FitError::Degenerate);
    }

    Ok(Fit {
        center,
        radius,
        quality,
        containment,
        is_poor_fit: quality < POOR_FIT_QUALITY,
    })
}

/// Exhaustive scan for the pair with the largest separation.
///
/// Pairs are visited as `(i, j)` with `i < j` in slice order and only a
/// strictly larger distance replaces the current best, so ties keep the
/// first pair encountered. Returns `None` when every point coincides.
fn farthest_pair(points: &[Point]) -> Option<(Point, Point)> {
    points
        .iter()
        .tuple_combinations::<(_, _)>()
        .fold(None, |best: Option<(f64, Point, Point)>, (&a, &b)| {
            let d = distance(a, b);
            match best {
                Some((max, _, _)) if d <= max => best,
                _ if d > 0.0 => Some((d, a, b)),
                _ => best,
            }
        })
        .map(|(_, a, b)| (a, b))
}

fn is_collinear(points: &[Point], p1: Point, p2: Point) -> bool {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let length = (dx * dx + dy * dy).sqrt();

    points.iter().all(|p| {
        let cross = dx * (p.y - p1.y) - dy * (p.x - p1.x);
        (cross / length).abs() <= COLLINEAR_TOLERANCE * length
    })
}
