use crate::clock::{Clock, SystemClock};
use crate::fitter::{self, Fit, FitError};
use crate::geometry::{distance, Point};
use crate::score::{radial_deviation_percent, QualityClass, QualityThresholds};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Samples closer than this to the last accepted point are rejected
    pub min_spacing: f64,
    /// Longest allowed pause between accepted samples
    pub max_gap_ms: u64,
    /// Points needed before a circle is fitted
    pub min_fit_points: usize,
    pub thresholds: QualityThresholds,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_spacing: 10.0,
            max_gap_ms: 100,
            min_fit_points: 3,
            thresholds: QualityThresholds::default(),
        }
    }
}

impl SessionConfig {
    pub fn max_gap(&self) -> Duration {
        Duration::from_millis(self.max_gap_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum ConditionKind {
    TooClose,
    TooSlow,
    InvalidPoint,
    DegenerateFit,
}

/// Why a sample was not added to the stroke
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum StrokeError {
    #[error("Too close to last point")]
    TooClose { distance: f64 },
    #[error("Draw faster")]
    TooSlow { elapsed: Duration },
    #[error("Point coordinates must be finite")]
    InvalidPoint,
}

impl StrokeError {
    pub fn kind(&self) -> ConditionKind {
        match self {
            StrokeError::TooClose { .. } => ConditionKind::TooClose,
            StrokeError::TooSlow { .. } => ConditionKind::TooSlow,
            StrokeError::InvalidPoint => ConditionKind::InvalidPoint,
        }
    }
}

/// Everything a renderer needs to draw the current circle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub center: Point,
    pub radius: f64,
    /// Radial deviation score clamped to `[0, 100]`
    pub quality_percent: f64,
    pub raw_percent: f64,
    pub class: QualityClass,
    /// Containment quality reported by the fitter
    pub fit_quality: f64,
    pub is_red_flag: bool,
}

impl FitResult {
    fn from_fit(fit: &Fit, points: &[Point], thresholds: &QualityThresholds) -> Option<Self> {
        let raw_percent = radial_deviation_percent(points, fit.center, fit.radius)?;
        Some(Self {
            center: fit.center,
            radius: fit.radius,
            quality_percent: raw_percent.clamp(0.0, 100.0),
            raw_percent,
            class: thresholds.classify(raw_percent),
            fit_quality: fit.quality,
            is_red_flag: fit.is_poor_fit,
        })
    }
}

/// Outcome of an accepted sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeUpdate {
    /// Not enough points to fit yet
    Accepted { points: usize },
    /// A circle was fitted to the whole stroke and should be drawn
    Fitted(FitResult),
    /// A circle was fitted but the fitter's gate holds it back
    Hidden(FitResult),
    /// No circle can be fitted to the current stroke; keep drawing
    Unfit { points: usize, reason: FitError },
}

impl StrokeUpdate {
    /// The fit to show, if any
    pub fn usable_fit(&self) -> Option<&FitResult> {
        match self {
            StrokeUpdate::Fitted(result) => Some(result),
            _ => None,
        }
    }

    /// Fit for the current stroke whether or not it is shown
    pub fn fit_result(&self) -> Option<&FitResult> {
        match self {
            StrokeUpdate::Fitted(result) | StrokeUpdate::Hidden(result) => Some(result),
            _ => None,
        }
    }

    pub fn condition(&self) -> Option<ConditionKind> {
        match self {
            StrokeUpdate::Unfit { .. } => Some(ConditionKind::DegenerateFit),
            _ => None,
        }
    }
}

/// A single drawing attempt, owned by whoever drives input
#[derive(Debug)]
pub struct StrokeSession<C: Clock = SystemClock> {
    config: SessionConfig,
    clock: C,
    points: Vec<Point>,
    last_point: Point,
    last_accepted_at: Option<Instant>,
}

impl StrokeSession<SystemClock> {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for StrokeSession<SystemClock> {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl<C: Clock> StrokeSession<C> {
    pub fn with_clock(config: SessionConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            points: Vec::new(),
            last_point: Point::ORIGIN,
            last_accepted_at: None,
        }
    }

    /// Forget the current stroke and begin a new attempt
    pub fn start(&mut self) {
        self.points.clear();
        self.last_point = Point::ORIGIN;
        self.last_accepted_at = None;
        debug!("stroke session started");
    }

    /// Offer the next sample of the stroke, timed by the session's clock.
    pub fn update(&mut self, x: f64, y: f64) -> Result<StrokeUpdate, StrokeError> {
        let now = self.clock.now();
        self.update_at(x, y, now)
    }

    /// Same as [`update`](Self::update) with an explicit sample instant.
    ///
    /// Spacing is checked before pacing; a rejected sample leaves the
    /// session untouched.
    pub fn update_at(&mut self, x: f64, y: f64, now: Instant) -> Result<StrokeUpdate, StrokeError> {
        let current = Point::new(x, y);
        if !current.is_finite() {
            debug!(x, y, "rejected sample: non-finite coordinates");
            return Err(StrokeError::InvalidPoint);
        }

        let gap = distance(current, self.last_point);
        if gap < self.config.min_spacing {
            debug!(x, y, distance = gap, "rejected sample: too close");
            return Err(StrokeError::TooClose { distance: gap });
        }

        if let Some(last) = self.last_accepted_at {
            let elapsed = now.saturating_duration_since(last);
            if elapsed > self.config.max_gap() {
                debug!(x, y, elapsed_ms = elapsed.as_millis() as u64, "rejected sample: too slow");
                return Err(StrokeError::TooSlow { elapsed });
            }
        }

        self.points.push(current);
        self.last_point = current;
        self.last_accepted_at = Some(now);
        trace!(x, y, points = self.points.len(), "accepted sample");

        Ok(self.evaluate())
    }

    fn evaluate(&self) -> StrokeUpdate {
        let count = self.points.len();
        if count < self.config.min_fit_points.max(2) {
            return StrokeUpdate::Accepted { points: count };
        }

        let fit = match fitter::fit(&self.points) {
            Ok(fit) => fit,
            Err(reason) => {
                debug!(points = count, %reason, "no circle for current stroke");
                return StrokeUpdate::Unfit {
                    points: count,
                    reason,
                };
            }
        };

        let Some(result) = FitResult::from_fit(&fit, &self.points, &self.config.thresholds) else {
            return StrokeUpdate::Unfit {
                points: count,
                reason: FitError::Degenerate,
            };
        };

        debug!(
            points = count,
            cx = result.center.x,
            cy = result.center.y,
            radius = result.radius,
            percent = result.raw_percent,
            class = %result.class,
            red_flag = result.is_red_flag,
            "fitted circle"
        );

        if fit.is_usable() {
            StrokeUpdate::Fitted(result)
        } else {
            StrokeUpdate::Hidden(result)
        }
    }

    /// Accepted points in drawing order
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Last accepted point, or the origin before the first one
    pub fn last_point(&self) -> Point {
        self.last_point
    }

    /// When the last point was accepted
    pub fn last_accepted_at(&self) -> Option<Instant> {
        self.last_accepted_at
    }

    /// Gates and thresholds this session was built with
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
