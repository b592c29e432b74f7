use crate::geometry::Point;
use crate::replay::Sample;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

/// Configuration for synthetic strokes
#[derive(Debug, Clone)]
pub struct StrokeGenConfig {
    pub center: Point,
    pub radius: f64,
    pub points: usize,
    pub interval_ms: f64,
    /// Maximum radial wobble applied to each sample
    pub jitter: f64,
    pub seed: Option<u64>,
}

impl Default for StrokeGenConfig {
    fn default() -> Self {
        Self {
            center: Point::new(400.0, 300.0),
            radius: 150.0,
            points: 48,
            interval_ms: 16.0,
            jitter: 0.0,
            seed: None,
        }
    }
}

/// Produces one lap around a circle as timed samples
pub struct StrokeGenerator {
    config: StrokeGenConfig,
}

impl StrokeGenerator {
    pub fn new(config: StrokeGenConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self) -> Vec<Sample> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let StrokeGenConfig {
            center,
            radius,
            points,
            interval_ms,
            jitter,
            ..
        } = self.config;

        (0..points)
            .map(|i| {
                let theta = TAU * i as f64 / points as f64;
                let wobble = if jitter > 0.0 {
                    rng.gen_range(-jitter..=jitter)
                } else {
                    0.0
                };
                let r = radius + wobble;
                Sample::new(
                    center.x + r * theta.cos(),
                    center.y + r * theta.sin(),
                    i as f64 * interval_ms,
                )
            })
            .collect()
    }
}
