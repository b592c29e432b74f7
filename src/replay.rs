//! Replays recorded strokes through a fresh [`StrokeSession`].
//!
//! Samples carry their own timestamps, so pacing is judged on the recorded
//! timeline rather than on how fast the file is read.

use crate::clock::ManualClock;
use crate::geometry::Point;
use crate::session::{ConditionKind, FitResult, SessionConfig, StrokeSession, StrokeUpdate};
use crate::util::{mean, std_dev};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::io;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    /// Milliseconds since the start of the recording
    pub t_ms: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, t_ms: f64) -> Self {
        Self { x, y, t_ms }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("sample {index} has an invalid timestamp {t_ms}")]
    InvalidTimestamp { index: usize, t_ms: f64 },
}

/// Read `x,y,t_ms` rows (with header) into samples.
pub fn read_samples<R: io::Read>(reader: R) -> Result<Vec<Sample>, ReplayError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut samples = Vec::new();
    for (index, row) in rdr.deserialize::<Sample>().enumerate() {
        let sample = row?;
        if !sample.t_ms.is_finite() || sample.t_ms < 0.0 {
            return Err(ReplayError::InvalidTimestamp {
                index,
                t_ms: sample.t_ms,
            });
        }
        samples.push(sample);
    }
    Ok(samples)
}

/// Write samples as `x,y,t_ms` rows with a header.
pub fn write_samples<W: io::Write>(writer: W, samples: &[Sample]) -> Result<(), ReplayError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for sample in samples {
        wtr.serialize(sample)?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SampleStatus {
    Rejected { kind: ConditionKind, message: String },
    Accepted { points: usize },
    Fitted(FitResult),
    Hidden(FitResult),
    Unfit { points: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleOutcome {
    pub sample: Sample,
    #[serde(flatten)]
    pub status: SampleStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub replayed_at: DateTime<Local>,
    pub samples: usize,
    pub accepted: usize,
    pub too_close: usize,
    pub too_slow: usize,
    pub invalid: usize,
    pub mean_interval_ms: Option<f64>,
    pub interval_std_dev_ms: Option<f64>,
    /// Fit for the stroke as it stood after the last accepted sample
    pub final_fit: Option<FitResult>,
    /// Whether `final_fit` passed the fitter's display gate
    pub final_shown: bool,
    pub outcomes: Vec<SampleOutcome>,
}

impl ReplayReport {
    /// Samples turned away by any gate
    pub fn rejected(&self) -> usize {
        self.too_close + self.too_slow + self.invalid
    }
}

pub fn replay(samples: &[Sample], config: SessionConfig) -> ReplayReport {
    let origin = Instant::now();
    let mut session = StrokeSession::with_clock(config, ManualClock::starting_at(origin));
    session.start();

    let mut outcomes = Vec::with_capacity(samples.len());
    let mut accepted_times = Vec::new();
    let mut final_fit = None;
    let mut final_shown = false;
    let (mut too_close, mut too_slow, mut invalid) = (0, 0, 0);

    for sample in samples {
        let offset = Duration::from_nanos((sample.t_ms.max(0.0) * 1e6).round() as u64);
        session.clock().set(origin + offset);

        let status = match session.update(sample.x, sample.y) {
            Err(err) => {
                match err.kind() {
                    ConditionKind::TooClose => too_close += 1,
                    ConditionKind::TooSlow => too_slow += 1,
                    _ => invalid += 1,
                }
                SampleStatus::Rejected {
                    kind: err.kind(),
                    message: err.to_string(),
                }
            }
            Ok(update) => {
                accepted_times.push(sample.t_ms);
                final_fit = update.fit_result().copied();
                final_shown = update.usable_fit().is_some();
                match update {
                    StrokeUpdate::Accepted { points } => SampleStatus::Accepted { points },
                    StrokeUpdate::Fitted(result) => SampleStatus::Fitted(result),
                    StrokeUpdate::Hidden(result) => SampleStatus::Hidden(result),
                    StrokeUpdate::Unfit { points, reason } => SampleStatus::Unfit {
                        points,
                        reason: reason.to_string(),
                    },
                }
            }
        };

        outcomes.push(SampleOutcome {
            sample: *sample,
            status,
        });
    }

    let intervals: Vec<f64> = accepted_times.windows(2).map(|w| w[1] - w[0]).collect();

    let report = ReplayReport {
        replayed_at: Local::now(),
        samples: samples.len(),
        accepted: accepted_times.len(),
        too_close,
        too_slow,
        invalid,
        mean_interval_ms: mean(&intervals),
        interval_std_dev_ms: std_dev(&intervals),
        final_fit,
        final_shown,
        outcomes,
    };

    info!(
        samples = report.samples,
        accepted = report.accepted,
        rejected = report.rejected(),
        shown = report.final_shown,
        "replay finished"
    );

    report
}

/// `drawCircle(...)` call a canvas page evaluates to draw the circle.
pub fn draw_command(result: &FitResult) -> String {
    format!(
        "drawCircle({}, {}, {}, '{}');",
        result.center.x, result.center.y, result.radius, result.class
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::QualityClass;
    use crate::stroke_generator::{StrokeGenConfig, StrokeGenerator};
    use assert_matches::assert_matches;

    const CIRCLE_CSV: &str = "x,y,t_ms
150,100,0
130,140,20
100,150,40
70,140,60
50,100,80
70,60,100
100,50,120
130,60,140
";

    #[test]
    fn read_samples_parses_rows() {
        let samples = read_samples(CIRCLE_CSV.as_bytes()).unwrap();
        assert_eq!(samples.len(), 8);
        assert_eq!(samples[1], Sample::new(130.0, 140.0, 20.0));
    }

    #[test]
    fn read_samples_trims_whitespace() {
        let samples = read_samples("x, y, t_ms\n 12.5, 3 , 7\n".as_bytes()).unwrap();
        assert_eq!(samples, vec![Sample::new(12.5, 3.0, 7.0)]);
    }

    #[test]
    fn read_samples_rejects_negative_time() {
        let err = read_samples("x,y,t_ms\n1,2,-5\n".as_bytes()).unwrap_err();
        assert_matches!(err, ReplayError::InvalidTimestamp { index: 0, .. });
    }

    #[test]
    fn read_samples_rejects_malformed_rows() {
        let err = read_samples("x,y,t_ms\n1,two,5\n".as_bytes()).unwrap_err();
        assert_matches!(err, ReplayError::Csv(_));
    }

    #[test]
    fn write_then_read_keeps_samples() {
        let samples = vec![Sample::new(1.5, 2.0, 0.0), Sample::new(20.0, 4.0, 16.5)];
        let mut buf = Vec::new();
        write_samples(&mut buf, &samples).unwrap();
        assert_eq!(read_samples(buf.as_slice()).unwrap(), samples);
    }

    #[test]
    fn replay_of_exact_octagon_is_green_but_hidden() {
        let samples = read_samples(CIRCLE_CSV.as_bytes()).unwrap();
        let report = replay(&samples, SessionConfig::default());

        assert_eq!(report.accepted, 8);
        assert_eq!(report.rejected(), 0);
        assert_eq!(report.mean_interval_ms, Some(20.0));
        assert_eq!(report.interval_std_dev_ms, Some(0.0));

        let fit = report.final_fit.unwrap();
        assert_eq!(fit.center, Point::new(100.0, 100.0));
        assert_eq!(fit.class, QualityClass::High);
        assert!(!report.final_shown);
        assert_eq!(draw_command(&fit), "drawCircle(100, 100, 50, 'green');");
    }

    #[test]
    fn replay_of_generated_lap_ends_shown_and_green() {
        let samples = StrokeGenerator::new(StrokeGenConfig {
            points: 48,
            ..StrokeGenConfig::default()
        })
        .generate();
        let report = replay(&samples, SessionConfig::default());

        assert_eq!(report.accepted, 48);
        assert!(report.final_shown);
        let fit = report.final_fit.unwrap();
        assert_eq!(fit.class, QualityClass::High);
        assert!((fit.radius - 150.0).abs() < 1e-9);
        assert_matches!(&report.outcomes[47].status, SampleStatus::Fitted(last) if *last == fit);
    }

    #[test]
    fn final_fit_follows_the_last_accepted_sample() {
        // the triangle is shown, then a fourth point makes the stroke fit
        // inside a larger diameter circle and the fit is held back
        let samples = vec![
            Sample::new(100.0, 100.0, 0.0),
            Sample::new(120.0, 100.0, 10.0),
            Sample::new(110.0, 116.0, 20.0),
            Sample::new(110.0, 84.0, 30.0),
        ];
        let report = replay(&samples, SessionConfig::default());

        assert_matches!(report.outcomes[2].status, SampleStatus::Fitted(_));
        assert_matches!(report.outcomes[3].status, SampleStatus::Hidden(_));
        let fit = report.final_fit.unwrap();
        assert_eq!(fit.center, Point::new(110.0, 100.0));
        assert_eq!(fit.radius, 16.0);
        assert!(!report.final_shown);
    }

    #[test]
    fn replay_counts_rejections() {
        let samples = vec![
            Sample::new(2.0, 2.0, 0.0),
            Sample::new(100.0, 100.0, 10.0),
            Sample::new(104.0, 100.0, 20.0),
            Sample::new(150.0, 100.0, 400.0),
        ];
        let report = replay(&samples, SessionConfig::default());

        assert_eq!(report.accepted, 1);
        assert_eq!(report.too_close, 2);
        assert_eq!(report.too_slow, 1);
        assert!(report.final_fit.is_none());
        assert!(!report.final_shown);
        assert_matches!(
            &report.outcomes[3].status,
            SampleStatus::Rejected { kind: ConditionKind::TooSlow, message } if message == "Draw faster"
        );
    }

    #[test]
    fn report_serializes_to_json() {
        let samples = read_samples(CIRCLE_CSV.as_bytes()).unwrap();
        let report = replay(&samples, SessionConfig::default());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["accepted"], 8);
        assert_eq!(json["outcomes"][0]["status"], "accepted");
        assert_eq!(json["outcomes"][7]["status"], "hidden");
        assert_eq!(json["final_fit"]["class"], "high");
        assert_eq!(json["final_shown"], false);
    }
}
