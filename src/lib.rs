// Library surface for the CLI and integration tests.
pub mod clock;
pub mod config;
pub mod fitter;
pub mod geometry;
pub mod replay;
pub mod score;
pub mod session;
pub mod stroke_generator;
pub mod util;

pub use fitter::{fit, Fit, FitError};
pub use geometry::Point;
pub use score::QualityClass;
pub use session::{FitResult, SessionConfig, StrokeError, StrokeSession, StrokeUpdate};
