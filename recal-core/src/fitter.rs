//! Mapping Fitter - from Corpus to Mapping
//!
//! Pure and deterministic: the same corpus (as a set of points) always
//! yields a bit-identical [`Mapping`]. No I/O, no side effects - persistence
//! and installation belong to the engine.
//!
//! Both models come from the same pass over the corpus. The interpolant's
//! knots are simply the corpus points; the regression is a textbook
//! single-predictor least squares computed with the centered two-pass
//! formula, which is stable enough for corpora this size and keeps the
//! arithmetic order (and thus the bits) fixed.

use crate::dataset::CalibrationDataset;
use crate::errors::{FitError, FitResult};
use crate::mapping::{Interpolant, Mapping, Regression};

/// Minimum distinct sensor values required for a fit
pub const MIN_DISTINCT_POINTS: usize = 2;

/// Fit a mapping from the corpus.
///
/// # Errors
/// Returns [`FitError::InsufficientData`] when fewer than
/// [`MIN_DISTINCT_POINTS`] distinct sensor values are present - both the
/// interpolant and the regression are degenerate below that.
pub fn fit(dataset: &CalibrationDataset) -> FitResult<Mapping> {
    let distinct = dataset.distinct_sensor_values();
    if distinct < MIN_DISTINCT_POINTS {
        return Err(FitError::InsufficientData {
            required: MIN_DISTINCT_POINTS,
            distinct,
        });
    }

    let points: Vec<(f64, f64)> = dataset
        .iter()
        .map(|o| (o.sensor_value, o.reference_value))
        .collect();
    let regression = least_squares(&points);

    Ok(Mapping::new(Interpolant::new(points), regression))
}

/// Ordinary least squares of reference on sensor value.
///
/// The caller guarantees at least two distinct abscissae, so the centered
/// sum of squares is strictly positive.
fn least_squares(points: &[(f64, f64)]) -> Regression {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for &(x, y) in points {
        let dx = x - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }

    let slope = sxy / sxx;
    Regression {
        slope,
        intercept: mean_y - slope * mean_x,
    }
}
