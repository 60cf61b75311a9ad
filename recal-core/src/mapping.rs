//! Fitted Calibration Mapping
//!
//! ## Overview
//!
//! A [`Mapping`] is one immutable snapshot of the sensor-to-reference
//! relationship, produced by the fitter and replaced wholesale on each
//! successful retrain. It carries two models fit from the same corpus:
//!
//! 1. **Piecewise-linear interpolant** - the live correction path. Exact at
//!    every corpus point, linear between neighbors, and *extrapolating*
//!    (never clamping) beyond the observed range using the slope of the
//!    nearest edge segment.
//! 2. **Least-squares line** - retained for diagnostics and offline
//!    comparison. Not consulted when correcting readings.
//!
//! ## Interpolant Semantics
//!
//! Points are sorted ascending by sensor value. Corpus pairs may share a
//! sensor value (the reference disagreed across visits to the same raw
//! reading), which produces zero-width segments:
//!
//! ```text
//!   reference
//!      |            o (131, 200)
//!      |       o (125, 175)
//!      |  o (40, 75)      <- two points share x = 40:
//!      |  o (40, 50)         queries at 40 resolve to the last one (75),
//!      |                     segments of zero width are never divided by
//!      +-------------- sensor
//! ```
//!
//! Evaluation rules, in order:
//! - query below the first point: extrapolate the lowest positive-width
//!   segment leftward
//! - query above the last point: extrapolate the highest positive-width
//!   segment rightward
//! - query exactly at a corpus abscissa: the last point at that abscissa
//! - otherwise: linear interpolation between the two bracketing points
//!
//! Both models are plain data and serialize as part of the persisted
//! snapshot; rebuilding a mapping from disk yields bit-identical output.

use serde::{Deserialize, Serialize};

/// Piecewise-linear interpolant over the corpus points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpolant {
    /// (sensor, reference) knots, ascending by sensor value
    points: Vec<(f64, f64)>,
}

impl Interpolant {
    /// Build from knots already sorted ascending by sensor value with at
    /// least two distinct abscissae. The fitter is the only producer.
    pub(crate) fn new(points: Vec<(f64, f64)>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].0 <= w[1].0));
        debug_assert!(points.first().map(|p| p.0) != points.last().map(|p| p.0));
        Self { points }
    }

    /// The interpolation knots, ascending by sensor value
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Evaluate the interpolant at `x`, extrapolating beyond the knots
    pub fn evaluate(&self, x: f64) -> f64 {
        let points = &self.points;
        let first = points[0];
        let last = points[points.len() - 1];

        if x < first.0 {
            let (a, b) = self.lowest_segment();
            return extend(a, b, x);
        }
        if x > last.0 {
            let (a, b) = self.highest_segment();
            return extend(a, b, x);
        }

        // First index whose abscissa exceeds x; everything before is <= x.
        let upper = points.partition_point(|p| p.0 <= x);
        let below = points[upper - 1];
        if below.0 == x {
            // Last point at this abscissa wins when pairs share it
            return below.1;
        }
        let above = points[upper];
        extend(below, above, x)
    }

    /// Lowest segment with positive width: from the last point at the
    /// minimum abscissa to the first point beyond it.
    fn lowest_segment(&self) -> ((f64, f64), (f64, f64)) {
        let min_x = self.points[0].0;
        let beyond = self.points.partition_point(|p| p.0 <= min_x);
        (self.points[beyond - 1], self.points[beyond])
    }

    /// Highest segment with positive width: from the last point below the
    /// maximum abscissa to the final point.
    fn highest_segment(&self) -> ((f64, f64), (f64, f64)) {
        let max_x = self.points[self.points.len() - 1].0;
        let below = self.points.partition_point(|p| p.0 < max_x);
        (self.points[below - 1], self.points[self.points.len() - 1])
    }
}

/// Linear interpolation/extrapolation along the segment a->b, which must
/// have positive width
fn extend(a: (f64, f64), b: (f64, f64), x: f64) -> f64 {
    let slope = (b.1 - a.1) / (b.0 - a.0);
    a.1 + (x - a.0) * slope
}

/// Ordinary-least-squares line of reference on sensor value.
///
/// Kept alongside the interpolant for diagnostics; not on the live
/// correction path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    /// Fitted slope
    pub slope: f64,
    /// Fitted intercept
    pub intercept: f64,
}

impl Regression {
    /// Evaluate the fitted line at `x`
    pub fn estimate(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// One immutable fitted snapshot: interpolant plus diagnostic regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    interpolant: Interpolant,
    regression: Regression,
}

impl Mapping {
    pub(crate) fn new(interpolant: Interpolant, regression: Regression) -> Self {
        Self {
            interpolant,
            regression,
        }
    }

    /// Correct a raw sensor value via the interpolant
    pub fn correct(&self, sensor_value: f64) -> f64 {
        self.interpolant.evaluate(sensor_value)
    }

    /// The piecewise-linear interpolant
    pub fn interpolant(&self) -> &Interpolant {
        &self.interpolant
    }

    /// The diagnostic least-squares line
    pub fn regression(&self) -> &Regression {
        &self.regression
    }
}
