//! Calibration Dataset - the Ground-Truth Corpus
//!
//! ## Overview
//!
//! The dataset is the ordered corpus of paired observations the mapping is
//! fit from: for each point, the raw value the sensor reported and the value
//! the trusted reference assigned to the same quantity. Everything the fitter
//! produces is a function of this corpus and nothing else, so its invariants
//! are what make retraining reproducible:
//!
//! 1. **Sorted**: ascending by sensor value at all times a mapping is derived
//!    from it, with ties broken by reference value so the order is total.
//! 2. **Deduplicated**: uniqueness is on the *pair*, not the sensor value
//!    alone. Two observations with the same sensor value but different
//!    reference values are both legitimate data and both kept.
//! 3. **Monotone growth**: merging pending observations can only add points.
//!    Nothing is ever dropped except exact duplicates.
//!
//! ## Duplicate Sensor Values
//!
//! Low-cost sensors quantize aggressively, so the same raw value showing up
//! against two different reference values is normal (the seed corpus itself
//! contains one such collision). The dataset keeps both points; how a query
//! at that abscissa resolves is the interpolant's concern, not the corpus's.

use serde::{Deserialize, Serialize};

/// One paired reading: what the sensor said, and what the reference said.
///
/// Immutable once recorded. The reference value may itself be a previously
/// corrected prediction when no independent reference measurement is taken
/// during live operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Raw value reported by the sensor
    pub sensor_value: f64,
    /// Value assigned by the trusted reference
    pub reference_value: f64,
}

impl Observation {
    /// Create a new observation pair
    pub const fn new(sensor_value: f64, reference_value: f64) -> Self {
        Self {
            sensor_value,
            reference_value,
        }
    }
}

/// Ordered-by-sensor-value sequence of unique observations.
///
/// Construction always normalizes (sorts and deduplicates), so any dataset
/// handed to the fitter already satisfies the corpus invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalibrationDataset {
    observations: Vec<Observation>,
}

impl CalibrationDataset {
    /// Build a dataset from raw pairs, sorting and removing exact duplicates
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        let mut dataset = Self { observations };
        dataset.normalize();
        dataset
    }

    /// Seed corpus captured against the reference instrument on the bench.
    ///
    /// Ten pairs spanning the sensor's working range. The collision at
    /// sensor value 40 (two different reference values) is genuine bench
    /// data and is kept as-is.
    pub fn bootstrap() -> Self {
        const SEED: [(f64, f64); 10] = [
            (40.0, 50.0),
            (40.0, 75.0),
            (45.0, 100.0),
            (72.0, 125.0),
            (97.0, 150.0),
            (125.0, 175.0),
            (131.0, 200.0),
            (179.0, 225.0),
            (195.0, 250.0),
            (218.0, 275.0),
        ];
        Self::from_observations(
            SEED.iter()
                .map(|&(sensor, reference)| Observation::new(sensor, reference))
                .collect(),
        )
    }

    /// Merge pending observations into a new, normalized dataset.
    ///
    /// The receiver is untouched; retraining installs the merged dataset
    /// only after the new mapping has been fit and persisted. The result is
    /// never smaller than the receiver.
    pub fn merge(&self, pending: &[Observation]) -> Self {
        let mut observations = self.observations.clone();
        observations.extend_from_slice(pending);
        Self::from_observations(observations)
    }

    /// Number of observations in the corpus
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the corpus holds no observations
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Observations in sorted order
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Iterate over observations in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }

    /// Count of distinct sensor values (the fitter needs at least two)
    pub fn distinct_sensor_values(&self) -> usize {
        let mut distinct = 0;
        let mut previous: Option<f64> = None;
        for observation in &self.observations {
            if previous != Some(observation.sensor_value) {
                distinct += 1;
                previous = Some(observation.sensor_value);
            }
        }
        distinct
    }

    /// Sort by (sensor, reference) and drop exact duplicate pairs.
    ///
    /// `total_cmp` keeps the order deterministic for any finite inputs;
    /// non-finite values never reach the dataset (acquisition rejects them).
    fn normalize(&mut self) {
        self.observations.sort_by(|a, b| {
            a.sensor_value
                .total_cmp(&b.sensor_value)
                .then(a.reference_value.total_cmp(&b.reference_value))
        });
        self.observations.dedup();
    }
}
