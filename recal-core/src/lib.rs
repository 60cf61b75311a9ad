//! Online calibration engine for recal
//!
//! Continuously corrects a low-cost sensor's raw readings against a trusted
//! reference and periodically refits the correction mapping as new paired
//! observations accumulate.
//!
//! Key guarantees:
//! - Predictions never block on retraining
//! - Snapshots persist atomically; a crash never leaves a mapping paired
//!   with the wrong dataset
//! - Failed retrains keep the previous mapping and retry with the same
//!   observations
//!
//! ```no_run
//! use recal_core::{CalibrationDataset, CalibrationEngine, FileStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileStore::new("calibration.json");
//! let engine = CalibrationEngine::bootstrap(store, CalibrationDataset::bootstrap())?;
//!
//! let corrected = engine.predict(97.0);
//! engine.observe(97.0, corrected);
//! engine.maybe_retrain()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod buffer;
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod fitter;
pub mod mapping;
pub mod store;

// Public API
pub use dataset::{CalibrationDataset, Observation};
pub use engine::{CalibrationEngine, EngineStatus, RetrainOutcome, DEFAULT_RETRAIN_THRESHOLD};
pub use errors::{FitError, RetrainError, StoreError};
pub use mapping::{Interpolant, Mapping, Regression};
pub use store::{CalibrationStore, FileStore, MemoryStore, Snapshot};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
