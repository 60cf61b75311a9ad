//! Error Types for Fitting, Persistence, and Retraining
//!
//! The taxonomy mirrors the failure domains of the engine:
//!
//! - [`FitError`]: the corpus cannot support a fit. Only reachable with a
//!   degenerate seed corpus, since the dataset never shrinks afterwards -
//!   treated as fatal at startup, never expected at runtime.
//! - [`StoreError`]: snapshot I/O or decode failure. Fatal when it happens
//!   during startup load (there is no fallback state to serve from); during
//!   a retrain it aborts that cycle only, leaving the in-memory model and
//!   the staging buffer untouched for retry.
//! - [`RetrainError`]: wrapper carrying whichever of the above aborted a
//!   retrain cycle, so callers can log one warning without matching on the
//!   inner domain.
//!
//! Acquisition failures are deliberately absent: they belong to the
//! acquisition adapters and never reach the engine as errors - a failed
//! reading is simply "no observation this cycle".

use thiserror::Error;

/// Result type for fitting operations
pub type FitResult<T> = Result<T, FitError>;

/// Fit failures - the corpus cannot produce a valid mapping
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitError {
    /// Interpolation and regression both need at least two distinct
    /// sensor values; duplicate-abscissa pairs count once.
    #[error("insufficient data: need {required} distinct sensor values, have {distinct}")]
    InsufficientData {
        /// Minimum number of distinct sensor values required
        required: usize,
        /// Distinct sensor values actually present
        distinct: usize,
    },
}

/// Snapshot persistence failures
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading, writing, or swapping the snapshot file failed
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The in-memory snapshot could not be encoded
    #[error("snapshot encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The persisted snapshot exists but does not decode
    #[error("snapshot is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
}

/// A retrain cycle was aborted; in-memory state is unchanged
#[derive(Error, Debug)]
pub enum RetrainError {
    /// Refitting the merged corpus failed
    #[error("refit failed: {0}")]
    Fit(#[from] FitError),

    /// The new snapshot could not be persisted; the fitted mapping was
    /// discarded rather than installed without durability
    #[error("persisting new snapshot failed: {0}")]
    Persist(#[from] StoreError),
}
