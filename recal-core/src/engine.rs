//! Online Calibration Engine
//!
//! ## Overview
//!
//! The engine is the sole owner of the calibration state triple - current
//! mapping, corpus, staging buffer - and the only component allowed to
//! mutate it. Everything flows through three operations:
//!
//! ```text
//! raw reading ──> predict ──> corrected value ──> observe ──> buffer
//!                    │                                          │
//!                    │                            threshold crossed?
//!                    │                                          │
//!                    └────────── new mapping <── maybe_retrain ─┘
//!                                (merge + fit + persist + swap)
//! ```
//!
//! ## States
//!
//! `READY -> RETRAINING -> READY`. There is no terminal state; the engine
//! runs for the process lifetime. A failed retrain returns to `READY` with
//! the previous mapping still installed and the buffer untouched, so the
//! same observations are retried at the next threshold crossing.
//!
//! ## Concurrency
//!
//! One mutex guards the corpus and the buffer; the current mapping lives
//! behind its own lock as an `Arc` snapshot. `predict` clones the `Arc`
//! under a briefly-held lock and evaluates outside it, so readers are never
//! blocked by a retrain in progress - they answer from the most recently
//! installed mapping until the swap. Retraining holds the state lock for
//! the whole cycle, which makes "at most one retrain in flight" structural
//! rather than a convention. Retraining is synchronous and bounded by
//! corpus size; there is no cancellation and no timeout.
//!
//! ## Durability Ordering
//!
//! On retrain, the new snapshot is persisted *before* the in-memory swap.
//! A crash between persist and swap re-serves the new mapping after
//! restart; a crash before persist leaves the old snapshot intact. At no
//! point can a prediction be computed against state that a restart would
//! not reproduce or roll back to.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::debug;

use crate::buffer::ObservationBuffer;
use crate::dataset::{CalibrationDataset, Observation};
use crate::errors::RetrainError;
use crate::fitter;
use crate::mapping::Mapping;
use crate::store::{CalibrationStore, Snapshot};

/// Pending observations required before a retrain cycle fires
pub const DEFAULT_RETRAIN_THRESHOLD: usize = 10;

/// Engine state as visible to concurrent observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Serving predictions, accepting observations
    Ready,
    /// A retrain cycle (fit + persist) is in flight
    Retraining,
}

/// What `maybe_retrain` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrainOutcome {
    /// Below threshold; nothing was fit, saved, or cleared
    Pending {
        /// Observations currently staged
        buffered: usize,
    },
    /// A new mapping was fit, persisted, and installed
    Retrained {
        /// Corpus size after the merge
        dataset_len: usize,
        /// Points the corpus grew by (buffered minus duplicates)
        absorbed: usize,
    },
}

/// Corpus and staging buffer, mutated together under one lock
struct EngineState {
    dataset: CalibrationDataset,
    buffer: ObservationBuffer,
}

/// The online calibration engine.
///
/// Generic over its [`CalibrationStore`] so durability is a seam, not a
/// hard-wired file.
pub struct CalibrationEngine<S: CalibrationStore> {
    store: S,
    retrain_threshold: usize,
    mapping: Mutex<Arc<Mapping>>,
    state: Mutex<EngineState>,
    retraining: AtomicBool,
}

impl<S: CalibrationStore> CalibrationEngine<S> {
    /// Resume from the snapshot the store currently holds.
    ///
    /// # Errors
    /// Propagates the store's load failure; a missing or corrupt snapshot
    /// is fatal at startup, there is no fallback state to serve from.
    pub fn from_store(store: S) -> Result<Self, crate::errors::StoreError> {
        let snapshot = store.load()?;
        Ok(Self::with_snapshot(store, snapshot))
    }

    /// Start fresh: fit the seed corpus, persist it, and serve from it.
    ///
    /// Bootstrap shares the retrain failure domain - a corpus that cannot
    /// fit or a store that cannot save means there is nothing to serve.
    pub fn bootstrap(store: S, corpus: CalibrationDataset) -> Result<Self, RetrainError> {
        let mapping = fitter::fit(&corpus)?;
        let snapshot = Snapshot {
            mapping,
            dataset: corpus,
        };
        store.save(&snapshot)?;
        Ok(Self::with_snapshot(store, snapshot))
    }

    fn with_snapshot(store: S, snapshot: Snapshot) -> Self {
        Self {
            store,
            retrain_threshold: DEFAULT_RETRAIN_THRESHOLD,
            mapping: Mutex::new(Arc::new(snapshot.mapping)),
            state: Mutex::new(EngineState {
                dataset: snapshot.dataset,
                buffer: ObservationBuffer::new(),
            }),
            retraining: AtomicBool::new(false),
        }
    }

    /// Replace the retrain threshold (pending observations per cycle)
    pub fn with_retrain_threshold(mut self, threshold: usize) -> Self {
        self.retrain_threshold = threshold.max(1);
        self
    }

    /// Correct a raw sensor value against the current mapping.
    ///
    /// Rounded to two decimal places for external reporting. Never blocks
    /// on a retrain in progress: the mapping is snapshotted under a
    /// briefly-held lock and evaluated outside it.
    pub fn predict(&self, sensor_value: f64) -> f64 {
        let mapping = Arc::clone(&self.mapping.lock().unwrap());
        round_to_cents(mapping.correct(sensor_value))
    }

    /// Stage one observation for the next retrain cycle.
    ///
    /// The reference value may be the engine's own corrected output when no
    /// independent reference measurement is available; such self-referential
    /// pairs are accepted as-is.
    pub fn observe(&self, sensor_value: f64, corrected_value: f64) {
        let mut state = self.state.lock().unwrap();
        state
            .buffer
            .push(Observation::new(sensor_value, corrected_value));
    }

    /// Retrain if the buffer has reached the threshold.
    ///
    /// Below threshold this is a strict no-op. At or above: merge the
    /// buffer into the corpus (sort + dedupe), fit, persist, swap the live
    /// mapping, clear the buffer - in that order.
    ///
    /// # Errors
    /// On fit or persist failure the cycle aborts with every piece of
    /// in-memory state unchanged: the previous mapping keeps serving and
    /// the buffer keeps its observations for the next crossing.
    pub fn maybe_retrain(&self) -> Result<RetrainOutcome, RetrainError> {
        let mut state = self.state.lock().unwrap();
        let buffered = state.buffer.len();
        if buffered < self.retrain_threshold {
            return Ok(RetrainOutcome::Pending { buffered });
        }

        self.retraining.store(true, Ordering::SeqCst);
        let result = self.retrain(&mut state);
        self.retraining.store(false, Ordering::SeqCst);
        result
    }

    fn retrain(&self, state: &mut EngineState) -> Result<RetrainOutcome, RetrainError> {
        debug!(
            "retraining: merging {} pending observations into corpus of {}",
            state.buffer.len(),
            state.dataset.len()
        );

        let updated = state.dataset.merge(state.buffer.as_slice());
        let mapping = fitter::fit(&updated)?;
        self.store.save(&Snapshot {
            mapping: mapping.clone(),
            dataset: updated.clone(),
        })?;

        // Persisted; only now does in-memory state move to the new snapshot
        let absorbed = updated.len() - state.dataset.len();
        let dataset_len = updated.len();
        *self.mapping.lock().unwrap() = Arc::new(mapping);
        state.dataset = updated;
        state.buffer.clear();

        Ok(RetrainOutcome::Retrained {
            dataset_len,
            absorbed,
        })
    }

    /// Current engine state
    pub fn status(&self) -> EngineStatus {
        if self.retraining.load(Ordering::SeqCst) {
            EngineStatus::Retraining
        } else {
            EngineStatus::Ready
        }
    }

    /// The configured retrain threshold
    pub fn retrain_threshold(&self) -> usize {
        self.retrain_threshold
    }

    /// Observations staged for the next retrain cycle
    pub fn pending_observations(&self) -> usize {
        self.state.lock().unwrap().buffer.len()
    }

    /// Size of the corpus the current mapping was fit from
    pub fn dataset_len(&self) -> usize {
        self.state.lock().unwrap().dataset.len()
    }

    /// Snapshot of the currently installed mapping
    pub fn mapping(&self) -> Arc<Mapping> {
        Arc::clone(&self.mapping.lock().unwrap())
    }
}

/// Round to two decimal places, the precision of the reporting surface
fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
