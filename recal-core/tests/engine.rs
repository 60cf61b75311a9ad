//! Integration tests for the calibration engine
//!
//! Covers the retrain cycle end to end: threshold gating, monotone corpus
//! growth, durability ordering, and failure isolation when the store or the
//! fitter rejects a cycle.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use recal_core::{
    CalibrationDataset, CalibrationEngine, CalibrationStore, FileStore, MemoryStore, Observation,
    RetrainOutcome, Snapshot, StoreError,
};

/// Store that counts saves and can be switched into a failing mode
struct FlakyStore {
    inner: MemoryStore,
    saves: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl FlakyStore {
    fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let saves = Arc::new(AtomicUsize::new(0));
        let failing = Arc::new(AtomicBool::new(false));
        (
            Self {
                inner: MemoryStore::new(),
                saves: Arc::clone(&saves),
                failing: Arc::clone(&failing),
            },
            saves,
            failing,
        )
    }
}

impl CalibrationStore for FlakyStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        self.inner.load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(snapshot)
    }
}

fn staircase_corpus() -> CalibrationDataset {
    CalibrationDataset::from_observations(vec![
        Observation::new(50.0, 50.0),
        Observation::new(100.0, 100.0),
        Observation::new(150.0, 150.0),
    ])
}

#[test]
fn interpolates_between_corpus_points() {
    let engine = CalibrationEngine::bootstrap(MemoryStore::new(), staircase_corpus()).unwrap();
    assert_eq!(engine.predict(75.0), 75.00);
}

#[test]
fn extrapolates_beyond_the_corpus_instead_of_clamping() {
    let engine = CalibrationEngine::bootstrap(MemoryStore::new(), staircase_corpus()).unwrap();
    // Edge segment slope is 1.0, so 200 maps to 200, not to the last knot
    assert_eq!(engine.predict(200.0), 200.00);
    assert_ne!(engine.predict(200.0), 150.00);
}

#[test]
fn below_threshold_is_a_strict_noop() {
    let (store, saves, _) = FlakyStore::new();
    let engine = CalibrationEngine::bootstrap(store, CalibrationDataset::bootstrap())
        .unwrap()
        .with_retrain_threshold(10);

    for i in 0..9 {
        engine.observe(60.0 + f64::from(i), 110.0 + f64::from(i));
    }
    let outcome = engine.maybe_retrain().unwrap();

    assert_eq!(outcome, RetrainOutcome::Pending { buffered: 9 });
    assert_eq!(engine.pending_observations(), 9, "buffer must be untouched");
    assert_eq!(saves.load(Ordering::SeqCst), 1, "only the bootstrap save");
}

#[test]
fn crossing_the_threshold_fits_saves_and_clears_exactly_once() {
    let (store, saves, _) = FlakyStore::new();
    let engine = CalibrationEngine::bootstrap(store, CalibrationDataset::bootstrap())
        .unwrap()
        .with_retrain_threshold(10);

    for i in 0..10 {
        engine.observe(300.0 + f64::from(i), 310.0 + f64::from(i));
    }
    let outcome = engine.maybe_retrain().unwrap();

    assert_eq!(
        outcome,
        RetrainOutcome::Retrained {
            dataset_len: 20,
            absorbed: 10,
        }
    );
    assert_eq!(engine.pending_observations(), 0);
    assert_eq!(saves.load(Ordering::SeqCst), 2);
}

#[test]
fn corpus_growth_is_monotone_modulo_duplicates() {
    let engine = CalibrationEngine::bootstrap(MemoryStore::new(), CalibrationDataset::bootstrap())
        .unwrap()
        .with_retrain_threshold(3);
    let old_len = engine.dataset_len();

    // Two new pairs plus an exact duplicate of a seed pair
    engine.observe(400.0, 410.0);
    engine.observe(401.0, 411.0);
    engine.observe(45.0, 100.0);

    match engine.maybe_retrain().unwrap() {
        RetrainOutcome::Retrained {
            dataset_len,
            absorbed,
        } => {
            assert_eq!(absorbed, 2);
            assert_eq!(dataset_len, old_len + 2);
            assert!(dataset_len >= old_len);
        }
        other => panic!("expected a retrain, got {other:?}"),
    }
}

#[test]
fn store_failure_keeps_the_old_mapping_and_the_buffer() {
    let (store, _, failing) = FlakyStore::new();
    let engine = CalibrationEngine::bootstrap(store, CalibrationDataset::bootstrap())
        .unwrap()
        .with_retrain_threshold(2);

    let before = engine.predict(97.0);

    failing.store(true, Ordering::SeqCst);
    engine.observe(300.0, 310.0);
    engine.observe(301.0, 311.0);
    let err = engine.maybe_retrain().unwrap_err();
    assert!(matches!(err, recal_core::RetrainError::Persist(_)));

    // Old mapping still serves, observations still staged for retry
    assert_eq!(engine.predict(97.0), before);
    assert_eq!(engine.pending_observations(), 2);
    assert_eq!(engine.dataset_len(), 10);

    // Once the store heals, the very same observations retrain cleanly
    failing.store(false, Ordering::SeqCst);
    assert!(matches!(
        engine.maybe_retrain().unwrap(),
        RetrainOutcome::Retrained {
            dataset_len: 12,
            absorbed: 2,
        }
    ));
    assert_eq!(engine.pending_observations(), 0);
}

#[test]
fn self_referential_observations_are_accepted_and_absorbed() {
    // No independent reference during live operation: the corrected output
    // itself is recorded as the reference. This is the system's actual
    // behavior, asserted as such.
    let engine = CalibrationEngine::bootstrap(MemoryStore::new(), CalibrationDataset::bootstrap())
        .unwrap()
        .with_retrain_threshold(2);

    for raw in [88.0, 89.0] {
        let corrected = engine.predict(raw);
        engine.observe(raw, corrected);
    }
    assert!(matches!(
        engine.maybe_retrain().unwrap(),
        RetrainOutcome::Retrained { .. }
    ));
    assert_eq!(engine.dataset_len(), 12);
}

#[test]
fn restart_resumes_from_the_persisted_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calibration.json");

    let engine = CalibrationEngine::bootstrap(
        FileStore::new(&path),
        CalibrationDataset::bootstrap(),
    )
    .unwrap()
    .with_retrain_threshold(2);
    engine.observe(300.0, 310.0);
    engine.observe(301.0, 311.0);
    engine.maybe_retrain().unwrap();
    let before = engine.predict(305.0);
    drop(engine);

    let resumed = CalibrationEngine::from_store(FileStore::new(&path)).unwrap();
    assert_eq!(resumed.dataset_len(), 12);
    assert_eq!(resumed.predict(305.0), before);
}

#[test]
fn missing_snapshot_is_fatal_on_resume() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("absent.json"));
    assert!(CalibrationEngine::from_store(store).is_err());
}
