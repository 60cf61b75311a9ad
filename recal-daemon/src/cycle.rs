//! One Acquisition Cycle
//!
//! The engine is loop-agnostic; this module is the glue the loop runs once
//! per tick. A cycle is deliberately branch-free on error types: either a
//! reading arrived and flows through predict -> report -> observe ->
//! maybe_retrain, or it didn't and the cycle is over. All failure handling
//! lives behind those calls.

use log::{debug, info, warn};
use recal_connectors::AcquisitionSource;
use recal_core::{CalibrationEngine, CalibrationStore, RetrainOutcome};

/// What a single cycle did, for the loop and for tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// The sensor was unavailable; nothing was reported or recorded
    Skipped,
    /// A reading was corrected, reported, and staged
    Processed {
        /// Raw value the sensor delivered
        sensor_value: f64,
        /// Corrected value reported and observed back
        corrected_value: f64,
    },
}

/// Run one cycle: sample, correct, report, stage, maybe retrain
pub fn run_cycle<S: CalibrationStore>(
    engine: &CalibrationEngine<S>,
    source: &mut dyn AcquisitionSource,
) -> CycleOutcome {
    let Some(sensor_value) = source.sample() else {
        return CycleOutcome::Skipped;
    };

    let corrected_value = engine.predict(sensor_value);
    println!("Sensor Value: {sensor_value:.2}, Corrected Value: {corrected_value:.2}");
    engine.observe(sensor_value, corrected_value);

    match engine.maybe_retrain() {
        Ok(RetrainOutcome::Retrained {
            dataset_len,
            absorbed,
        }) => {
            info!("model retrained: corpus grew by {absorbed} to {dataset_len} points");
        }
        Ok(RetrainOutcome::Pending { buffered }) => {
            debug!(
                "{buffered}/{} observations pending until retrain",
                engine.retrain_threshold()
            );
        }
        Err(err) => {
            warn!("retrain failed, keeping previous model: {err}");
        }
    }

    CycleOutcome::Processed {
        sensor_value,
        corrected_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recal_connectors::{AcquisitionError, UnconfiguredSource};
    use recal_core::{CalibrationDataset, MemoryStore};

    /// Source that replays a scripted sequence of readings
    struct ScriptedSource(Vec<Option<f64>>);

    impl AcquisitionSource for ScriptedSource {
        fn try_sample(&mut self) -> Result<f64, AcquisitionError> {
            match self.0.pop() {
                Some(Some(value)) => Ok(value),
                _ => Err(AcquisitionError::Transport("script exhausted".into())),
            }
        }

        fn description(&self) -> &str {
            "scripted"
        }
    }

    fn engine() -> CalibrationEngine<MemoryStore> {
        CalibrationEngine::bootstrap(MemoryStore::new(), CalibrationDataset::bootstrap()).unwrap()
    }

    #[test]
    fn unavailable_sensor_skips_the_cycle_without_side_effects() {
        let engine = engine();
        let mut source = UnconfiguredSource;

        assert_eq!(run_cycle(&engine, &mut source), CycleOutcome::Skipped);
        assert_eq!(engine.pending_observations(), 0);
        assert_eq!(engine.dataset_len(), 10);
    }

    #[test]
    fn a_reading_is_corrected_and_staged() {
        let engine = engine();
        let mut source = ScriptedSource(vec![Some(97.0)]);

        match run_cycle(&engine, &mut source) {
            CycleOutcome::Processed {
                sensor_value,
                corrected_value,
            } => {
                assert_eq!(sensor_value, 97.0);
                assert_eq!(corrected_value, engine.predict(97.0));
            }
            CycleOutcome::Skipped => panic!("reading should have been processed"),
        }
        assert_eq!(engine.pending_observations(), 1);
    }

    #[test]
    fn transient_failures_interleave_with_readings() {
        let engine = engine();
        // Scripts replay from the back: reading, failure, reading
        let mut source = ScriptedSource(vec![Some(99.0), None, Some(97.0)]);

        assert!(matches!(
            run_cycle(&engine, &mut source),
            CycleOutcome::Processed { .. }
        ));
        assert_eq!(run_cycle(&engine, &mut source), CycleOutcome::Skipped);
        assert!(matches!(
            run_cycle(&engine, &mut source),
            CycleOutcome::Processed { .. }
        ));
        assert_eq!(engine.pending_observations(), 2);
    }
}
