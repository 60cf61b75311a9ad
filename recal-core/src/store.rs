//! Snapshot Persistence with Atomic Swap
//!
//! ## Consistency Contract
//!
//! The store persists the current mapping together with the dataset it was
//! fit from, as one snapshot. The two must never be observable apart: a
//! loader must never see a mapping fit from dataset v2 paired with dataset
//! v1, and never a half-written file. [`FileStore`] guarantees this by
//! writing every save to a scratch file beside the canonical path and then
//! renaming it into place - the rename is the single atomic step. A crash
//! before it leaves the old snapshot intact; a crash after it leaves the
//! new one complete.
//!
//! ```text
//! save(snapshot)
//!   ├── serialize  -> calibration.tmp      (old snapshot still canonical)
//!   ├── sync                               (bytes durable before the swap)
//!   └── rename     -> calibration.json     <- the only commit point
//! ```
//!
//! Load failures are typed so callers can tell "nothing persisted yet"
//! (seed and start fresh) from "persisted but corrupt" (fatal, no
//! fallback).
//!
//! [`MemoryStore`] backs the same trait with process memory, for engines
//! embedded in tests or hosts that manage durability themselves.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::dataset::CalibrationDataset;
use crate::errors::StoreError;
use crate::mapping::Mapping;

/// One persisted unit: a mapping and the dataset it was fit from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The fitted mapping
    pub mapping: Mapping,
    /// The corpus the mapping was fit from
    pub dataset: CalibrationDataset,
}

/// Persistence seam for calibration snapshots.
///
/// A trait rather than a concrete type so retrain failure paths can be
/// exercised with injected store failures.
pub trait CalibrationStore {
    /// Load the current snapshot
    fn load(&self) -> Result<Snapshot, StoreError>;

    /// Persist a snapshot; on return the snapshot is the one `load` sees
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// File-backed store: JSON snapshot, scratch-file write, atomic rename
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store over the given canonical path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The canonical snapshot path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a snapshot has ever been persisted here
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn scratch_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

impl CalibrationStore for FileStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(StoreError::Corrupt)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let scratch = self.scratch_path();
        let file = File::create(&scratch)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, snapshot).map_err(StoreError::Encode)?;
        writer.flush()?;
        // Make the scratch contents durable before they can become canonical
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;

        fs::rename(&scratch, &self.path)?;
        Ok(())
    }
}

/// Memory-backed store for embedded and test use
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<Snapshot>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl CalibrationStore for MemoryStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        self.snapshot
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| StoreError::Io(std::io::Error::from(std::io::ErrorKind::NotFound)))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.snapshot.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }
}
