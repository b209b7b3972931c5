//! Training Data Recorder
//!
//! Owns the in-memory dataset shared by every gathering device. Appends come
//! from the ingestion pipeline; training reads a snapshot.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;

use crate::logic::features::AnchorSet;
use super::record::{TrainingDataset, TrainingRow};
use super::storage;
use super::RecorderError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderStatus {
    pub active: bool,
    pub rows: usize,
    pub path: PathBuf,
}

pub struct TrainingDataRecorder {
    anchors: AnchorSet,
    path: PathBuf,
    active: Mutex<Option<TrainingDataset>>,
}

impl TrainingDataRecorder {
    pub fn new(anchors: AnchorSet, path: impl Into<PathBuf>) -> Self {
        Self {
            anchors,
            path: path.into(),
            active: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Discard any persisted dataset and begin an empty one
    pub fn start_new(&self) -> Result<(), RecorderError> {
        self.remove_persisted()?;
        *self.active.lock() = Some(TrainingDataset::new(self.anchors.clone()));
        log::info!("Gathering: new dataset ({} anchors)", self.anchors.len());
        Ok(())
    }

    /// Resume from the persisted dataset. Fails with `SchemaMismatch` when
    /// its columns differ from the live anchor schema.
    pub fn start_append(&self) -> Result<usize, RecorderError> {
        let dataset = storage::read_csv(&self.path, &self.anchors)?;
        let rows = dataset.len();
        *self.active.lock() = Some(dataset);
        log::info!("Gathering: appending to {} persisted rows", rows);
        Ok(rows)
    }

    /// Append one row; returns the new row count
    pub fn append(&self, row: TrainingRow) -> Result<usize, RecorderError> {
        let mut guard = self.active.lock();
        let dataset = guard.as_mut().ok_or(RecorderError::NotGathering)?;
        dataset.push(row)?;
        Ok(dataset.len())
    }

    /// Persist the in-memory dataset, replacing the previous file.
    /// The dataset stays active for other gathering devices.
    pub fn stop(&self) -> Result<usize, RecorderError> {
        let snapshot = self.snapshot().ok_or(RecorderError::NotGathering)?;
        storage::write_csv(&self.path, &snapshot)?;
        Ok(snapshot.len())
    }

    /// Delete the persisted file; `Ok(false)` if there was none
    pub fn remove_persisted(&self) -> Result<bool, RecorderError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::info!("Removed persisted dataset {:?}", self.path);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Copy of the in-memory dataset, if gathering was ever started
    pub fn snapshot(&self) -> Option<TrainingDataset> {
        self.active.lock().clone()
    }

    pub fn load_persisted(&self) -> Result<TrainingDataset, RecorderError> {
        storage::read_csv(&self.path, &self.anchors)
    }

    pub fn row_count(&self) -> usize {
        self.active.lock().as_ref().map_or(0, TrainingDataset::len)
    }

    pub fn status(&self) -> RecorderStatus {
        let guard = self.active.lock();
        RecorderStatus {
            active: guard.is_some(),
            rows: guard.as_ref().map_or(0, TrainingDataset::len),
            path: self.path.clone(),
        }
    }
}
