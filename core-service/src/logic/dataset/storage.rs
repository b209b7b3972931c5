//! CSV persistence for the training dataset

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use crate::logic::features::AnchorSet;
use crate::logic::model::Room;
use super::record::{TrainingDataset, TrainingRow};
use super::RecorderError;

/// Load a persisted dataset, checking its columns against `anchors`.
///
/// Column order in the file is free; values are re-ordered into anchor order.
pub fn read_csv(path: &Path, anchors: &AnchorSet) -> Result<TrainingDataset, RecorderError> {
    if !path.exists() {
        return Err(RecorderError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("dataset file {:?} not found", path),
        )));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let expected = anchors.schema_columns();
    let mismatch = || RecorderError::SchemaMismatch {
        expected: expected.clone(),
        found: headers.clone(),
    };

    let found_set: HashSet<&str> = headers.iter().map(String::as_str).collect();
    let expected_set: HashSet<&str> = expected.iter().map(String::as_str).collect();
    if found_set != expected_set || headers.len() != expected.len() {
        return Err(mismatch());
    }

    // File column for each schema column
    let columns = expected
        .iter()
        .map(|name| headers.iter().position(|h| h == name))
        .collect::<Option<Vec<usize>>>()
        .ok_or_else(mismatch)?;

    let mut dataset = TrainingDataset::new(anchors.clone());
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(index as u64 + 2);
        let field = |col: usize| record.get(columns[col]).unwrap_or("").trim();

        let device_id = field(0).to_string();
        let room: Room = field(1).parse().map_err(|e: crate::logic::model::RoomParseError| {
            RecorderError::Parse {
                line,
                message: e.to_string(),
            }
        })?;

        let features = (2..columns.len())
            .map(|col| {
                field(col).parse::<f64>().map_err(|e| RecorderError::Parse {
                    line,
                    message: format!("column '{}': {}", expected[col], e),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        dataset.push(TrainingRow {
            device_id,
            room,
            features,
        })?;
    }

    Ok(dataset)
}

/// Persist the dataset, replacing any previous file (temp file + rename).
pub fn write_csv(path: &Path, dataset: &TrainingDataset) -> Result<(), RecorderError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)?;
        writer.write_record(dataset.anchors().schema_columns())?;

        for row in dataset.rows() {
            let mut record = Vec::with_capacity(row.features.len() + 2);
            record.push(row.device_id.clone());
            record.push(row.room.as_str().to_string());
            record.extend(row.features.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;

    log::info!("Dataset saved: {} rows -> {:?}", dataset.len(), path);
    Ok(())
}
