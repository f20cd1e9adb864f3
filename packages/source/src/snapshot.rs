//! JSON snapshot I/O.
//!
//! The CLI writes normalized records and precomputed hotspot summaries to
//! JSON files; the server loads them once at startup.

use std::path::Path;

use collision_map_collision_models::IncidentRecord;
use collision_map_hotspots_models::HotspotSummary;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::SourceError;

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
    let data = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}

/// Loads a records snapshot (a JSON array of [`IncidentRecord`]s).
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be read or
/// [`SourceError::Json`] if it is not a valid record array.
pub fn load_records(path: &Path) -> Result<Vec<IncidentRecord>, SourceError> {
    let records: Vec<IncidentRecord> = load_json(path)?;
    log::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Loads a hotspot summaries snapshot.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be read or
/// [`SourceError::Json`] if it is not a valid summary array.
pub fn load_summaries(path: &Path) -> Result<Vec<HotspotSummary>, SourceError> {
    let summaries: Vec<HotspotSummary> = load_json(path)?;
    log::info!(
        "Loaded {} hotspot summaries from {}",
        summaries.len(),
        path.display()
    );
    Ok(summaries)
}

/// Serializes `value` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`SourceError`] if serialization or file I/O fails.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), SourceError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(value)?;
    std::fs::write(path, json)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_survive_a_write_and_load() {
        let dir = std::env::temp_dir().join("collision_map_snapshot_records");
        let path = dir.join("nested").join("collisions.json");

        let mut record = IncidentRecord::new(7);
        record.borough = Some("QUEENS".to_string());
        record.latitude = Some(40.72);
        record.longitude = Some(-73.84);
        write_json(&path, &[record.clone()]).unwrap();

        let loaded = load_records(&path).unwrap();
        assert_eq!(loaded, vec![record]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("collision_map_snapshot_missing.json");
        assert!(matches!(load_summaries(&path), Err(SourceError::Io(_))));
    }

    #[test]
    fn malformed_file_is_a_json_error() {
        let dir = std::env::temp_dir().join("collision_map_snapshot_malformed");
        let path = dir.join("hotspots.json");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(load_summaries(&path), Err(SourceError::Json(_))));

        std::fs::remove_dir_all(&dir).ok();
    }
}
