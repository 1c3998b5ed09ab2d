use crate::domain::models::Snapshot;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::storage::LocalStorage;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const EXPORT_FILE_PREFIX: &str = "focusmate-backup-";

/// Persists the whole application state as one JSON blob under a single key.
#[derive(Clone)]
pub struct SnapshotRepository {
    storage: Arc<dyn LocalStorage>,
    storage_key: String,
}

impl SnapshotRepository {
    pub fn new(storage: Arc<dyn LocalStorage>, storage_key: impl Into<String>) -> Self {
        Self {
            storage,
            storage_key: storage_key.into(),
        }
    }

    /// Absent, unreadable and malformed blobs all load as the default state.
    pub fn load(&self) -> Snapshot {
        let raw = match self.storage.get_item(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Snapshot::default(),
            Err(error) => {
                tracing::warn!(key = %self.storage_key, %error, "failed to read stored state");
                return Snapshot::default();
            }
        };
        match serde_json::from_str::<Snapshot>(&raw) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(
                    key = %self.storage_key,
                    %error,
                    "stored state is malformed; starting fresh"
                );
                Snapshot::default()
            }
        }
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<(), InfraError> {
        let payload = serde_json::to_string(snapshot)?;
        self.storage
            .set_item(&self.storage_key, &payload)
            .map_err(|error| InfraError::Persistence(error.to_string()))
    }

    pub fn clear(&self) -> Result<(), InfraError> {
        self.storage
            .remove_item(&self.storage_key)
            .map_err(|error| InfraError::Persistence(error.to_string()))
    }
}

/// Writes `snapshot` to `<dir>/focusmate-backup-YYYY-MM-DD.json`.
pub fn export_snapshot(
    export_dir: &Path,
    date: NaiveDate,
    snapshot: &Snapshot,
) -> Result<PathBuf, InfraError> {
    fs::create_dir_all(export_dir)?;
    let payload = serde_json::to_string_pretty(snapshot)?;
    let path = export_dir.join(export_file_name(date));
    fs::write(&path, payload)?;
    Ok(path)
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("{EXPORT_FILE_PREFIX}{}.json", date.format("%Y-%m-%d"))
}
