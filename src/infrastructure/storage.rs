use crate::infrastructure::error::InfraError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

pub fn initialize_database(path: &Path) -> Result<(), InfraError> {
    let connection = Connection::open(path)?;
    connection.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// String key-value store with browser local-storage semantics.
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, InfraError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), InfraError>;
    fn remove_item(&self, key: &str) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct SqliteLocalStorage {
    db_path: PathBuf,
}

impl SqliteLocalStorage {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, InfraError> {
        Connection::open(&self.db_path).map_err(InfraError::from)
    }
}

impl LocalStorage for SqliteLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, InfraError> {
        let connection = self.connect()?;
        let value = connection
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), InfraError> {
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO local_storage (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), InfraError> {
        let connection = self.connect()?;
        connection.execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLocalStorage {
    items: Mutex<HashMap<String, String>>,
}

impl InMemoryLocalStorage {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, InfraError> {
        self.items.lock().map_err(|error| {
            InfraError::Persistence(format!("local storage lock poisoned: {error}"))
        })
    }
}

impl LocalStorage for InMemoryLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, InfraError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), InfraError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), InfraError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_DB: AtomicUsize = AtomicUsize::new(0);

    fn temp_db() -> PathBuf {
        let sequence = NEXT_DB.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "focusmate-storage-tests-{}-{}",
            std::process::id(),
            sequence
        ));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir.join("focusmate.sqlite")
    }

    #[test]
    fn sqlite_storage_replaces_and_removes_values() {
        let path = temp_db();
        initialize_database(&path).expect("init schema");
        let storage = SqliteLocalStorage::new(&path);

        assert_eq!(storage.get_item("focusMateData").expect("get"), None);
        storage.set_item("focusMateData", "{\"a\":1}").expect("set");
        storage.set_item("focusMateData", "{\"a\":2}").expect("replace");
        assert_eq!(
            storage.get_item("focusMateData").expect("get"),
            Some("{\"a\":2}".to_string())
        );

        storage.remove_item("focusMateData").expect("remove");
        assert_eq!(storage.get_item("focusMateData").expect("get"), None);
        let _ = fs::remove_dir_all(path.parent().expect("parent"));
    }

    #[test]
    fn sqlite_storage_without_schema_reports_error() {
        let path = temp_db();
        let storage = SqliteLocalStorage::new(&path);
        assert!(storage.set_item("k", "v").is_err());
        let _ = fs::remove_dir_all(path.parent().expect("parent"));
    }

    #[test]
    fn in_memory_storage_roundtrip() {
        let storage = InMemoryLocalStorage::default();
        storage.set_item("k", "v").expect("set");
        assert_eq!(storage.get_item("k").expect("get"), Some("v".to_string()));
        storage.remove_item("k").expect("remove");
        storage.remove_item("k").expect("remove twice");
        assert_eq!(storage.get_item("k").expect("get"), None);
    }
}
