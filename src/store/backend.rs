//! Persistence backends for the settings store.
//!
//! A backend is a flat key/value mapping of JSON values. The SQLite backend
//! persists to a single `settings` table with an inline migration; the memory
//! backend is the last-resort scope for disconnected/dev environments.

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::scope::ScopeKind;

/// Store error types.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("migration error: {0}")]
    Migration(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("scope health check failed: {0}")]
    HealthCheck(String),
}

/// A key-addressed persistence scope.
///
/// Implementations must be cheap to call from async handlers (local I/O
/// only) and safe to share behind an `Arc`.
pub trait StoreBackend: Send + Sync {
    fn kind(&self) -> ScopeKind;

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError>;

    /// Insert only if the key is absent. Returns whether a write happened.
    ///
    /// This is the hydration primitive: concurrent hydration calls, or an
    /// operator write racing hydration, must never clobber an existing value.
    fn set_if_absent(&self, key: &str, value: &Value) -> Result<bool, StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Number of persisted keys, for the status surface.
    fn count(&self) -> Result<i64, StoreError>;
}

/// Thread-safe SQLite-backed scope.
#[derive(Clone)]
pub struct SqliteBackend {
    kind: ScopeKind,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open (or create) the database at `path` and run migrations.
    pub fn open<P: AsRef<Path>>(kind: ScopeKind, path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let backend = Self {
            kind,
            conn: Arc::new(Mutex::new(conn)),
        };
        backend.init()?;
        Ok(backend)
    }

    fn init(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(include_str!("../../migrations/000001_init.up.sql"))
            .map_err(|e| StoreError::Migration(format!("Migration 1 failed: {}", e)))?;
        Ok(())
    }
}

impl StoreBackend for SqliteBackend {
    fn kind(&self) -> ScopeKind {
        self.kind
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let text = serde_json::to_string(value)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, text],
        )?;
        Ok(())
    }

    fn set_if_absent(&self, key: &str, value: &Value) -> Result<bool, StoreError> {
        let text = serde_json::to_string(value)?;
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, text],
        )?;
        Ok(inserted > 0)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn count(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row("SELECT COUNT(*) FROM settings", [], |r| r.get(0))?)
    }
}

/// Non-persistent in-memory scope.
#[derive(Default)]
pub struct MemoryBackend {
    map: Mutex<HashMap<String, Value>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for MemoryBackend {
    fn kind(&self) -> ScopeKind {
        ScopeKind::Memory
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    fn set_if_absent(&self, key: &str, value: &Value) -> Result<bool, StoreError> {
        let mut map = self.map.lock().unwrap();
        if map.contains_key(key) {
            return Ok(false);
        }
        map.insert(key.to_string(), value.clone());
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.map.lock().unwrap().remove(key);
        Ok(())
    }

    fn count(&self) -> Result<i64, StoreError> {
        Ok(self.map.lock().unwrap().len() as i64)
    }
}
