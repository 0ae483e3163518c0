//! SQLite-backed key-value store.

mod helpers;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::kv::KeyValueStore;
use crate::migrations;

/// Database connection wrapper
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Create a new database connection
    ///
    /// # Errors
    ///
    /// Returns an error if database directory creation, connection opening, or schema initialization fails
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = db_path.unwrap_or_else(Self::default_db_path);

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let conn = Connection::open(&path).context("Failed to open database connection")?;
        migrations::init_schema(&conn)?;

        log::info!("Database initialized at: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a database that lives only as long as this value
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened or the schema cannot be created
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        migrations::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get default database path
    fn default_db_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("ruhezeit");
        path.push("ruhezeit.db");
        path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }

    /// Read the JSON document stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored text is not valid JSON
    pub fn get_value(&self, key: &str) -> Result<Option<Value>> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                helpers::parse_json(&row.get::<_, String>(0)?)
            })
            .optional()?;
        Ok(value)
    }

    /// Insert or replace the JSON document stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub fn set_value(&self, key: &str, value: &Value) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.conn()?.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, text, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Delete `key`, returning whether it existed
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub fn remove_value(&self, key: &str) -> Result<bool> {
        let deleted = self
            .conn()?
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.get_value(key)
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.set_value(key, &value)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.remove_value(key).map(|_| ())
    }
}
