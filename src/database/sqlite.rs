//! `SQLite` database backend.
//!
//! Runs queries against a local `SQLite` file. Used for offline work against
//! an extract of the contribution data, and throughout the test suite.

use crate::core::{Table, Value};
use crate::database::traits::{Database, Dialect};
use crate::error::{ConnectionError, QueryError};
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use std::path::{Path, PathBuf};

/// SQLite-based database backend.
///
/// # Examples
///
/// ```no_run
/// use contrib_qa::database::{Database, SqliteDatabase};
///
/// let mut db = SqliteDatabase::open("contributions.db").unwrap();
/// let table = db.query("SELECT COUNT(*) AS n FROM contributions").unwrap();
/// ```
pub struct SqliteDatabase {
    /// `SQLite` connection.
    conn: Connection,
    /// Path to the database file (None for in-memory).
    path: Option<PathBuf>,
}

impl SqliteDatabase {
    /// Opens or creates a `SQLite` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ConnectionError> {
        let path = path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| failed(&e))?;
        }

        let conn = Connection::open(&path).map_err(|e| failed(&e))?;

        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(|e| failed(&e))?;

        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Creates an in-memory `SQLite` database.
    ///
    /// Useful for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self, ConnectionError> {
        let conn = Connection::open_in_memory().map_err(|e| failed(&e))?;
        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(|e| failed(&e))?;

        Ok(Self { conn, path: None })
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn failed(err: &dyn std::fmt::Display) -> ConnectionError {
    ConnectionError::Failed {
        backend: "sqlite",
        reason: err.to_string(),
    }
}

/// Converts one cell.
///
/// TEXT cells that are not valid UTF-8 (Latin-1 names in older extracts)
/// are decoded lossily so the rest of the row set survives.
fn cell_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Int(n),
        ValueRef::Real(x) => Value::Float(x),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

impl Database for SqliteDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn query(&mut self, sql: &str) -> Result<Table, QueryError> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = stmt.query([])?;
        let mut collected = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..columns.len())
                .map(|i| row.get_ref(i).map(cell_value))
                .collect::<Result<Vec<_>, _>>()?;
            collected.push(values);
        }

        Ok(Table::new(columns, collected))
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), QueryError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}
