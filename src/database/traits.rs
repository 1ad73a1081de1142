//! Database trait definition.
//!
//! Defines the interface the query executor runs SQL through, enabling
//! pluggable database backends.

use crate::core::Table;
use crate::error::QueryError;
use std::fmt;

/// SQL dialect spoken by a backend.
///
/// The SQL-generation prompt is worded for the dialect of the connected
/// database so that the model's output runs without edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `PostgreSQL`.
    #[default]
    Postgres,
    /// `SQLite` 3.
    Sqlite,
}

impl Dialect {
    /// Human-readable dialect name used in prompts.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Postgres => "PostgreSQL",
            Self::Sqlite => "SQLite",
        }
    }

    /// Example of a case-insensitive substring filter in this dialect.
    #[must_use]
    pub const fn substring_filter_example(self) -> &'static str {
        match self {
            Self::Postgres => "cb.occupation ILIKE '%teacher%'",
            Self::Sqlite => "LOWER(cb.occupation) LIKE '%teacher%'",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait for database backends.
///
/// Implementations own one live connection. Every call is its own unit of
/// work: no transactions are opened or held across calls.
pub trait Database: Send {
    /// Returns the backend's SQL dialect.
    fn dialect(&self) -> Dialect;

    /// Runs a query and collects its result set.
    ///
    /// Statements that return no rows produce a table without rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] if the database rejects or fails the
    /// statement.
    fn query(&mut self, sql: &str) -> Result<Table, QueryError>;

    /// Runs one or more statements, discarding any rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] if any statement fails.
    fn execute_batch(&mut self, sql: &str) -> Result<(), QueryError>;
}
