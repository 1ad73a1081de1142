//! Query execution with failure normalization.
//!
//! The executor owns the process's single database connection (if one was
//! established) and is the boundary past which SQL errors never travel:
//! [`QueryExecutor::execute`] always hands back a [`Table`].

use crate::core::Table;
use crate::database::traits::{Database, Dialect};
use crate::error::QueryError;
use tracing::{debug, error, warn};

/// Runs generated SQL against the open connection.
pub struct QueryExecutor {
    connection: Option<Box<dyn Database>>,
}

impl QueryExecutor {
    /// Creates an executor over an open connection.
    #[must_use]
    pub fn new(connection: Box<dyn Database>) -> Self {
        Self {
            connection: Some(connection),
        }
    }

    /// Creates an executor with no connection.
    ///
    /// Every execution short-circuits with [`QueryError::NotConnected`].
    #[must_use]
    pub fn disconnected() -> Self {
        Self { connection: None }
    }

    /// Returns true if a connection handle is held.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Dialect of the connected backend, `PostgreSQL` when disconnected.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.connection
            .as_ref()
            .map_or_else(Dialect::default, |db| db.dialect())
    }

    /// Executes `sql` and returns the typed outcome.
    ///
    /// The statement is passed to the database verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NotConnected`] without attempting execution when
    /// no connection is held, otherwise whatever the backend reports.
    pub fn run(&mut self, sql: &str) -> Result<Table, QueryError> {
        let Some(db) = self.connection.as_mut() else {
            return Err(QueryError::NotConnected);
        };

        debug!(sql_len = sql.len(), "executing query");
        let table = db.query(sql)?;
        debug!(rows = table.row_count(), columns = table.column_count(), "query complete");
        Ok(table)
    }

    /// Executes `sql`, converting any failure into an empty table.
    ///
    /// Failures are logged; a failed query is indistinguishable from one that
    /// returned no rows. Use [`QueryExecutor::run`] to tell them apart.
    pub fn execute(&mut self, sql: &str) -> Table {
        self.run(sql).unwrap_or_else(|err| {
            log_failure(&err);
            Table::empty()
        })
    }

    /// Runs DDL or other statements that return no rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NotConnected`] or the backend's error.
    pub fn execute_batch(&mut self, sql: &str) -> Result<(), QueryError> {
        let Some(db) = self.connection.as_mut() else {
            return Err(QueryError::NotConnected);
        };
        db.execute_batch(sql)
    }
}

/// Logs a query failure at the level matching its cause.
pub fn log_failure(err: &QueryError) {
    match err {
        QueryError::NotConnected => {
            warn!("query skipped: database connection not established");
        }
        other => error!(error = %other, "SQL execution failed"),
    }
}
