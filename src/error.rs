//! Error types for contrib-qa operations.
//!
//! This module provides the error hierarchy using `thiserror` for the
//! question-answering pipeline: credentials, database connections, model
//! invocations, query execution, and CLI commands.
//!
//! Model and query errors never escape the pipeline's sentinel boundaries
//! ([`ModelClient::invoke`](crate::model::ModelClient::invoke) and
//! [`QueryExecutor::execute`](crate::database::QueryExecutor::execute)); the
//! typed variants exist for callers that need the cause.

use thiserror::Error;

/// Result type alias for contrib-qa operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// A required API credential is absent. Halts startup.
    #[error("missing credential: {variable} is not set")]
    CredentialMissing {
        /// Environment variable that should hold the credential.
        variable: &'static str,
    },

    /// Database connection could not be established.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Model invocation failed after exhausting the retry budget.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// SQL execution failed.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// I/O errors (stdin, stdout).
    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors raised while opening the database connection.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// A connection setting required by the backend is absent.
    #[error("{variable} is not set")]
    MissingSetting {
        /// Environment variable (or flag) that should hold the setting.
        variable: &'static str,
    },

    /// The backend refused or failed the connection attempt.
    #[error("failed to connect to {backend}: {reason}")]
    Failed {
        /// Backend name (`postgres`, `sqlite`).
        backend: &'static str,
        /// Driver error message.
        reason: String,
    },

    /// The requested backend was compiled out.
    #[error("{backend} support is not enabled in this build")]
    Unsupported {
        /// Backend name.
        backend: &'static str,
    },
}

/// Errors from a single model invocation attempt.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Network or transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The model service answered with an error status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message reported by the service.
        message: String,
    },

    /// The response body did not match any known shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The response carried no usable text.
    #[error("response contained no text output")]
    EmptyOutput,
}

/// Errors from executing SQL against the database.
#[derive(Error, Debug)]
pub enum QueryError {
    /// No connection handle is held; execution was not attempted.
    #[error("database connection not established")]
    NotConnected,

    /// The database rejected or failed the statement.
    #[error("SQL execution error: {0}")]
    Execution(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument or input line.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

// Implement From traits for library errors

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<rusqlite::Error> for QueryError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Execution(err.to_string())
    }
}

#[cfg(feature = "postgres")]
impl From<postgres::Error> for QueryError {
    fn from(err: postgres::Error) -> Self {
        // Server errors carry the useful text in the DbError; the outer
        // Display is just "db error".
        err.as_db_error().map_or_else(
            || Self::Execution(err.to_string()),
            |db| Self::Execution(db.message().to_string()),
        )
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
