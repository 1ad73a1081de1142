//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros. Connection and model
//! settings fall back to environment variables (and so to `.env`).

use crate::config::{
    DEFAULT_API_BASE, DEFAULT_MAX_RETRIES, DEFAULT_MODEL, DatabaseSettings, ModelSettings,
    PostgresSettings, RetryPolicy,
};
use crate::database::Dialect;
use crate::error::{ConnectionError, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default number of rows shown in result previews.
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

/// contrib-qa: ask questions about FEC individual contributions.
///
/// Translates a question into SQL with a language model, runs it against
/// the contribution database, and summarizes the result.
#[derive(Parser, Debug)]
#[command(name = "contrib-qa")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database connection options.
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Model service options.
    #[command(flatten)]
    pub model: ModelArgs,

    /// Enable verbose (debug) logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Rows shown in result previews.
    #[arg(long, default_value_t = DEFAULT_PREVIEW_ROWS, global = true)]
    pub preview_rows: usize,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the contribution records live.
///
/// `--sqlite` wins over the `PostgreSQL` settings when both are present.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Use a local `SQLite` file instead of `PostgreSQL`.
    #[arg(long, env = "CONTRIB_QA_SQLITE", global = true)]
    pub sqlite: Option<PathBuf>,

    /// `PostgreSQL` host.
    #[arg(long, env = "DB_HOST", global = true)]
    pub db_host: Option<String>,

    /// `PostgreSQL` port.
    #[arg(long, env = "DB_PORT", global = true)]
    pub db_port: Option<u16>,

    /// `PostgreSQL` database name.
    #[arg(long, env = "DB_NAME", global = true)]
    pub db_name: Option<String>,

    /// `PostgreSQL` user.
    #[arg(long, env = "DB_USER", global = true)]
    pub db_user: Option<String>,

    /// `PostgreSQL` password.
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true, global = true)]
    pub db_password: Option<String>,
}

impl ConnectionArgs {
    /// Resolves the backend to connect to.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::MissingSetting`] when no `SQLite` path is
    /// given and a required `PostgreSQL` setting is absent.
    pub fn settings(&self) -> std::result::Result<DatabaseSettings, ConnectionError> {
        if let Some(path) = &self.sqlite {
            return Ok(DatabaseSettings::Sqlite(path.clone()));
        }

        PostgresSettings::from_parts(
            self.db_host.clone(),
            self.db_port,
            self.db_name.clone(),
            self.db_user.clone(),
            self.db_password.clone(),
        )
        .map(DatabaseSettings::Postgres)
    }

    /// Dialect the configured backend speaks.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        if self.sqlite.is_some() {
            Dialect::Sqlite
        } else {
            Dialect::Postgres
        }
    }
}

/// Model service options.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// API key for the model service.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Model identifier.
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Model service base URL.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_API_BASE, global = true)]
    pub api_base: String,

    /// Attempts per model call before giving up.
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES, global = true)]
    pub max_retries: u32,
}

impl ModelArgs {
    /// Resolves model settings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CredentialMissing`] without an API key.
    pub fn settings(&self) -> Result<ModelSettings> {
        ModelSettings::new(
            self.api_key.clone(),
            self.model.clone(),
            self.api_base.clone(),
            RetryPolicy::with_max_retries(self.max_retries),
        )
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a single question.
    Ask {
        /// The question, in plain English.
        question: String,
    },

    /// Read questions from stdin, one per line, until EOF or `exit`.
    Shell,

    /// Print the SQL-generation prompt for a question.
    ///
    /// Needs neither a credential nor a connection.
    Prompt {
        /// The question, in plain English.
        question: String,
    },

    /// Print the database schema as DDL.
    Schema,

    /// Create the schema in the configured database.
    Init,

    /// Execute SQL directly and print the result.
    Run {
        /// SQL statement.
        sql: String,
    },
}
