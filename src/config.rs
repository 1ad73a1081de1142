//! Typed runtime settings.
//!
//! Settings are resolved by the CLI from flags, the process environment and
//! a `.env` file. The library only sees these structs, so connection and
//! credential handling stay in one place.

use crate::error::{ConnectionError, Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the model API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-5-mini";

/// Default model service base URL.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default retry budget per model invocation.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default `PostgreSQL` port.
pub const DEFAULT_PG_PORT: u16 = 5432;

/// `PostgreSQL` connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct PostgresSettings {
    /// Server host (`DB_HOST`).
    pub host: String,
    /// Server port (`DB_PORT`).
    pub port: u16,
    /// Database name (`DB_NAME`).
    pub database: String,
    /// User name (`DB_USER`).
    pub user: String,
    /// Password (`DB_PASSWORD`), if any.
    pub password: Option<String>,
}

impl std::fmt::Debug for PostgresSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl PostgresSettings {
    /// Builds settings from optional parts, naming the first missing one.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::MissingSetting`] for an absent host,
    /// database name, or user.
    pub fn from_parts(
        host: Option<String>,
        port: Option<u16>,
        database: Option<String>,
        user: Option<String>,
        password: Option<String>,
    ) -> std::result::Result<Self, ConnectionError> {
        let require = |value: Option<String>, variable: &'static str| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConnectionError::MissingSetting { variable })
        };

        Ok(Self {
            host: require(host, "DB_HOST")?,
            port: port.unwrap_or(DEFAULT_PG_PORT),
            database: require(database, "DB_NAME")?,
            user: require(user, "DB_USER")?,
            password: password.filter(|p| !p.is_empty()),
        })
    }
}

/// Which database to connect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseSettings {
    /// A `PostgreSQL` server.
    Postgres(PostgresSettings),
    /// A local `SQLite` file.
    Sqlite(PathBuf),
}

/// Retry policy for model invocations.
///
/// Waits `unit * 2^attempt` after failed attempt `attempt` (zero-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per invocation, at least 1.
    pub max_retries: u32,
    /// Base backoff time unit.
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given budget and a one-second unit.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Returns the budget, treating 0 as 1.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Returns the wait after failed attempt `attempt` (zero-based).
    ///
    /// # Examples
    ///
    /// ```
    /// use contrib_qa::config::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.delay(0), Duration::from_secs(1));
    /// assert_eq!(policy.delay(2), Duration::from_secs(4));
    /// ```
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Model service settings.
#[derive(Clone, PartialEq, Eq)]
pub struct ModelSettings {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Service base URL.
    pub api_base: String,
    /// Retry policy.
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ModelSettings {
    /// Builds settings, requiring a non-empty API key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CredentialMissing`] when the key is absent or blank.
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        api_base: impl Into<String>,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(Error::CredentialMissing {
                variable: API_KEY_VAR,
            })?;

        Ok(Self {
            api_key,
            model: model.into(),
            api_base: api_base.into(),
            retry,
        })
    }
}
