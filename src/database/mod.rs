//! Database layer for contrib-qa.
//!
//! Provides the [`Database`] trait over a single long-lived connection, the
//! `PostgreSQL` and `SQLite` backends, the fixed contribution schema, and the
//! [`QueryExecutor`] that normalizes execution failures.

pub mod executor;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use executor::QueryExecutor;
#[cfg(feature = "postgres")]
pub use self::postgres::PostgresDatabase;
pub use sqlite::SqliteDatabase;
pub use traits::{Database, Dialect};
