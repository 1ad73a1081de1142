//! `PostgreSQL` database backend.
//!
//! Queries go through the simple-query protocol, so every column arrives as
//! text regardless of its server type (including `NUMERIC`, `DATE` and
//! enums). Cell types are then inferred with [`Value::from_text`].

use crate::config::PostgresSettings;
use crate::core::{Table, Value};
use crate::database::traits::{Database, Dialect};
use crate::error::{ConnectionError, QueryError};
use ::postgres::{Client, Config, NoTls, SimpleQueryMessage};

/// PostgreSQL-based database backend.
pub struct PostgresDatabase {
    client: Client,
}

impl PostgresDatabase {
    /// Connects using the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Failed`] if the server cannot be reached or
    /// rejects the credentials.
    pub fn connect(settings: &PostgresSettings) -> Result<Self, ConnectionError> {
        let mut config = Config::new();
        config
            .host(&settings.host)
            .port(settings.port)
            .dbname(&settings.database)
            .user(&settings.user)
            .application_name(env!("CARGO_PKG_NAME"));
        if let Some(password) = &settings.password {
            config.password(password);
        }

        let client = config.connect(NoTls).map_err(|e| ConnectionError::Failed {
            backend: "postgres",
            reason: e.to_string(),
        })?;

        Ok(Self { client })
    }
}

/// Accumulates one result set from a simple-query exchange.
///
/// Only the first statement names the table; rows from later statements are
/// kept if their width matches.
#[derive(Debug, Default)]
struct RowCollector {
    columns: Option<Vec<String>>,
    rows: Vec<Vec<Value>>,
}

impl RowCollector {
    /// Records a statement's column names. Arrives before its rows, and
    /// also for statements that return none.
    fn describe<'a>(&mut self, names: impl Iterator<Item = &'a str>) {
        if self.columns.is_none() {
            self.columns = Some(names.map(String::from).collect());
        }
    }

    fn push<'a>(&mut self, cells: impl ExactSizeIterator<Item = Option<&'a str>>) {
        if self.columns.as_ref().is_some_and(|c| c.len() != cells.len()) {
            return;
        }
        self.rows.push(cells.map(Value::from_text).collect());
    }

    fn finish(self) -> Table {
        Table::new(self.columns.unwrap_or_default(), self.rows)
    }
}

fn collect_rows(messages: Vec<SimpleQueryMessage>) -> Table {
    let mut collector = RowCollector::default();

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(columns) => {
                collector.describe(columns.iter().map(|c| c.name()));
            }
            SimpleQueryMessage::Row(row) => {
                collector.describe(row.columns().iter().map(|c| c.name()));
                collector.push((0..row.len()).map(|i| row.get(i)));
            }
            _ => {}
        }
    }

    collector.finish()
}

impl Database for PostgresDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn query(&mut self, sql: &str) -> Result<Table, QueryError> {
        let messages = self.client.simple_query(sql)?;
        Ok(collect_rows(messages))
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), QueryError> {
        self.client.batch_execute(sql)?;
        Ok(())
    }
}
