//! # contrib-qa
//!
//! Natural-language question answering over FEC individual contribution
//! records.
//!
//! A question is turned into SQL by a language model, the SQL runs against
//! a fixed four-table schema, and a second model call summarizes the rows
//! in plain English.
//!
//! ## Features
//!
//! - **Prompting**: schema-aware SQL prompt with synonym expansion and a row cap
//! - **Backends**: `PostgreSQL` (default feature) and `SQLite`
//! - **Retries**: exponential backoff around every model call
//! - **Presentation boundary**: a [`Presenter`] trait between pipeline and shell
//!
//! ```no_run
//! use contrib_qa::config::RetryPolicy;
//! use contrib_qa::database::{QueryExecutor, SqliteDatabase};
//! use contrib_qa::model::{ModelClient, OpenAiTransport};
//! use contrib_qa::pipeline::{Pipeline, Transcript};
//! use contrib_qa::config::ModelSettings;
//!
//! # fn main() -> contrib_qa::Result<()> {
//! let settings = ModelSettings::new(
//!     std::env::var("OPENAI_API_KEY").ok(),
//!     "gpt-5-mini",
//!     "https://api.openai.com/v1",
//!     RetryPolicy::default(),
//! )?;
//! let transport = OpenAiTransport::new(&settings)?;
//! let model = ModelClient::new(Box::new(transport), settings.model, settings.retry);
//! let db = SqliteDatabase::open("fec.db")?;
//!
//! let mut pipeline = Pipeline::new(model, QueryExecutor::new(Box::new(db)));
//! let mut transcript = Transcript::new();
//! let outcome = pipeline.ask("Top 5 employers of teachers in Ohio", &mut transcript);
//! println!("{:?}", outcome.answer());
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod cli;
pub mod config;
pub mod core;
pub mod database;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod render;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{Table, Value};

// Re-export pipeline types
pub use pipeline::{Notice, Outcome, Pipeline, Presenter, Stage, Transcript};

// Re-export database types
pub use database::{Database, Dialect, QueryExecutor, SqliteDatabase};

// Re-export model types
pub use model::{ModelClient, ModelTransport, OpenAiTransport};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};
