//! CLI layer for contrib-qa.
//!
//! Provides the command-line interface using clap: one-shot questions, an
//! interactive shell, and helpers for inspecting the prompt and schema.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::{execute, run_shell};
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
