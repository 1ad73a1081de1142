//! Core domain models for contrib-qa.
//!
//! This module contains the data that flows between pipeline stages. These
//! are pure domain models with no I/O dependencies.

pub mod table;

pub use table::{Table, Value};
