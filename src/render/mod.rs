//! Text rendering for result tables.
//!
//! Provides the fixed-width table layout shared by the summary prompt and
//! the CLI preview, along with grapheme-aware width helpers.

pub mod table;
pub mod unicode;

pub use table::{RenderOptions, render_table};
