//! Prompt builders.
//!
//! Pure functions turning a question (and later a result table) into the
//! text sent to the model. No clocks, randomness, or I/O: the same inputs
//! always produce the same prompt.

pub mod sql;
pub mod summary;

pub use sql::{
    ROW_CAP, SYNONYM_GROUPS, SYNONYM_TABLE_VERSION, build_sql_prompt, build_sql_prompt_for,
};
pub use summary::{SummaryTemplate, build_summary_prompt, summary_template};
