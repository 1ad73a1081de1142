//! Result-summarization prompt.
//!
//! Which template is used depends only on whether the table has rows; a
//! failed query and a query that matched nothing read the same here.

use crate::core::Table;
use crate::render::{RenderOptions, render_table};
use std::fmt::Write;

/// The two summarization templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryTemplate {
    /// Explain politely that nothing matched.
    NoResults,
    /// Summarize the embedded rows.
    Summarize,
}

/// Selects the template for `table` by row count alone.
#[must_use]
pub fn summary_template(table: &Table) -> SummaryTemplate {
    if table.is_empty() {
        SummaryTemplate::NoResults
    } else {
        SummaryTemplate::Summarize
    }
}

/// Builds the summarization prompt.
///
/// Non-empty tables are embedded in full: every row and every character.
/// Callers that need fewer rows must bound the query itself.
#[must_use]
pub fn build_summary_prompt(question: &str, table: &Table) -> String {
    match summary_template(table) {
        SummaryTemplate::NoResults => no_results_prompt(question),
        SummaryTemplate::Summarize => summarize_prompt(question, table),
    }
}

fn no_results_prompt(question: &str) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "The user asked: \"{question}\"");
    prompt.push_str("The database returned no matching records.\n\n");
    prompt.push_str(
        "Politely explain that no matching records were found. Mention plausible causes: \
         the contribution data may not cover that person, place, or period, or the \
         question's names, employers, or places may be recorded differently in the filings. \
         Suggest how the question could be rephrased.\n",
    );
    prompt.push_str(
        "Do not invent amounts, totals, counts, dates, or names. Do not mention SQL, \
         queries, or database internals.",
    );
    prompt
}

fn summarize_prompt(question: &str, table: &Table) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "The user asked: \"{question}\"");
    let _ = writeln!(
        prompt,
        "Query results ({} row{}):\n",
        table.row_count(),
        if table.row_count() == 1 { "" } else { "s" }
    );
    prompt.push_str(&render_table(table, RenderOptions::full()));
    prompt.push('\n');
    prompt.push_str(
        "Write a concise, professional answer to the user's question based on these results. \
         Highlight notable aggregates such as the top entries, totals, and counts. \
         Use only the figures shown. Do not mention SQL, queries, column names, or other \
         internal details.",
    );
    prompt
}
