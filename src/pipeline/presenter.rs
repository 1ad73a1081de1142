//! Presentation-shell boundary.
//!
//! The pipeline reports progress and results through [`Presenter`]; the
//! shell decides how to show them. [`Transcript`] records everything for
//! shells that format after the fact.

use crate::core::Table;
use serde::Serialize;
use std::fmt;

/// Pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Waiting for a question.
    Idle,
    /// Building the SQL-generation prompt.
    BuildingSqlPrompt,
    /// Asking the model for SQL.
    GeneratingSql,
    /// Running the generated SQL.
    ExecutingQuery,
    /// Building the summarization prompt.
    BuildingSummaryPrompt,
    /// Asking the model for the answer.
    GeneratingAnswer,
    /// Answer produced.
    Done,
    /// A model invocation exhausted its retries.
    Failed,
}

impl Stage {
    /// Progress label for the shell.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Waiting for a question",
            Self::BuildingSqlPrompt => "Preparing SQL prompt...",
            Self::GeneratingSql => "Generating SQL...",
            Self::ExecutingQuery => "Executing SQL query...",
            Self::BuildingSummaryPrompt => "Preparing summary prompt...",
            Self::GeneratingAnswer => "Generating answer...",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How prominently a notice should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// User input problem.
    Warning,
    /// Something failed.
    Error,
}

/// User-facing notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Notice {
    /// The question was blank.
    EmptyQuestion,
    /// No database connection is held.
    NotConnected,
    /// The generated SQL failed to execute.
    QueryFailed(String),
    /// The model produced no SQL after all retries.
    SqlGenerationFailed,
    /// The model produced no answer after all retries.
    AnswerGenerationFailed,
}

impl Notice {
    /// Display severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::EmptyQuestion => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyQuestion => f.write_str("Please enter a question."),
            Self::NotConnected => f.write_str("Database connection not established."),
            Self::QueryFailed(reason) => write!(f, "{reason}"),
            Self::SqlGenerationFailed => f.write_str("Error generating SQL."),
            Self::AnswerGenerationFailed => f.write_str("Error generating answer."),
        }
    }
}

/// Receives pipeline events.
///
/// All methods default to doing nothing.
pub trait Presenter {
    /// The pipeline entered `stage`.
    fn stage(&mut self, _stage: Stage) {}

    /// The model produced SQL.
    fn generated_sql(&mut self, _sql: &str) {}

    /// The query returned `table`.
    fn preview(&mut self, _table: &Table) {}

    /// The final answer.
    fn answer(&mut self, _answer: &str) {}

    /// A warning or error for the user.
    fn notice(&mut self, _notice: &Notice) {}
}

/// Records every event of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transcript {
    /// Stages entered, in order.
    pub stages: Vec<Stage>,
    /// Generated SQL, if any.
    pub sql: Option<String>,
    /// Result table, if the query succeeded.
    pub table: Option<Table>,
    /// Final answer, if any.
    pub answer: Option<String>,
    /// Notices in the order raised.
    pub notices: Vec<Notice>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Presenter for Transcript {
    fn stage(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    fn generated_sql(&mut self, sql: &str) {
        self.sql = Some(sql.to_string());
    }

    fn preview(&mut self, table: &Table) {
        self.table = Some(table.clone());
    }

    fn answer(&mut self, answer: &str) {
        self.answer = Some(answer.to_string());
    }

    fn notice(&mut self, notice: &Notice) {
        self.notices.push(notice.clone());
    }
}
