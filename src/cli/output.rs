//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::core::Table;
use crate::database::Dialect;
use crate::error::{CommandError, Error};
use crate::pipeline::{Notice, Presenter, Severity, Stage, Transcript};
use crate::render::{RenderOptions, render_table};
use serde::Serialize;
use std::fmt::Write as FmtWrite;
use std::io::{self, Write as IoWrite};

/// Widest cell shown in previews, in grapheme clusters.
const PREVIEW_CELL_WIDTH: usize = 40;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidArgument`] for anything other than
    /// `text` or `json`.
    pub fn parse(s: &str) -> Result<Self, CommandError> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(CommandError::InvalidArgument(format!(
                "unknown output format '{other}' (expected text or json)"
            ))),
        }
    }
}

/// Records a run while echoing progress to a side channel (usually stderr).
pub struct ConsolePresenter<'a> {
    transcript: Transcript,
    progress: Option<&'a mut dyn io::Write>,
}

impl<'a> ConsolePresenter<'a> {
    /// Creates a presenter; `None` disables progress output.
    #[must_use]
    pub fn new(progress: Option<&'a mut dyn io::Write>) -> Self {
        Self {
            transcript: Transcript::new(),
            progress,
        }
    }

    /// Consumes the presenter, returning what it recorded.
    #[must_use]
    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }
}

impl Presenter for ConsolePresenter<'_> {
    fn stage(&mut self, stage: Stage) {
        if matches!(
            stage,
            Stage::GeneratingSql | Stage::ExecutingQuery | Stage::GeneratingAnswer
        ) && let Some(out) = self.progress.as_mut()
        {
            let _ = writeln!(out, "{stage}");
        }
        self.transcript.stage(stage);
    }

    fn generated_sql(&mut self, sql: &str) {
        self.transcript.generated_sql(sql);
    }

    fn preview(&mut self, table: &Table) {
        self.transcript.preview(table);
    }

    fn answer(&mut self, answer: &str) {
        self.transcript.answer(answer);
    }

    fn notice(&mut self, notice: &Notice) {
        self.transcript.notice(notice);
    }
}

/// A notice as shown to JSON consumers.
#[derive(Debug, Serialize)]
struct NoticeReport {
    severity: Severity,
    message: String,
}

impl From<&Notice> for NoticeReport {
    fn from(notice: &Notice) -> Self {
        Self {
            severity: notice.severity(),
            message: notice.to_string(),
        }
    }
}

/// Formats the result of one question.
///
/// The preview shows at most `preview_rows` rows; the JSON form reports the
/// full row count alongside the preview.
#[must_use]
pub fn format_transcript(
    transcript: &Transcript,
    preview_rows: usize,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => format_transcript_text(transcript, preview_rows),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Report<'a> {
                sql: Option<&'a str>,
                row_count: Option<usize>,
                preview: Option<Table>,
                answer: Option<&'a str>,
                notices: Vec<NoticeReport>,
            }

            format_json(&Report {
                sql: transcript.sql.as_deref(),
                row_count: transcript.table.as_ref().map(Table::row_count),
                preview: transcript.table.as_ref().map(|t| t.head(preview_rows)),
                answer: transcript.answer.as_deref(),
                notices: transcript.notices.iter().map(NoticeReport::from).collect(),
            })
        }
    }
}

fn format_transcript_text(transcript: &Transcript, preview_rows: usize) -> String {
    let mut output = String::new();

    if let Some(sql) = &transcript.sql {
        output.push_str("Generated SQL:\n");
        let _ = writeln!(output, "{}\n", sql.trim_end());
    }

    if let Some(table) = &transcript.table {
        output.push_str(&format_preview(table, preview_rows));
        output.push('\n');
    }

    for notice in &transcript.notices {
        let _ = writeln!(output, "{}", format_notice(notice));
    }

    if let Some(answer) = &transcript.answer {
        if !transcript.notices.is_empty() {
            output.push('\n');
        }
        output.push_str("Answer:\n");
        let _ = writeln!(output, "{}", answer.trim_end());
    }

    output
}

fn format_preview(table: &Table, preview_rows: usize) -> String {
    let mut output = String::new();
    let total = table.row_count();

    if total > preview_rows {
        let _ = writeln!(output, "Preview (first {preview_rows} of {total} rows):");
    } else {
        let _ = writeln!(output, "Preview ({total} {}):", plural(total, "row", "rows"));
    }
    output.push_str(&render_table(
        &table.head(preview_rows),
        RenderOptions::preview(PREVIEW_CELL_WIDTH),
    ));
    output
}

/// Formats a notice for the terminal.
#[must_use]
pub fn format_notice(notice: &Notice) -> String {
    match notice.severity() {
        Severity::Warning => format!("Warning: {notice}"),
        Severity::Error => format!("Error: {notice}"),
    }
}

/// Formats a result table from `run`.
#[must_use]
pub fn format_table(table: &Table, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = render_table(table, RenderOptions::full());
            let rows = table.row_count();
            let _ = writeln!(output, "({rows} {})", plural(rows, "row", "rows"));
            output
        }
        OutputFormat::Json => format_json(table),
    }
}

/// Formats the SQL-generation prompt.
#[must_use]
pub fn format_prompt(prompt: &str, dialect: Dialect, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{prompt}\n"),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct PromptReport<'a> {
                dialect: &'a str,
                prompt: &'a str,
            }
            format_json(&PromptReport {
                dialect: dialect.name(),
                prompt,
            })
        }
    }
}

/// Formats the schema DDL.
#[must_use]
pub fn format_schema(tables: &[&str], ddl: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => ddl.to_string(),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct SchemaReport<'a> {
                tables: &'a [&'a str],
                ddl: &'a str,
            }
            format_json(&SchemaReport { tables, ddl })
        }
    }
}

/// Formats the result of `init`.
#[must_use]
pub fn format_init(target: &str, tables: &[&str], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!(
            "Initialized schema in {target}: {}\n",
            tables.join(", ")
        ),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct InitReport<'a> {
                target: &'a str,
                tables: &'a [&'a str],
            }
            format_json(&InitReport { target, tables })
        }
    }
}

/// Formats an error for display.
///
/// JSON errors are objects with an `error` field so scripts can parse them
/// from stdout.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ErrorReport {
                error: String,
                kind: &'static str,
            }
            format_json(&ErrorReport {
                error: error.to_string(),
                kind: error_kind(error),
            })
        }
    }
}

const fn error_kind(error: &Error) -> &'static str {
    match error {
        Error::CredentialMissing { .. } => "credential_missing",
        Error::Connection(_) => "connection",
        Error::Model(_) => "model",
        Error::Query(_) => "query",
        Error::Command(_) => "command",
        Error::Io(_) => "io",
    }
}

/// Formats a value as JSON.
fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).map_or_else(|_| "{}\n".to_string(), |s| s + "\n")
}

const fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;
    use crate::error::QueryError;

    fn answered() -> Transcript {
        let mut transcript = Transcript::new();
        transcript.generated_sql("SELECT SUM(amount) AS total FROM contributions");
        transcript.preview(&Table::new(
            vec!["total".to_string()],
            vec![vec![Value::Int(500)]],
        ));
        transcript.answer("John Smith gave $500.");
        transcript
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text").unwrap(), OutputFormat::Text);
    }

    #[test]
    fn test_output_format_rejects_unknown() {
        let err = OutputFormat::parse("yaml").unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument(_)));
        assert!(err.to_string().contains("yaml"));

        let err = Error::from(err);
        assert_eq!(error_kind(&err), "command");
    }

    #[test]
    fn test_format_transcript_text() {
        let text = format_transcript(&answered(), 10, OutputFormat::Text);
        assert_eq!(
            text,
            "Generated SQL:\nSELECT SUM(amount) AS total FROM contributions\n\n\
             Preview (1 row):\ntotal\n  500\n\n\
             Answer:\nJohn Smith gave $500.\n"
        );
    }

    #[test]
    fn test_format_transcript_json() {
        let json = format_transcript(&answered(), 10, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["row_count"], 1);
        assert_eq!(value["preview"]["rows"][0][0], 500);
        assert_eq!(value["answer"], "John Smith gave $500.");
        assert_eq!(value["notices"], serde_json::json!([]));
    }

    #[test]
    fn test_preview_is_capped() {
        let rows = (0..25).map(|i| vec![Value::Int(i)]).collect();
        let mut transcript = Transcript::new();
        transcript.preview(&Table::new(vec!["n".to_string()], rows));

        let text = format_transcript(&transcript, 5, OutputFormat::Text);
        assert!(text.contains("Preview (first 5 of 25 rows):"));
        assert!(!text.contains("\n5\n"));

        let json = format_transcript(&transcript, 5, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["row_count"], 25);
        assert_eq!(value["preview"]["rows"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_notices_are_labelled() {
        let mut transcript = Transcript::new();
        transcript.notice(&Notice::EmptyQuestion);
        assert_eq!(
            format_transcript(&transcript, 10, OutputFormat::Text),
            "Warning: Please enter a question.\n"
        );

        let mut transcript = Transcript::new();
        transcript.generated_sql("SELECT 1");
        transcript.notice(&Notice::NotConnected);
        transcript.answer("Nothing found.");
        let text = format_transcript(&transcript, 10, OutputFormat::Text);
        assert!(text.contains("Error: Database connection not established.\n\nAnswer:"));
    }

    #[test]
    fn test_console_presenter_reports_model_and_query_stages() {
        let mut progress = Vec::new();
        {
            let mut presenter = ConsolePresenter::new(Some(&mut progress as &mut dyn io::Write));
            presenter.stage(Stage::Idle);
            presenter.stage(Stage::GeneratingSql);
            presenter.generated_sql("SELECT 1");
            presenter.stage(Stage::ExecutingQuery);
            let transcript = presenter.into_transcript();
            assert_eq!(transcript.sql.as_deref(), Some("SELECT 1"));
            assert_eq!(transcript.stages.len(), 3);
        }
        let progress = String::from_utf8(progress).unwrap();
        assert_eq!(progress, "Generating SQL...\nExecuting SQL query...\n");
    }

    #[test]
    fn test_format_table() {
        let table = Table::new(vec!["n".to_string()], vec![vec![Value::Int(1)]]);
        assert_eq!(format_table(&table, OutputFormat::Text), "n\n1\n(1 row)\n");
        assert_eq!(
            format_table(&Table::empty(), OutputFormat::Text),
            "(empty)\n(0 rows)\n"
        );
    }

    #[test]
    fn test_format_error() {
        let err = Error::Query(QueryError::Execution("no such table: donors".to_string()));
        assert_eq!(
            format_error(&err, OutputFormat::Text),
            "query error: SQL execution error: no such table: donors"
        );

        let json = format_error(&err, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "query");
        assert!(value["error"].as_str().unwrap().contains("donors"));
    }

    #[test]
    fn test_format_prompt_and_schema() {
        let json = format_prompt("PROMPT", Dialect::Sqlite, OutputFormat::Json);
        assert!(json.contains("\"dialect\": \"SQLite\""));
        assert_eq!(format_prompt("PROMPT", Dialect::Postgres, OutputFormat::Text), "PROMPT\n");

        let json = format_schema(&["contributors"], "CREATE TABLE ...", OutputFormat::Json);
        assert!(json.contains("\"contributors\""));
    }
}
