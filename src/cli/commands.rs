//! CLI command implementations.
//!
//! Contains the business logic for each CLI command. Commands that call the
//! model check the credential before touching the database.

use crate::cli::output::{
    ConsolePresenter, OutputFormat, format_error, format_init, format_prompt, format_schema,
    format_table, format_transcript,
};
use crate::cli::parser::{Cli, Commands, ConnectionArgs};
use crate::config::{DatabaseSettings, ModelSettings};
#[cfg(feature = "postgres")]
use crate::database::PostgresDatabase;
use crate::database::{Database, QueryExecutor, SqliteDatabase, schema};
#[cfg(not(feature = "postgres"))]
use crate::error::ConnectionError;
use crate::error::{CommandError, Error, Result};
use crate::model::{ModelClient, OpenAiTransport};
use crate::pipeline::{Pipeline, Transcript};
use crate::prompt::build_sql_prompt_for;
use std::io::{self, BufRead, Write as IoWrite};
use tracing::{info, warn};

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format)?;

    match &cli.command {
        Commands::Ask { question } => cmd_ask(cli, question, format),
        Commands::Shell => cmd_shell(cli, format),
        Commands::Prompt { question } => Ok(cmd_prompt(&cli.connection, question, format)),
        Commands::Schema => Ok(cmd_schema(format)),
        Commands::Init => cmd_init(&cli.connection, format),
        Commands::Run { sql } => cmd_run(&cli.connection, sql, format),
    }
}

/// Opens the configured database.
///
/// # Errors
///
/// Returns a connection error when settings are missing or the backend
/// refuses the connection.
pub fn open_database(settings: &DatabaseSettings) -> Result<Box<dyn Database>> {
    match settings {
        DatabaseSettings::Sqlite(path) => {
            let db = SqliteDatabase::open(path)?;
            info!(path = %path.display(), "connected to SQLite database");
            Ok(Box::new(db))
        }
        DatabaseSettings::Postgres(pg) => connect_postgres(pg),
    }
}

#[cfg(feature = "postgres")]
fn connect_postgres(settings: &crate::config::PostgresSettings) -> Result<Box<dyn Database>> {
    let db = PostgresDatabase::connect(settings)?;
    info!(host = %settings.host, database = %settings.database, "connected to PostgreSQL");
    Ok(Box::new(db))
}

#[cfg(not(feature = "postgres"))]
fn connect_postgres(_settings: &crate::config::PostgresSettings) -> Result<Box<dyn Database>> {
    Err(ConnectionError::Unsupported {
        backend: "postgres",
    }
    .into())
}

/// Builds the pipeline for model-backed commands.
///
/// The credential is checked first, so a missing key never opens a
/// connection.
fn build_pipeline(cli: &Cli) -> Result<Pipeline> {
    let settings: ModelSettings = cli.model.settings()?;
    let database = open_database(&cli.connection.settings()?)?;

    let transport = OpenAiTransport::new(&settings)?;
    info!(endpoint = transport.endpoint(), model = %settings.model, "model client ready");
    let model = ModelClient::new(Box::new(transport), settings.model, settings.retry);

    Ok(Pipeline::new(model, QueryExecutor::new(database)))
}

/// Runs one question, echoing progress to `progress` when given.
pub fn answer_question(
    pipeline: &mut Pipeline,
    question: &str,
    progress: Option<&mut dyn IoWrite>,
) -> Transcript {
    let mut presenter = ConsolePresenter::new(progress);
    pipeline.ask(question, &mut presenter);
    presenter.into_transcript()
}

fn cmd_ask(cli: &Cli, question: &str, format: OutputFormat) -> Result<String> {
    let mut pipeline = build_pipeline(cli)?;

    let mut stderr = io::stderr();
    let progress = progress_sink(format, &mut stderr);
    let transcript = answer_question(&mut pipeline, question, progress);

    Ok(format_transcript(&transcript, cli.preview_rows, format))
}

fn cmd_shell(cli: &Cli, format: OutputFormat) -> Result<String> {
    let mut pipeline = build_pipeline(cli)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    run_shell(
        &mut pipeline,
        stdin.lock(),
        &mut stdout,
        progress_sink(format, &mut stderr),
        cli.preview_rows,
        format,
    )?;

    Ok(String::new())
}

fn progress_sink(format: OutputFormat, stderr: &mut io::Stderr) -> Option<&mut dyn IoWrite> {
    match format {
        OutputFormat::Text => Some(stderr as &mut dyn IoWrite),
        OutputFormat::Json => None,
    }
}

/// Answers questions read line by line from `input` until EOF or `exit`.
///
/// Blank lines produce the empty-question warning, as they would in any
/// other shell. A line that is not valid UTF-8 is reported and skipped.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails.
pub fn run_shell<R: BufRead, W: IoWrite>(
    pipeline: &mut Pipeline,
    mut input: R,
    output: &mut W,
    mut progress: Option<&mut dyn IoWrite>,
    preview_rows: usize,
    format: OutputFormat,
) -> Result<()> {
    let mut raw = Vec::new();

    loop {
        if format == OutputFormat::Text {
            write!(output, "> ")?;
            output.flush()?;
        }

        raw.clear();
        if input.read_until(b'\n', &mut raw)? == 0 {
            break;
        }

        let Ok(line) = std::str::from_utf8(&raw) else {
            let err = Error::from(CommandError::InvalidArgument(
                "input line is not valid UTF-8".to_string(),
            ));
            warn!(error = %err, "skipping shell input");
            match format {
                OutputFormat::Text => writeln!(output, "Error: {}\n", format_error(&err, format))?,
                OutputFormat::Json => write!(output, "{}", format_error(&err, format))?,
            }
            continue;
        };

        let question = line.trim();
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        let sink = progress.as_mut().map(|p| &mut **p as &mut dyn IoWrite);
        let transcript = answer_question(pipeline, question, sink);
        write!(output, "{}", format_transcript(&transcript, preview_rows, format))?;
        if format == OutputFormat::Text {
            writeln!(output)?;
        }
    }

    output.flush()?;
    Ok(())
}

fn cmd_prompt(connection: &ConnectionArgs, question: &str, format: OutputFormat) -> String {
    let dialect = connection.dialect();
    format_prompt(&build_sql_prompt_for(question, dialect), dialect, format)
}

fn cmd_schema(format: OutputFormat) -> String {
    format_schema(&schema::table_names(), &schema::ddl(), format)
}

fn cmd_init(connection: &ConnectionArgs, format: OutputFormat) -> Result<String> {
    let settings = connection.settings()?;
    let mut executor = QueryExecutor::new(open_database(&settings)?);

    executor.execute_batch(&schema::ddl())?;

    let target = match &settings {
        DatabaseSettings::Sqlite(path) => path.display().to_string(),
        DatabaseSettings::Postgres(pg) => format!("{}/{}", pg.host, pg.database),
    };
    info!(location = %target, "schema initialized");

    Ok(format_init(&target, &schema::table_names(), format))
}

fn cmd_run(connection: &ConnectionArgs, sql: &str, format: OutputFormat) -> Result<String> {
    let mut executor = QueryExecutor::new(open_database(&connection.settings()?)?);
    let table = executor.run(sql)?;
    Ok(format_table(&table, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::config::RetryPolicy;
    use crate::error::{ModelError, QueryError};
    use crate::model::{ModelRequest, ModelResponse, ModelTransport};
    use clap::Parser;
    use std::io::Cursor;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ConnectionArgs) {
        let temp_dir = TempDir::new().unwrap();
        let args = ConnectionArgs {
            sqlite: Some(temp_dir.path().join("fec.db")),
            ..ConnectionArgs::default()
        };
        (temp_dir, args)
    }

    /// Answers every prompt with `reply`.
    struct Echo(&'static str);

    impl ModelTransport for Echo {
        fn send(&self, _request: &ModelRequest) -> std::result::Result<ModelResponse, ModelError> {
            Ok(ModelResponse::text(self.0.to_string()))
        }
    }

    fn pipeline(args: &ConnectionArgs, reply: &'static str) -> Pipeline {
        let db = open_database(&args.settings().unwrap()).unwrap();
        let model = ModelClient::new(Box::new(Echo(reply)), "test-model", RetryPolicy::default());
        Pipeline::new(model, QueryExecutor::new(db))
    }

    #[test]
    fn test_cmd_init_creates_tables() {
        let (_temp_dir, args) = setup();
        let output = cmd_init(&args, OutputFormat::Text).unwrap();
        assert!(output.contains("contributions"));

        // Idempotent
        assert!(cmd_init(&args, OutputFormat::Text).is_ok());

        let output = cmd_run(&args, "SELECT COUNT(*) AS n FROM contributors", OutputFormat::Text)
            .unwrap();
        assert_eq!(output, "n\n0\n(1 row)\n");
    }

    #[test]
    fn test_cmd_run_reports_sql_errors() {
        let (_temp_dir, args) = setup();
        let err = cmd_run(&args, "SELECT * FROM donors", OutputFormat::Text).unwrap_err();
        assert!(matches!(err, Error::Query(QueryError::Execution(_))));
    }

    #[test]
    fn test_cmd_run_without_settings() {
        let err = cmd_run(&ConnectionArgs::default(), "SELECT 1", OutputFormat::Text).unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[test]
    fn test_cmd_prompt_uses_backend_dialect() {
        let (_temp_dir, args) = setup();
        let output = cmd_prompt(&args, "Top donors", OutputFormat::Text);
        assert!(output.contains("SQLite"));
        assert!(output.contains("\"Top donors\""));

        let output = cmd_prompt(&ConnectionArgs::default(), "Top donors", OutputFormat::Text);
        assert!(output.contains("PostgreSQL"));
    }

    #[test]
    fn test_cmd_schema() {
        let output = cmd_schema(OutputFormat::Text);
        assert!(output.contains("CREATE TABLE IF NOT EXISTS contributors"));
    }

    #[test]
    fn test_run_shell_answers_until_exit() {
        let (_temp_dir, args) = setup();
        cmd_init(&args, OutputFormat::Text).unwrap();
        let mut pipeline = pipeline(&args, "SELECT 1 AS n");

        let input = Cursor::new("How many donors?\n\nexit\nignored\n");
        let mut output = Vec::new();
        run_shell(&mut pipeline, input, &mut output, None, 10, OutputFormat::Text).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.matches("Answer:\nSELECT 1 AS n").count(), 1);
        assert_eq!(output.matches("Warning: Please enter a question.").count(), 1);
        assert!(!output.contains("ignored"));
    }

    #[test]
    fn test_run_shell_skips_invalid_utf8_line() {
        let (_temp_dir, args) = setup();
        cmd_init(&args, OutputFormat::Text).unwrap();
        let mut pipeline = pipeline(&args, "SELECT 1 AS n");

        let input = Cursor::new(b"caf\xe9 donors\nHow many donors?\n".to_vec());
        let mut output = Vec::new();
        run_shell(&mut pipeline, input, &mut output, None, 10, OutputFormat::Text).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Error: command error: invalid argument: input line is not valid UTF-8"));
        assert_eq!(output.matches("Answer:\nSELECT 1 AS n").count(), 1);
    }

    #[test]
    fn test_execute_rejects_unknown_format() {
        let cli = Cli::parse_from(["contrib-qa", "--format", "yaml", "schema"]);
        let err = execute(&cli).unwrap_err();
        assert!(matches!(err, Error::Command(CommandError::InvalidArgument(_))));
    }

    #[test]
    fn test_run_shell_stops_at_eof() {
        let (_temp_dir, args) = setup();
        let mut pipeline = pipeline(&args, "unused");

        let mut output = Vec::new();
        run_shell(
            &mut pipeline,
            Cursor::new(""),
            &mut output,
            None,
            10,
            OutputFormat::Json,
        )
        .unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_open_sqlite_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path: PathBuf = temp_dir.path().join("nested").join("fec.db");
        open_database(&DatabaseSettings::Sqlite(path.clone())).unwrap();
        assert!(path.exists());
    }
}
