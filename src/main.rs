//! Binary entry point for contrib-qa.
//!
//! Natural-language questions over FEC contribution records.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::Parser;
use contrib_qa::cli::output::{OutputFormat, format_error};
use contrib_qa::cli::{Cli, execute};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::Level;

fn main() -> ExitCode {
    // Flags read their env fallbacks during parsing, so .env comes first
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);
    // An unknown format is reported by `execute`, in text
    let format = OutputFormat::parse(&cli.format).unwrap_or(OutputFormat::Text);

    match execute(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                // Handle broken pipe gracefully (e.g., when piped to `head` or `jq`)
                if let Err(e) = write!(io::stdout(), "{output}")
                    && e.kind() != io::ErrorKind::BrokenPipe
                {
                    eprintln!("Error writing to stdout: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let error_output = format_error(&e, format);
            match format {
                OutputFormat::Json => {
                    // JSON errors go to stdout for programmatic parsing
                    print!("{error_output}");
                }
                OutputFormat::Text => {
                    eprintln!("Error: {error_output}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
