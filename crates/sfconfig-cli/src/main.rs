use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

mod cli;
mod commands;
mod error;
mod output;

use cli::OutputFormat;
use error::CliError;

fn main() -> ExitCode {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let message = err.kind().as_str().unwrap_or("Invalid arguments");
            let err = CliError::validation(message).with_detail("usage", err.render().to_string());
            output::print_error(&err, OutputFormat::Json);
            return ExitCode::from(err.exit_code());
        }
    };

    // stdout carries the JSON results
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let format = cli.format;
    let result = commands::run_command(cli)
        .and_then(|report| output::print_report(&report, format));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let err = CliError::from_anyhow(err);
            output::print_error(&err, format);
            ExitCode::from(err.exit_code())
        }
    }
}
