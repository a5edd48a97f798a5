//! `ledger`: parse, load, and book plain-text double-entry ledgers.

use std::process::ExitCode;

use clap::Parser;
use ledger_cli::cli::{Cli, Command};
use ledger_cli::commands;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let result = match &cli.command {
        Command::Check { file, format } => commands::check::run(file, *format),
        Command::Report { file, account, format } => commands::report::run(file, account, *format),
    };

    match result {
        Ok(output) => {
            if !cli.quiet && !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
