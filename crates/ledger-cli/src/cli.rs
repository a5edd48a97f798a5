//! Argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Load and book plain-text double-entry ledgers.
#[derive(Parser, Debug)]
#[command(name = "ledger", author, version, about, long_about = None)]
pub struct Cli {
    /// The command to run.
    #[command(subcommand)]
    pub command: Command,

    /// Raise the log level to `debug`.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output but errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// A `ledger` subcommand.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse, load, and book a ledger file, reporting the first error if any.
    Check {
        /// The root ledger file.
        file: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the final inventory for every account matching a prefix.
    Report {
        /// The root ledger file.
        file: PathBuf,
        /// Only accounts starting with this prefix are printed.
        #[arg(long)]
        account: String,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// How a subcommand renders its result.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line of human-readable text per result, the default.
    Text,
    /// A single JSON document on stdout, suitable for piping to `jq` or
    /// another tool.
    Json,
}
