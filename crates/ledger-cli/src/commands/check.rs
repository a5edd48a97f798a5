//! `ledger check <FILE>`

use std::path::Path;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::pipeline;

/// A `check` result, serialized as-is in `--format json`.
#[derive(Serialize)]
struct CheckReport {
    transactions_booked: usize,
}

/// Run the full pipeline and return the summary line, or the first error.
pub fn run(file: &Path, format: OutputFormat) -> anyhow::Result<String> {
    let booked = pipeline::run(file)?;
    match format {
        OutputFormat::Text => Ok(format!("{} transactions booked, no errors", booked.transactions.len())),
        OutputFormat::Json => {
            let report = CheckReport { transactions_booked: booked.transactions.len() };
            Ok(serde_json::to_string_pretty(&report).expect("CheckReport always serializes"))
        }
    }
}
