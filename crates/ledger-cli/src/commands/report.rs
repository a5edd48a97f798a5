//! `ledger report <FILE> --account <PREFIX>`

use std::path::Path;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::pipeline;

/// One matched account's held positions, serialized as-is in `--format json`.
#[derive(Serialize)]
struct AccountReport {
    account: String,
    positions: Vec<String>,
}

/// Run the full pipeline and format one line per position held in an
/// account matching `prefix`, ordered by account name.
pub fn run(file: &Path, prefix: &str, format: OutputFormat) -> anyhow::Result<String> {
    let booked = pipeline::run(file)?;

    let mut reports = Vec::new();
    for (account, inventory) in &booked.inventories {
        if !account.starts_with(prefix) {
            continue;
        }
        let positions: Vec<String> = inventory.positions().into_iter().map(|p| p.to_string()).collect();
        if !positions.is_empty() {
            reports.push(AccountReport { account: account.to_string(), positions });
        }
    }

    match format {
        OutputFormat::Text => {
            let lines: Vec<String> = reports
                .iter()
                .flat_map(|r| r.positions.iter().map(|p| format!("{}  {p}", r.account)))
                .collect();
            Ok(lines.join("\n"))
        }
        OutputFormat::Json => {
            Ok(serde_json::to_string_pretty(&reports).expect("AccountReport always serializes"))
        }
    }
}
