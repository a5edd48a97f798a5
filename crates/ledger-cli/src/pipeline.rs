//! Runs the full parse → load → book pipeline for a single root file.

use std::path::Path;

use anyhow::Context;
use ledger_booking::{book_ledger, BookingState};
use ledger_core::BookedLedger;
use ledger_loader::Loader;

/// Load and book `file`, returning the first error encountered by either
/// stage as an [`anyhow::Error`] chain.
pub fn run(file: &Path) -> anyhow::Result<BookedLedger> {
    let ledger = Loader::new()
        .load(file)
        .with_context(|| format!("loading {}", file.display()))?;
    tracing::debug!(directives = ledger.directives.len(), "loaded ledger");

    let booked = book_ledger(&ledger.directives, BookingState::default())
        .with_context(|| format!("booking {}", file.display()))?;
    tracing::debug!(transactions = booked.transactions.len(), "booked ledger");

    Ok(booked)
}
