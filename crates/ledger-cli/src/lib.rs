//! Command-line interface for the ledger engine.
//!
//! Thin wrapper over [`ledger_loader`] and [`ledger_booking`]: the library
//! surface here does the actual work and returns typed results, so it's
//! testable without spawning the compiled binary; [`main`](../bin) just
//! wires argument parsing, logging, and exit codes around it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod pipeline;
