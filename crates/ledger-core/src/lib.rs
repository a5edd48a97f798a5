//! Shared domain vocabulary for the ledger engine.
//!
//! This crate has no I/O and no control flow of its own: it defines the
//! value types every other crate operates on.
//!
//! - [`Amount`] — an exact decimal quantity paired with a currency.
//! - [`Cost`] / [`CostSpec`] — a lot's acquisition basis, and how source
//!   syntax describes or filters one.
//! - [`Position`] — an amount optionally held at a cost-lot.
//! - [`Inventory`] — a per-account collection of positions.
//! - [`Directive`] and friends — the six directive variants a loaded ledger
//!   is built from.
//! - [`AccountMap`], [`CurrencyMap`], [`InventoryMap`], [`BookedLedger`] —
//!   the registries and final output of booking.
//!
//! # Example
//!
//! ```
//! use ledger_core::{Amount, Inventory};
//! use rust_decimal_macros::dec;
//!
//! let inv = Inventory::new().add_amount(&Amount::new(dec!(10), "AAPL"));
//! assert_eq!(inv.units("AAPL"), dec!(10));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod cost;
pub mod directive;
pub mod error;
pub mod format;
pub mod intern;
pub mod inventory;
pub mod position;
pub mod registry;

pub use amount::Amount;
pub use cost::{Cost, CostKind, CostSpec, DateSpec};
pub use directive::{
    BalanceDirective, CloseDirective, CurrencyDirective, Directive, Metadata, MetaValue,
    OpenDirective, OptionDirective, OptionMap, Posting, SourceContext, TransactionDirective,
};
pub use error::AmountError;
pub use format::format_transaction;
pub use intern::InternedStr;
pub use inventory::Inventory;
pub use position::Position;
pub use registry::{
    AccountMap, AccountState, BookedLedger, BookedPosting, CurrencyMap, InventoryMap, Transaction,
};

pub use chrono::{DateTime, NaiveDate, Utc};
pub use rust_decimal::Decimal;
