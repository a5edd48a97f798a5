//! The booking engine's error taxonomy.
//!
//! [`BookingError`] covers failures raised while booking a single
//! transaction or applying a single directive. The ledger driver ([`crate::driver`])
//! enriches one of these into a [`DirectiveError`] that carries the offending
//! directive's source location, which is what callers should actually match on
//! and display.

use chrono::{DateTime, Utc};
use ledger_core::{AmountError, InternedStr, Inventory, SourceContext};
use rust_decimal::Decimal;
use thiserror::Error;

/// An error raised while booking one transaction or applying one directive.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BookingError {
    /// A reference to an `account-reference-checks` or `booking-method` name
    /// that isn't recognized.
    #[error("invalid option value for {option}: {value:?}")]
    InvalidOption {
        /// The option key (e.g. `"booking-method"`).
        option: &'static str,
        /// The offending value, if any was supplied.
        value: Option<String>,
    },

    /// A posting referenced an account with no open directive, under a strict
    /// reference-check mode.
    #[error("account {account} has not been opened")]
    AccountNotOpen {
        /// The referenced account.
        account: InternedStr,
    },

    /// A posting referenced a closed account, under `lenient` mode without
    /// `allow-closed-account`.
    #[error("account {account} is closed")]
    AccountClosed {
        /// The referenced account.
        account: InternedStr,
    },

    /// An `Open` directive named an account that is already open.
    #[error("account {account} is already open")]
    AlreadyOpen {
        /// The account named by the directive.
        account: InternedStr,
    },

    /// A `Close` directive named an account that is already closed.
    #[error("account {account} is already closed")]
    AlreadyClosed {
        /// The account named by the directive.
        account: InternedStr,
    },

    /// A `Currency` (or `commodity`) directive named a currency that already
    /// has one.
    #[error("currency {currency} already has a directive")]
    DuplicateCurrency {
        /// The currency named by the directive.
        currency: InternedStr,
    },

    /// A booked posting's currency is not in the account's `Open` currency
    /// restriction list.
    #[error("account {account} does not allow currency {currency}")]
    CurrencyNotAllowed {
        /// The account being posted to.
        account: InternedStr,
        /// The disallowed currency.
        currency: InternedStr,
    },

    /// A `Balance` assertion's expected amount did not match the account's
    /// actual holdings within tolerance.
    #[error(
        "balance assertion failed for {account}: expected {expected}, actual {actual} \
         (delta {delta}, max {max_delta})"
    )]
    BalanceMismatch {
        /// The asserted account.
        account: InternedStr,
        /// The amount the `Balance` directive asserted.
        expected: Decimal,
        /// The account's actual running total for that currency.
        actual: Decimal,
        /// `|expected - actual|`.
        delta: Decimal,
        /// The tolerance the delta was compared against.
        max_delta: Decimal,
    },

    /// A transaction's postings did not net to zero per currency.
    #[error("transaction does not balance, residual: {residual}")]
    TransactionUnbalanced {
        /// The non-zero leftover inventory.
        residual: Inventory,
    },

    /// A booking method ran out of matching lots before the requested amount
    /// was fully reduced.
    #[error("not enough held in {account} to reduce by {remainder}")]
    NotEnoughToReduce {
        /// The account being reduced.
        account: InternedStr,
        /// The unmet remainder.
        remainder: Decimal,
    },

    /// An augmentation cost-spec (Case A) declared a currency filter, which
    /// is only meaningful for reductions.
    #[error("augmentation cost spec for {account} may not filter by currency")]
    AugmentationHasCurrencyFilter {
        /// The account being augmented.
        account: InternedStr,
    },

    /// An augmentation cost-spec (Case A) named more than one date.
    #[error("augmentation cost spec for {account} names more than one date")]
    AugmentationMultipleDates {
        /// The account being augmented.
        account: InternedStr,
    },

    /// A posting had a cost spec with no amount and no matching lots to
    /// reduce against — the booker has nothing to infer from.
    #[error("cannot infer an amount for posting to {account}")]
    InferenceUnsupported {
        /// The account of the under-specified posting.
        account: InternedStr,
    },

    /// A transaction had more than one elastic (amount-less, cost-spec-less)
    /// posting; at most one is allowed since only one can be solved for.
    #[error("transaction has more than one elastic posting (second at {account})")]
    MultipleElasticPostings {
        /// The account of the second elastic posting encountered.
        account: InternedStr,
    },

    /// An `Amount` operation was attempted across mismatched currencies.
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// A [`BookingError`] enriched with the directive that triggered it, for
/// display as `file:row: message`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{source}: {kind}")]
pub struct DirectiveError {
    /// Where the offending directive came from.
    pub source: SourceContext,
    /// The date of the offending directive, for quick triage without
    /// re-parsing the source file.
    pub date: DateTime<Utc>,
    /// The underlying booking failure.
    #[source]
    pub kind: BookingError,
}

impl DirectiveError {
    /// Enrich a [`BookingError`] with the directive's location and date.
    #[must_use]
    pub fn new(source: SourceContext, date: DateTime<Utc>, kind: BookingError) -> Self {
        Self { source, date, kind }
    }
}
